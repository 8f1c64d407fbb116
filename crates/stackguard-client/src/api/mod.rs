//! API endpoint modules.

mod accounts;
mod assessment;
mod sync;

pub use accounts::AccountsApi;
pub use assessment::{AssessmentApi, BundleExecutionRequest};
pub use sync::SyncApi;
