mod account;
mod assessment;
mod common;
mod report;
mod sync;

pub use account::*;
pub use assessment::*;
pub use common::*;
pub use report::*;
pub use sync::*;
