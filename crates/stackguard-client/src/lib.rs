//! Async HTTP client for the compliance backend API.
//!
//! The client covers exactly the surface the gate consumes: cloud-account
//! resolution, inventory refresh (`SyncNow` + fetch status), and rule-bundle
//! execution. Authentication is an opaque key-id/secret pair sent as HTTP
//! basic auth; the client never logs or persists it.
//!
//! # Example
//!
//! ```rust,ignore
//! use stackguard_client::{ComplianceClient, Credentials};
//!
//! let client = ComplianceClient::new(Credentials::new("key-id", "secret"));
//! let account = client.accounts().get("123456789012").await?;
//! let ack = client.sync().trigger(&account.id).await?;
//! ```

#![doc(html_root_url = "https://docs.rs/stackguard-client/2.0.0")]

pub mod api;
mod client;
mod config;

pub use client::{ComplianceClient, ComplianceClientBuilder};
pub use config::Credentials;
