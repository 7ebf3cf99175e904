//! Issue tracker client
//!
//! [`IssueTracker`] is the seam the reporting engine talks to. It has two
//! operations, creating an issue and commenting on one, plus a cheap
//! [`is_configured`](IssueTracker::is_configured) check used to turn
//! reporting into a no-op when credentials are missing.
//!
//! [`LinearClient`] implements it against the Linear GraphQL API.

pub mod client;
pub mod config;
pub mod error;
pub mod linear;

pub use client::{CreatedIssue, IssueTracker};
pub use config::{TrackerConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::TrackerError;
pub use linear::LinearClient;
