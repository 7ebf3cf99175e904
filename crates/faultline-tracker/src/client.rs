//! Tracker trait

use crate::error::TrackerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Issue returned by the tracker on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Opaque tracker handle
    pub id: String,
    /// Human-readable tag such as `ENG-123`
    pub identifier: String,
    /// Canonical issue URL
    pub url: String,
}

/// External issue tracker
#[async_trait]
pub trait IssueTracker: Send + Sync + Debug {
    /// Whether credentials and a target project are present
    fn is_configured(&self) -> bool;

    /// Open a new issue
    ///
    /// # Errors
    /// Any transport, authentication, validation or configuration failure
    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        priority: u8,
    ) -> Result<CreatedIssue, TrackerError>;

    /// Comment on an existing issue
    ///
    /// # Errors
    /// Same conditions as [`create_issue`](Self::create_issue)
    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), TrackerError>;
}
