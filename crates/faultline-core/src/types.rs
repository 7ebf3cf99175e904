//! Engine input/output types

use faultline_tracker::CreatedIssue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier placed on results for folded repeats
pub const DUPLICATE_IDENTIFIER: &str = "duplicate";

/// Outcome of a successful report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultResult {
    /// Tracker handle of the issue
    pub issue_id: String,
    /// Human-readable tag, or `duplicate` for folded repeats
    pub identifier: String,
    /// Issue URL
    pub url: String,
    /// Whether this occurrence was folded into an existing issue
    pub is_duplicate: bool,
}

impl FaultResult {
    /// Result for a newly created issue
    #[must_use]
    pub fn created(issue: CreatedIssue) -> Self {
        Self {
            issue_id: issue.id,
            identifier: issue.identifier,
            url: issue.url,
            is_duplicate: false,
        }
    }

    /// Result for a repeat folded into `issue_id`
    #[must_use]
    pub fn duplicate(issue_id: String, url_base: &str) -> Self {
        let url = format!("{}/{issue_id}", url_base.trim_end_matches('/'));
        Self {
            issue_id,
            identifier: DUPLICATE_IDENTIFIER.to_string(),
            url,
            is_duplicate: true,
        }
    }
}

/// Extra detail attached by [`report_error`](crate::FaultReporter::report_error)
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Affected user
    pub user_id: Option<String>,
    /// Request URL
    pub url: Option<String>,
    /// What the application was doing; lands in the report context
    pub action: Option<String>,
    /// Free-form metadata
    pub metadata: Map<String, Value>,
}

impl ErrorContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With affected user
    #[inline]
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// With request URL
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// With action label
    #[inline]
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Add one metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
