//! Linear GraphQL client

use crate::client::{CreatedIssue, IssueTracker};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const CREATE_ISSUE: &str = r"
mutation CreateIssue($input: IssueCreateInput!) {
    issueCreate(input: $input) {
        success
        issue { id identifier url }
    }
}";

const CREATE_COMMENT: &str = r"
mutation CreateComment($input: CommentCreateInput!) {
    commentCreate(input: $input) { success }
}";

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: IssueCreatePayload,
}

#[derive(Deserialize)]
struct IssueCreatePayload {
    success: bool,
    issue: Option<CreatedIssue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentCreateData {
    comment_create: CommentCreatePayload,
}

#[derive(Deserialize)]
struct CommentCreatePayload {
    success: bool,
}

/// [`IssueTracker`] backed by the Linear GraphQL API
#[derive(Debug, Clone)]
pub struct LinearClient {
    client: Client,
    config: TrackerConfig,
}

impl LinearClient {
    /// Create a client from configuration
    ///
    /// An unconfigured client is valid; every call on it fails with
    /// [`TrackerError::NotConfigured`].
    ///
    /// # Errors
    /// Returns [`TrackerError::Http`] if the HTTP client cannot be built
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, TrackerError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(TrackerError::NotConfigured("api_key"))
    }

    fn team_id(&self) -> Result<&str, TrackerError> {
        self.config
            .team_id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TrackerError::NotConfigured("team_id"))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, TrackerError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(&self.config.api_url)
            .header(AUTHORIZATION, api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        if !envelope.errors.is_empty() {
            return Err(TrackerError::GraphQl(Value::Array(envelope.errors).to_string()));
        }
        envelope
            .data
            .ok_or_else(|| TrackerError::GraphQl("response carried no data".to_string()))
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        priority: u8,
    ) -> Result<CreatedIssue, TrackerError> {
        let team_id = self.team_id()?;
        let variables = json!({
            "input": {
                "teamId": team_id,
                "title": title,
                "description": body,
                "priority": priority,
            }
        });

        let data: IssueCreateData = self.execute(CREATE_ISSUE, variables).await?;
        let payload = data.issue_create;
        match payload.issue {
            Some(issue) if payload.success => {
                tracing::debug!(issue = %issue.identifier, "linear issue created");
                Ok(issue)
            }
            _ => Err(TrackerError::Rejected("issueCreate")),
        }
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), TrackerError> {
        let variables = json!({ "input": { "issueId": issue_id, "body": body } });
        let data: CommentCreateData = self.execute(CREATE_COMMENT, variables).await?;
        if data.comment_create.success {
            Ok(())
        } else {
            Err(TrackerError::Rejected("commentCreate"))
        }
    }
}
