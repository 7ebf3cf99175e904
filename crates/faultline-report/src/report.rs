//! Fault report data model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Severity of a reported fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Service-impacting failure
    Critical,
    /// Ordinary runtime error
    #[default]
    Error,
    /// Degraded but recoverable
    Warning,
}

impl Severity {
    /// Lowercase label (`critical`, `error`, `warning`)
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Lenient parse: unknown labels fall back to [`Severity::Error`]
    ///
    /// Use this for labels coming from outside the process, where an
    /// unexpected value must not stop the fault from being reported.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            other => Err(ReportError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A fault handed in by the application
///
/// Immutable once built. The only required field is a non-blank message;
/// everything else is optional detail rendered into the issue body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFaultReport")]
pub struct FaultReport {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    context: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl FaultReport {
    /// Create a report with the given message and default severity
    ///
    /// # Errors
    /// Returns [`ReportError::EmptyMessage`] if the message is blank
    pub fn new(message: impl Into<String>) -> Result<Self, ReportError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ReportError::EmptyMessage);
        }
        Ok(Self {
            message,
            stack: None,
            severity: Severity::default(),
            user_id: None,
            url: None,
            context: Map::new(),
            metadata: Map::new(),
        })
    }

    /// With stack trace
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// With severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
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

    /// Add one context entry
    #[inline]
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Add one metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the whole metadata map
    #[inline]
    #[must_use]
    pub fn with_metadata_map(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// First line of the stack trace, empty when there is none
    #[must_use]
    pub fn stack_head(&self) -> &str {
        self.stack
            .as_deref()
            .and_then(|s| s.split('\n').next())
            .unwrap_or("")
    }

    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

/// Wire shape accepted before validation
#[derive(Deserialize)]
struct RawFaultReport {
    message: String,
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    context: Map<String, Value>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<RawFaultReport> for FaultReport {
    type Error = ReportError;

    fn try_from(raw: RawFaultReport) -> Result<Self, Self::Error> {
        let mut report = FaultReport::new(raw.message)?;
        report.stack = raw.stack;
        report.severity = raw
            .severity
            .as_deref()
            .map(Severity::from_label)
            .unwrap_or_default();
        report.user_id = raw.user_id;
        report.url = raw.url;
        report.context = raw.context;
        report.metadata = raw.metadata;
        Ok(report)
    }
}

/// Errors raised while building a report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Message missing or blank
    #[error("fault message must not be empty")]
    EmptyMessage,

    /// Severity label not recognised by the strict parser
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_blank_message() {
        assert_eq!(FaultReport::new(""), Err(ReportError::EmptyMessage));
        assert_eq!(FaultReport::new("   \n"), Err(ReportError::EmptyMessage));
    }

    #[test]
    fn defaults_to_error_severity() {
        let report = FaultReport::new("boom").unwrap();
        assert_eq!(report.severity(), Severity::Error);
        assert!(report.stack().is_none());
        assert!(report.context().is_empty());
    }

    #[test]
    fn stack_head_takes_first_line() {
        let report = FaultReport::new("boom")
            .unwrap()
            .with_stack("Error: timeout\nat foo()\nat bar()");
        assert_eq!(report.stack_head(), "Error: timeout");

        let bare = FaultReport::new("boom").unwrap();
        assert_eq!(bare.stack_head(), "");
    }

    #[test]
    fn severity_strict_and_lenient_parse() {
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!(matches!(
            "fatal".parse::<Severity>(),
            Err(ReportError::UnknownSeverity(_))
        ));
        assert_eq!(Severity::from_label("fatal"), Severity::Error);
        assert_eq!(Severity::from_label("warning"), Severity::Warning);
    }

    #[test]
    fn deserializes_and_validates() {
        let report: FaultReport = serde_json::from_value(json!({
            "message": "disk full",
            "severity": "warning",
            "userId": "u-1",
            "context": {"action": "upload"}
        }))
        .unwrap();
        assert_eq!(report.severity(), Severity::Warning);
        assert_eq!(report.user_id(), Some("u-1"));
        assert_eq!(report.context()["action"], json!("upload"));

        let bad = serde_json::from_value::<FaultReport>(json!({"message": ""}));
        assert!(bad.is_err());
    }

    #[test]
    fn unknown_wire_severity_falls_back() {
        let report: FaultReport =
            serde_json::from_value(json!({"message": "x", "severity": "panic"})).unwrap();
        assert_eq!(report.severity(), Severity::Error);
    }
}
