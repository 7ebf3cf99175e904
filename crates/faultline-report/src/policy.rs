//! Severity policy: priorities, titles and issue bodies

use crate::report::{FaultReport, Severity};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Priority used for unrecognised severities
pub const DEFAULT_PRIORITY: u8 = 2;

/// Longest message prefix placed in an issue title
pub const MAX_TITLE_MESSAGE_CHARS: usize = 100;

/// Tracker priority for a severity (1 = most urgent)
#[inline]
#[must_use]
pub const fn priority_for(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 1,
        Severity::Error => 2,
        Severity::Warning => 3,
    }
}

/// Tracker priority for a free-form severity label
///
/// Unknown labels map to [`DEFAULT_PRIORITY`] so they never block reporting.
#[must_use]
pub fn priority_for_label(label: &str) -> u8 {
    label
        .parse::<Severity>()
        .map_or(DEFAULT_PRIORITY, priority_for)
}

/// Issue title: `[app] SEVERITY: message`, message cut to 100 chars
#[must_use]
pub fn title_for(app_name: &str, severity: Severity, message: &str) -> String {
    let truncated: String = message.chars().take(MAX_TITLE_MESSAGE_CHARS).collect();
    format!(
        "[{app_name}] {}: {truncated}",
        severity.as_str().to_ascii_uppercase()
    )
}

/// Markdown issue body
///
/// Optional sections are left out entirely when their field is absent.
#[must_use]
pub fn format_body(report: &FaultReport, environment: &str, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "## Error Details".to_string(),
        format!("**Message:** {}", report.message()),
        format!("**Severity:** {}", report.severity()),
        format!("**Environment:** {environment}"),
        format!("**Timestamp:** {}", timestamp(now)),
    ];

    if let Some(url) = report.url() {
        lines.push(format!("**URL:** {url}"));
    }
    if let Some(user_id) = report.user_id() {
        lines.push(format!("**User ID:** {user_id}"));
    }
    if let Some(stack) = report.stack() {
        lines.push("\n## Stack Trace".to_string());
        lines.push("```".to_string());
        lines.push(stack.to_string());
        lines.push("```".to_string());
    }
    push_json_section(&mut lines, "Context", report.context());
    push_json_section(&mut lines, "Metadata", report.metadata());

    lines.join("\n")
}

/// Comment posted when a tracked fault recurs
#[must_use]
pub fn escalation_comment(count: u32, now: DateTime<Utc>) -> String {
    format!("Error occurred again at {}. Count: {count}", timestamp(now))
}

fn push_json_section(lines: &mut Vec<String>, heading: &str, map: &Map<String, Value>) {
    if map.is_empty() {
        return;
    }
    // Map of JSON values always serializes
    let rendered = serde_json::to_string_pretty(map).unwrap_or_default();
    lines.push(format!("\n## {heading}"));
    lines.push("```json".to_string());
    lines.push(rendered);
    lines.push("```".to_string());
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
