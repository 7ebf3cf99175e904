//! Turning a caught error into a fault report

use crate::types::ErrorContext;
use faultline_report::{FaultReport, ReportError, Severity};
use serde_json::Value;
use std::any::type_name;
use std::backtrace::Backtrace;
use std::error::Error;

/// Build a report from an error value
///
/// The stack starts with `"{type}: {message}"` so the fingerprint stays
/// stable across call sites, followed by the `source()` chain and a
/// backtrace of the reporting call. For trait objects the type is taken
/// from the leading name of the `Debug` output.
///
/// # Errors
/// Returns [`ReportError::EmptyMessage`] if the error renders as blank
pub fn report_from_error<E>(error: &E, context: ErrorContext) -> Result<FaultReport, ReportError>
where
    E: Error + ?Sized,
{
    let mut report = FaultReport::new(error.to_string())?
        .with_stack(render_stack(error))
        .with_severity(Severity::Error)
        .with_metadata_map(context.metadata);

    if let Some(user_id) = context.user_id {
        report = report.with_user_id(user_id);
    }
    if let Some(url) = context.url {
        report = report.with_url(url);
    }
    if let Some(action) = context.action {
        report = report.with_context("action", Value::String(action));
    }
    Ok(report)
}

fn render_stack<E: Error + ?Sized>(error: &E) -> String {
    let mut lines = vec![format!("{}: {error}", error_kind(error))];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {cause}"));
        source = cause.source();
    }
    lines.push(Backtrace::force_capture().to_string());
    lines.join("\n")
}

fn error_kind<E: Error + ?Sized>(error: &E) -> String {
    let name = type_name::<E>();
    if !name.starts_with("dyn ") {
        return name.to_string();
    }
    let debug = format!("{error:?}");
    let head = debug
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .next()
        .unwrap_or_default();
    if head.is_empty() {
        name.to_string()
    } else {
        head.to_string()
    }
}
