//! Faultline report model
//!
//! The leaf layer of the fault pipeline:
//! - [`FaultReport`]: what the application hands in
//! - [`Fingerprint`]: the dedup key derived from a report
//! - [`policy`]: severity to priority mapping, issue titles and bodies
//!
//! # Example
//!
//! ```rust
//! use faultline_report::{FaultReport, Fingerprint, Severity};
//!
//! let report = FaultReport::new("DB timeout")
//!     .unwrap()
//!     .with_stack("Error: timeout\nat foo()")
//!     .with_severity(Severity::Critical);
//!
//! let fp = Fingerprint::of(&report);
//! assert_eq!(fp, Fingerprint::compute("DB timeout", Some("Error: timeout")));
//! ```

#![allow(missing_docs)]

pub mod fingerprint;
pub mod policy;
pub mod report;

pub use fingerprint::Fingerprint;
pub use policy::{
    escalation_comment, format_body, priority_for, priority_for_label, title_for,
    DEFAULT_PRIORITY, MAX_TITLE_MESSAGE_CHARS,
};
pub use report::{FaultReport, ReportError, Severity};
