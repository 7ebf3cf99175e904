//! Faultline Core - fault reporting engine
//!
//! Turns application faults into tracked issues:
//! - Fingerprints each fault
//! - Folds repeats inside the dedup window into one issue (escalation comment)
//! - Creates a new issue for a first occurrence
//! - Becomes a no-op when the tracker is unconfigured
//! - Never surfaces tracker failures to the caller
//!
//! # Example
//!
//! ```rust,ignore
//! use faultline_core::{FaultReporter, FaultlineConfig};
//! use faultline_report::FaultReport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FaultlineConfig::load()?;
//! let reporter = FaultReporter::from_config(&config)?;
//!
//! let fault = FaultReport::new("DB timeout")?.with_stack("Error: timeout\nat foo()");
//! if let Some(result) = reporter.report(fault).await {
//!     println!("tracked as {} (duplicate: {})", result.identifier, result.is_duplicate);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod capture;
pub mod config;
pub mod error;
pub mod reporter;
pub mod types;

pub use config::{DedupSettings, FaultlineConfig, ReporterSettings};
pub use error::CoreError;
pub use reporter::FaultReporter;
pub use types::{ErrorContext, FaultResult, DUPLICATE_IDENTIFIER};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reporting faults
    pub use crate::{ErrorContext, FaultReporter, FaultResult, FaultlineConfig};
    pub use faultline_report::{FaultReport, Severity};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
