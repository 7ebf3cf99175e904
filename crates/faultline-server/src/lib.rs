//! Faultline service assembly
//!
//! Loads [`ServiceConfig`] alongside the engine's
//! [`FaultlineConfig`](faultline_core::FaultlineConfig) and mounts the
//! webhook receiver and OAuth routes on one warp server.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod app;
pub mod config;

pub use app::{oauth_flow, routes, webhook_state};
pub use config::{AppConfig, ServerSettings, ServiceConfig, DEFAULT_LISTEN_ADDR};
