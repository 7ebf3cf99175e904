//! Tracker webhook receiver
//!
//! Verifies the `linear-signature` HMAC on incoming requests, parses the
//! payload and fans it out to handlers registered at startup under
//! `"<Type>.<action>"`, `"<Type>.*"` or `"*"`.
//!
//! # Example
//!
//! ```rust,ignore
//! use faultline_webhooks::{handler_fn, HandlerRegistry, SignatureVerifier, WebhookState};
//!
//! let registry = HandlerRegistry::builder()
//!     .with_default_handlers()
//!     .on("Comment.create", handler_fn(|payload| async move {
//!         tracing::info!(id = %payload.webhook_id, "comment added");
//!         Ok(())
//!     }))
//!     .build();
//!
//! let state = WebhookState::new(SignatureVerifier::new(secret), registry);
//! warp::serve(faultline_webhooks::routes(state)).run(addr).await;
//! ```

#![allow(missing_docs)]

pub mod config;
pub mod handlers;
pub mod payload;
pub mod registry;
pub mod routes;
pub mod signature;

pub use config::WebhookConfig;
pub use payload::{EventKey, WebhookPayload};
pub use registry::{
    handler_fn, DispatchError, FnHandler, HandlerRegistry, HandlerRegistryBuilder, WebhookHandler,
};
pub use routes::{routes, WebhookState, SIGNATURE_HEADER};
pub use signature::SignatureVerifier;
