//! LNURL-pay service.
//!
//! Serves both phases of LNURL-pay over HTTP on top of [`lnurl::PayService`],
//! evicts stale commitments in the background and shuts down gracefully on
//! SIGINT / SIGTERM.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builders
//! - [`error`] - Mapping of protocol errors onto HTTP responses
//! - [`config`] - Server configuration with environment variable expansion
//! - [`sweeper`] - Background commitment expiry
//! - [`util`] - Shutdown signal handling

pub mod config;
pub mod error;
pub mod handlers;
pub mod sweeper;
pub mod util;

pub use handlers::{ServiceState, app, pay_router};
