//! LND REST backend for the LNURL-pay protocol engine.
//!
//! [`LndRestClient`] implements [`lnurl::backend::LightningBackend`] against
//! LND's REST gateway, authenticating every request with a hex-encoded
//! macaroon and optionally pinning the node's self-signed TLS certificate.
//!
//! # Modules
//!
//! - [`config`] - Connection settings and credential loading
//! - [`client`] - The REST client
//! - [`types`] - Request and response bodies of the endpoints used
//! - [`invoice`] - BOLT11 description-hash extraction
//! - [`error`] - Error types

pub mod client;
pub mod config;
pub mod error;
pub mod invoice;
pub mod types;

pub use client::LndRestClient;
pub use config::{LndConfig, Macaroon};
pub use error::LndError;
