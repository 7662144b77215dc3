#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core protocol engine for LNURL-pay.
//!
//! This crate implements both sides of the two-phase LNURL-pay handshake. A
//! payee publishes a static bech32 token; a payer's wallet resolves it, receives
//! a commitment to a piece of metadata, and later redeems that commitment for a
//! BOLT11 payment request whose description hash binds it to the exact
//! metadata string the wallet was shown.
//!
//! It is transport- and node-agnostic: HTTP plumbing lives in `lnurl-http` and
//! `lnurl-server`, and Lightning node access is abstracted behind
//! [`backend::LightningBackend`].
//!
//! # Modules
//!
//! - [`codec`] - Bech32 encoding of URLs into LNURL tokens
//! - [`metadata`] - Metadata entries and description hashing
//! - [`store`] - Single-use, in-memory commitment store
//! - [`issuer`] - Phase one: issuing metadata commitments
//! - [`redeemer`] - Phase two: redeeming commitments for payment requests
//! - [`service`] - Server-side façade combining issuer and redeemer
//! - [`resolver`] - Client-side resolution and payment flow
//! - [`backend`] - Lightning node abstraction
//! - [`proto`] - Wire format types
//! - [`config`] - Service configuration
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring
//! - `test-utils` - Exposes an in-memory mock Lightning backend

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod issuer;
pub mod metadata;
pub mod proto;
pub mod redeemer;
pub mod resolver;
pub mod service;
pub mod store;
pub mod timestamp;

pub use codec::{CodecError, decode_url, encode_url};
pub use config::{SendableRange, ServiceConfig};
pub use error::{IssueError, RedeemError, ResolveError};
pub use service::PayService;
