//! HTTP transport for the LNURL-pay resolver.
//!
//! Implements [`lnurl::resolver::Transport`] on top of `reqwest`, recognising
//! LNURL error bodies (`{"status":"ERROR","reason":...}`) on both legs of the
//! exchange.
//!
//! # Modules
//!
//! - [`constants`] - Default timeout and user agent
//! - [`error`] - HTTP transport error types
//! - [`client`] - The `reqwest`-backed transport

pub mod client;
pub mod constants;
pub mod error;

pub use client::HttpTransport;
pub use error::TransportError;
