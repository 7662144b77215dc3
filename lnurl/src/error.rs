//! Error types for the LNURL-pay protocol engine.
//!
//! Each role has its own error: [`IssueError`] for the first phase on the
//! service side, [`RedeemError`] for the second, and [`ResolveError`] for the
//! wallet side of the exchange.

use crate::backend::BackendError;
use crate::codec::CodecError;

/// Boxed error returned by pluggable collaborators such as transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error issuing a metadata commitment.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// The operating system's random source failed.
    #[error("secure random source failed: {0}")]
    Random(#[source] rand::Error),
    /// Another first-phase request for a username this service does not serve.
    #[error("unknown username '{0}'")]
    UnknownUser(String),
    /// The configured sendable bounds are not `0 < min <= max`.
    #[error("invalid sendable bounds {min}..={max}")]
    InvalidBounds {
        /// Configured minimum.
        min: u64,
        /// Configured maximum.
        max: u64,
    },
}

/// Error redeeming a commitment for a payment request.
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    /// The `id` parameter is missing or empty.
    #[error("missing commitment id")]
    MissingId,
    /// The `amount` parameter is missing.
    #[error("missing amount")]
    MissingAmount,
    /// The `amount` parameter is not a positive integer.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    /// The amount lies outside the sendable bounds.
    #[error("amount {amount} outside sendable range {min}..={max}")]
    AmountOutOfRange {
        /// Requested amount.
        amount: u64,
        /// Smallest accepted amount.
        min: u64,
        /// Largest accepted amount.
        max: u64,
    },
    /// The id is unknown, expired or already redeemed.
    #[error("unknown or already redeemed commitment")]
    UnknownCommitment,
    /// The Lightning backend failed to mint a payment request.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RedeemError {
    /// Whether the failure is attributable to the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

/// Error resolving a target and paying it.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The input is not one of the accepted target forms.
    #[error("unsupported target '{0}'")]
    UnsupportedTarget(String),
    /// The LNURL token does not decode.
    #[error("invalid LNURL token: {0}")]
    Codec(#[from] CodecError),
    /// The resolved URL does not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The resolved URL is not `https` and insecure transport was not allowed.
    #[error("refusing insecure URL '{0}'")]
    InsecureUrl(String),
    /// A request to the service failed.
    #[error("service request failed: {0}")]
    Transport(#[source] BoxError),
    /// The pay parameters carry invalid sendable bounds.
    #[error("service advertised invalid sendable bounds {min}..={max}")]
    InvalidBounds {
        /// Advertised minimum.
        min: u64,
        /// Advertised maximum.
        max: u64,
    },
    /// The metadata lacks a `text/plain` entry.
    #[error("metadata has no text/plain entry")]
    MissingTextPlain,
    /// The amount strategy gave up.
    #[error("payment cancelled while choosing an amount")]
    Cancelled,
    /// The payment request carries no description hash.
    #[error("payment request has no description hash")]
    MissingDescriptionHash,
    /// The payment request does not commit to the metadata shown.
    #[error("description hash mismatch: expected {expected}, got {found}")]
    HashMismatch {
        /// Hex SHA-256 of the metadata string.
        expected: String,
        /// Hex description hash found in the payment request.
        found: String,
    },
    /// The Lightning backend failed to decode or pay.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
