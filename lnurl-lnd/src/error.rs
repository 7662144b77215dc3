//! Error types for the LND backend.

use std::path::PathBuf;

use lnurl::backend::BackendError;

use crate::invoice::InvoiceError;

/// Errors raised while talking to LND.
#[derive(Debug, thiserror::Error)]
pub enum LndError {
    /// The HTTP client could not be built.
    #[error("Init failed: {0}")]
    Init(String),

    /// No macaroon was configured.
    #[error("no macaroon configured")]
    MissingMacaroon,

    /// A credential file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed hex macaroon.
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Network or HTTP error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// LND answered with an error status.
    #[error("API returned an error (Status: {status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to parse API response: {context}: {source}")]
    Parse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// LND attempted the payment and reported a failure.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The preimage returned is not 32 bytes.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A payment request failed to decode.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

impl From<LndError> for BackendError {
    fn from(err: LndError) -> Self {
        match err {
            LndError::ApiError { status, message } => Self::Rejected { status, message },
            LndError::PaymentFailed(reason) => Self::PaymentFailed(reason),
            LndError::Invoice(e) => Self::InvalidPaymentRequest(e.to_string()),
            e @ (LndError::Parse { .. } | LndError::InvalidData(_)) => {
                Self::UnexpectedResponse(e.to_string())
            }
            e => Self::Transport(Box::new(e)),
        }
    }
}
