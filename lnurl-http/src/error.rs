//! Error types for the HTTP transport layer.

use http::StatusCode;

/// Errors that can occur while talking to an LNURL-pay service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Failed to read the response body.
    #[error("Failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body exceeds the size limit.
    #[error("Response body too large: {context}: {length} bytes")]
    ResponseTooLarge {
        /// Human-readable context.
        context: &'static str,
        /// Announced length, or bytes received when the limit was crossed.
        length: usize,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// The service answered with an LNURL error body.
    #[error("Service error: {context}: {reason}")]
    Service {
        /// Human-readable context.
        context: &'static str,
        /// Reason supplied by the service.
        reason: String,
    },
}
