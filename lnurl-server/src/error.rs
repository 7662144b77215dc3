//! Error types for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lnurl::proto::LnurlErrorResponse;
use lnurl::{IssueError, RedeemError};

/// Errors returned by the route handlers.
///
/// Every variant is rendered as an LNURL error body,
/// `{"status":"ERROR","reason":"..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The first phase failed.
    #[error(transparent)]
    Issue(#[from] IssueError),

    /// The second phase failed.
    #[error(transparent)]
    Redeem(#[from] RedeemError),
}

impl ServerError {
    /// The HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Issue(IssueError::UnknownUser(_)) => StatusCode::NOT_FOUND,
            Self::Redeem(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Issue(_) | Self::Redeem(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(LnurlErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use lnurl::backend::BackendError;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::from(IssueError::UnknownUser("bob".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::from(RedeemError::UnknownCommitment).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(RedeemError::AmountOutOfRange {
                amount: 5001,
                min: 1000,
                max: 5000
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(RedeemError::Backend(BackendError::PaymentFailed("down".into())))
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = ServerError::from(RedeemError::MissingAmount).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
