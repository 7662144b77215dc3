//! Axum route handlers for the LNURL-pay service.
//!
//! Endpoints:
//! - `GET /pay`: first phase, static path
//! - `GET /.well-known/lnurlp/{username}`: first phase, identifier path
//! - `GET /invoice?id=&amount=`: second phase
//! - `GET /health`: liveness probe

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use lnurl::PayService;
use lnurl::proto::{INVOICE_PATH, InvoiceResponse, PAY_PATH, PayParams, WELL_KNOWN_PREFIX};
use lnurl::redeemer::parse_request;
use serde::Deserialize;
use tower_http::cors;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;

/// Shared application state.
pub type ServiceState = Arc<PayService>;

/// Query of the second-phase request.
///
/// Both fields are optional here so that their absence is reported as an
/// LNURL error body rather than a plain-text extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    /// Commitment id.
    pub id: Option<String>,
    /// Amount in millisatoshi.
    pub amount: Option<String>,
}

/// `GET /pay` issues a commitment on the static path.
///
/// # Errors
///
/// Returns 500 if no commitment can be issued.
pub async fn get_pay(State(service): State<ServiceState>) -> Result<Json<PayParams>, ServerError> {
    Ok(Json(service.pay_params().await?))
}

/// `GET /.well-known/lnurlp/{username}` issues a commitment that also names
/// the internet identifier.
///
/// # Errors
///
/// Returns 404 for any username other than the configured one.
pub async fn get_identifier(
    State(service): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<PayParams>, ServerError> {
    Ok(Json(service.identifier_params(&username).await?))
}

/// `GET /invoice` redeems a commitment for a payment request.
///
/// # Errors
///
/// Returns 400 for missing or invalid parameters, out-of-range amounts and
/// unknown or consumed ids, and 500 if the node fails to mint the invoice.
pub async fn get_invoice(
    State(service): State<ServiceState>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Json<InvoiceResponse>, ServerError> {
    let (id, amount) = parse_request(query.id.as_deref(), query.amount.as_deref())?;
    Ok(Json(service.redeem(&id, amount).await?))
}

/// `GET /health`.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates a [`Router`] with the LNURL-pay endpoints.
pub fn pay_router(state: ServiceState) -> Router {
    Router::new()
        .route(PAY_PATH, get(get_pay))
        .route(&format!("{WELL_KNOWN_PREFIX}{{username}}"), get(get_identifier))
        .route(INVOICE_PATH, get(get_invoice))
        .with_state(state)
}

/// Creates the full application: LNURL-pay endpoints, `/health`, request
/// tracing and permissive CORS for browser wallets.
pub fn app(state: ServiceState) -> Router {
    Router::new()
        .merge(pay_router(state))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET])
                .allow_headers(cors::Any),
        )
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use lnurl::backend::{LightningBackend, MockBackend};
    use lnurl::config::ServiceConfig;
    use lnurl::metadata::description_hash;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig {
            protocol: "http".into(),
            host: "localhost".into(),
            port: 8080,
            username: "alice".into(),
            min_sendable: 1000,
            max_sendable: 5000,
        }
    }

    fn service(backend: MockBackend) -> (ServiceState, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let service = PayService::new(config(), backend.clone()).unwrap();
        (Arc::new(service), backend)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_pay_params() {
        let (state, _) = service(MockBackend::new());
        let (status, body) = get_json(app(Arc::clone(&state)), "/pay").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tag"], "payRequest");
        assert_eq!(body["minSendable"], 1000);
        assert_eq!(body["maxSendable"], 5000);
        assert!(
            body["callback"]
                .as_str()
                .unwrap()
                .starts_with("http://localhost:8080/invoice?id=")
        );
        assert!(body["metadata"].as_str().unwrap().starts_with(r#"[["text/plain",""#));
        assert_eq!(state.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_identifier_params() {
        let (state, _) = service(MockBackend::new());
        let (status, body) = get_json(app(state), "/.well-known/lnurlp/alice").await;

        assert_eq!(status, StatusCode::OK);
        assert!(
            body["metadata"]
                .as_str()
                .unwrap()
                .ends_with(r#"["text/identifier","alice@localhost:8080"]]"#)
        );
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let (state, _) = service(MockBackend::new());
        let (status, body) = get_json(app(Arc::clone(&state)), "/.well-known/lnurlp/bob").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "ERROR");
        assert!(state.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_invoice_binds_metadata() {
        let (state, backend) = service(MockBackend::new());
        let params = state
            .issuer()
            .issue_commitment("c1".into(), "abc123", false)
            .await;
        assert_eq!(params.metadata, r#"[["text/plain","abc123"]]"#);

        let (status, body) = get_json(app(Arc::clone(&state)), "/invoice?id=c1&amount=2500").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routes"], serde_json::json!([]));

        let pr = body["pr"].as_str().unwrap();
        assert_eq!(
            backend.description_hash(pr).unwrap(),
            Some(description_hash(&params.metadata))
        );
        assert_eq!(backend.invoices().await[0].value_msat, 2500);
    }

    #[tokio::test]
    async fn test_second_redemption_is_rejected() {
        let (state, _) = service(MockBackend::new());
        state.issuer().issue_commitment("c1".into(), "abc123", false).await;

        let (first, _) = get_json(app(Arc::clone(&state)), "/invoice?id=c1&amount=2500").await;
        let (second, body) = get_json(app(state), "/invoice?id=c1&amount=2500").await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_out_of_range_keeps_commitment() {
        let (state, _) = service(MockBackend::new());
        state.issuer().issue_commitment("c1".into(), "abc123", false).await;

        let (status, _) = get_json(app(Arc::clone(&state)), "/invoice?id=c1&amount=5001").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(app(state), "/invoice?id=c1&amount=5000").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_query_is_bad_request() {
        let (state, _) = service(MockBackend::new());
        for uri in [
            "/invoice",
            "/invoice?amount=2500",
            "/invoice?id=c1",
            "/invoice?id=c1&amount=abc",
            "/invoice?id=c1&amount=-5",
        ] {
            let (status, body) = get_json(app(Arc::clone(&state)), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], "ERROR", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_backend_failure_is_server_error() {
        let (state, _) = service(MockBackend::new().failing_invoices());
        state.issuer().issue_commitment("c1".into(), "abc123", false).await;

        let (status, body) = get_json(app(state), "/invoice?id=c1&amount=2500").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = service(MockBackend::new());
        let (status, body) = get_json(app(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
