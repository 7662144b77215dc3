//! A [`lnurl::resolver::Transport`] implementation that talks to a remote
//! LNURL-pay service over HTTP.
//!
//! Both legs of the exchange are plain `GET` requests returning JSON. A
//! service may answer either leg with an LNURL error body instead of the
//! expected document, with or without an error status; such bodies surface
//! as [`TransportError::Service`] carrying the service's reason.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use lnurl::backend::BoxFuture;
use lnurl::error::BoxError;
use lnurl::proto::{InvoiceResponse, LnurlErrorResponse, PayParams};
use lnurl::resolver::Transport;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::constants::{DEFAULT_TIMEOUT, MAX_BODY_BYTES, USER_AGENT};
use crate::error::TransportError;

/// Either an LNURL error body or the expected document.
#[derive(Deserialize)]
#[serde(untagged)]
enum LnurlReply<R> {
    Error(LnurlErrorResponse),
    Ok(R),
}

/// `reqwest`-backed transport for [`lnurl::resolver::Resolver`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Shared Reqwest HTTP client
    client: Client,
    /// Custom headers sent with each request
    headers: HeaderMap,
    /// Per-request timeout
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(TransportError::Setup)?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the pay parameters at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails, the service answers
    /// with an error, or the body is not a pay request.
    pub async fn pay_params(&self, url: &Url) -> Result<PayParams, TransportError> {
        self.get_json(url, "GET pay parameters").await
    }

    /// Calls the callback at `url`, which must already carry the amount.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails, the service answers
    /// with an error, or the body holds no payment request.
    pub async fn invoice(&self, url: &Url) -> Result<InvoiceResponse, TransportError> {
        self.get_json(url, "GET callback").await
    }

    /// Generic GET helper that applies headers and timeout, and maps LNURL
    /// error bodies and unexpected statuses to [`TransportError`].
    ///
    /// `context` is a human-readable identifier used in tracing and error
    /// messages (e.g. `"GET callback"`).
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "lnurl.http.get", skip(self), fields(url = %url), err)
    )]
    async fn get_json<R>(&self, url: &Url, context: &'static str) -> Result<R, TransportError>
    where
        R: DeserializeOwned,
    {
        let mut req = self.client.get(url.clone()).timeout(self.timeout);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| TransportError::Http { context, source: e })?;

        let status = http_response.status();
        let body = read_body(http_response, context).await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(%status, length = body.len(), "LNURL response received");

        match serde_json::from_slice::<LnurlReply<R>>(&body) {
            Ok(LnurlReply::Error(error)) => Err(TransportError::Service {
                context,
                reason: error.reason,
            }),
            Ok(LnurlReply::Ok(value)) if status == StatusCode::OK => Ok(value),
            _ if status != StatusCode::OK => Err(TransportError::HttpStatus {
                context,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
            // Re-parse for a precise error; the untagged one names no field.
            _ => serde_json::from_slice::<R>(&body)
                .map_err(|e| TransportError::JsonDeserialization { context, source: e }),
        }
    }
}

/// Reads the response body, giving up as soon as it exceeds [`MAX_BODY_BYTES`].
async fn read_body(
    mut response: reqwest::Response,
    context: &'static str,
) -> Result<Vec<u8>, TransportError> {
    let too_large = |length| TransportError::ResponseTooLarge { context, length };

    let announced = response
        .content_length()
        .map(|len| usize::try_from(len).unwrap_or(usize::MAX));
    if let Some(length) = announced.filter(|&len| len > MAX_BODY_BYTES) {
        return Err(too_large(length));
    }

    let mut body = Vec::with_capacity(announced.unwrap_or(0));
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportError::ResponseBodyRead { context, source: e })?
    {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(too_large(body.len() + chunk.len()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

impl Transport for HttpTransport {
    fn fetch_pay_params<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PayParams, BoxError>> {
        Box::pin(async move { self.pay_params(url).await.map_err(Into::into) })
    }

    fn fetch_invoice<'a>(
        &'a self,
        url: &'a Url,
    ) -> BoxFuture<'a, Result<InvoiceResponse, BoxError>> {
        Box::pin(async move { self.invoice(url).await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lnurl::backend::MockBackend;
    use lnurl::codec::encode_url;
    use lnurl::metadata::description_hash;
    use lnurl::proto::PayRequestTag;
    use lnurl::resolver::{NoRetry, Resolver};
    use lnurl::ResolveError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const METADATA: &str = r#"[["text/plain","abc123"]]"#;

    fn pay_params(server: &MockServer) -> PayParams {
        PayParams {
            callback: format!("{}/invoice?id=c1", server.uri()),
            max_sendable: 5000,
            min_sendable: 1000,
            metadata: METADATA.to_owned(),
            tag: PayRequestTag,
        }
    }

    fn url(server: &MockServer, p: &str) -> Url {
        format!("{}{p}", server.uri()).parse().unwrap()
    }

    #[tokio::test]
    async fn test_fetches_pay_params() {
        let server = MockServer::start().await;
        let expected = pay_params(&server);
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&expected))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let params = transport.pay_params(&url(&server, "/pay")).await.unwrap();
        assert_eq!(params, expected);
    }

    #[tokio::test]
    async fn test_error_body_with_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(LnurlErrorResponse::new("unknown or already redeemed commitment")),
            )
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .unwrap()
            .invoice(&url(&server, "/invoice?id=c1&amount=1000"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Service { reason, .. } if reason == "unknown or already redeemed commitment"
        ));
    }

    #[tokio::test]
    async fn test_error_body_with_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invoice"))
            .respond_with(ResponseTemplate::new(400).set_body_json(LnurlErrorResponse::new("missing amount")))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .unwrap()
            .invoice(&url(&server, "/invoice?id=c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Service { reason, .. } if reason == "missing amount"));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .unwrap()
            .pay_params(&url(&server, "/pay"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::HttpStatus { status: StatusCode::BAD_GATEWAY, ref body, .. } if body == "bad gateway"
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_BODY_BYTES + 1)))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .unwrap()
            .pay_params(&url(&server, "/pay"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ResponseTooLarge { length, .. } if length > MAX_BODY_BYTES
        ));
    }

    #[tokio::test]
    async fn test_body_at_limit_is_read() {
        let server = MockServer::start().await;
        let mut body = serde_json::to_vec(&pay_params(&server)).unwrap();
        body.resize(MAX_BODY_BYTES, b' ');
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let params = HttpTransport::new()
            .unwrap()
            .pay_params(&url(&server, "/pay"))
            .await
            .unwrap();
        assert_eq!(params, pay_params(&server));
    }

    #[tokio::test]
    async fn test_foreign_document_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "callback": "https://x.io/withdraw",
                "k1": "00",
                "tag": "withdrawRequest"
            })))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .unwrap()
            .pay_params(&url(&server, "/pay"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::JsonDeserialization { .. }));
    }

    #[tokio::test]
    async fn test_resolver_pays_over_http() {
        let server = MockServer::start().await;
        let pr = MockBackend::mint(2500, description_hash(METADATA)).unwrap();
        Mock::given(method("GET"))
            .and(path("/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pay_params(&server)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/invoice"))
            .and(query_param("id", "c1"))
            .and(query_param("amount", "2500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(InvoiceResponse::new(pr.clone())))
            .expect(1)
            .mount(&server)
            .await;

        let backend = Arc::new(MockBackend::new());
        let resolver =
            Resolver::new(HttpTransport::new().unwrap(), Arc::clone(&backend)).allow_insecure(true);
        let token = encode_url(&format!("{}/pay", server.uri())).unwrap();

        let payment = resolver
            .pay(&format!("lightning:{token}"), 2500, 1000, &mut NoRetry)
            .await
            .unwrap();

        assert_eq!(payment.payment_request, pr);
        assert_eq!(backend.payments().await, vec![(pr, 1000)]);
    }

    #[tokio::test]
    async fn test_resolver_surfaces_service_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/lnurlp/alice"))
            .respond_with(ResponseTemplate::new(404).set_body_json(LnurlErrorResponse::new("unknown username 'alice'")))
            .mount(&server)
            .await;

        let backend = MockBackend::new();
        let resolver = Resolver::new(HttpTransport::new().unwrap(), backend).allow_insecure(true);
        let address = format!("alice@{}", server.address());

        let err = resolver
            .pay(&address, 2500, 1000, &mut NoRetry)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Transport(_)));
        assert!(err.to_string().contains("unknown username 'alice'"));
    }
}
