//! REST client for LND.

use http::HeaderValue;
use lnurl::backend::{BackendError, BoxFuture, InvoiceRequest, LightningBackend, Preimage};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::{LndConfig, Macaroon};
use crate::error::LndError;
use crate::invoice;
use crate::types::{
    AddInvoiceRequest, AddInvoiceResponse, FeeLimit, GetInfo, SendPaymentRequest,
    SendPaymentResponse,
};

/// Header carrying the hex-encoded macaroon.
pub const MACAROON_HEADER: &str = "Grpc-Metadata-Macaroon";

/// A client for LND's REST gateway.
#[derive(Clone)]
pub struct LndRestClient {
    base_url: String,
    macaroon: HeaderValue,
    client: Client,
}

impl std::fmt::Debug for LndRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LndRestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TryFrom<&LndConfig> for LndRestClient {
    type Error = LndError;

    fn try_from(config: &LndConfig) -> Result<Self, Self::Error> {
        let mut builder = Client::builder().timeout(config.timeout());
        if let Some(pem) = config.load_tls_cert()? {
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| LndError::Init(format!("Failed to parse PEM: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| LndError::Init(format!("Failed to build client: {e}")))?;

        Self::with_client(&config.rest_url, &config.load_macaroon()?, client)
    }
}

impl LndRestClient {
    /// Creates a client from settings, loading credentials from disk as needed.
    ///
    /// # Errors
    ///
    /// Returns [`LndError`] if credentials cannot be loaded or the HTTP client
    /// cannot be built.
    pub fn try_new(config: &LndConfig) -> Result<Self, LndError> {
        Self::try_from(config)
    }

    /// Creates a client around an existing `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`LndError::Init`] if the macaroon cannot form a header value.
    pub fn with_client(base_url: &str, macaroon: &Macaroon, client: Client) -> Result<Self, LndError> {
        let macaroon = HeaderValue::from_str(&macaroon.to_hex())
            .map_err(|e| LndError::Init(format!("Invalid macaroon header: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            macaroon,
            client,
        })
    }

    /// The REST gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &'static str,
    ) -> Result<T, LndError> {
        let response = builder
            .header(MACAROON_HEADER, self.macaroon.clone())
            .send()
            .await
            .map_err(|source| LndError::Http { context, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LndError::Http { context, source })?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|source| LndError::Parse { context, source })
        } else {
            Err(LndError::ApiError {
                status: status.as_u16(),
                message: body,
            })
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, context: &'static str) -> Result<T, LndError> {
        let url = format!("{}/{path}", self.base_url);
        self.execute(self.client.get(url), context).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, context: &'static str) -> Result<T, LndError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        self.execute(self.client.post(url).json(body), context).await
    }

    /// `GET /v1/getinfo`.
    ///
    /// # Errors
    ///
    /// Returns [`LndError`] if the request fails.
    pub async fn v1_getinfo(&self) -> Result<GetInfo, LndError> {
        self.get("v1/getinfo", "GET /v1/getinfo").await
    }

    /// `POST /v1/invoices`.
    ///
    /// # Errors
    ///
    /// Returns [`LndError`] if the request fails.
    pub async fn v1_invoices(&self, body: &AddInvoiceRequest) -> Result<AddInvoiceResponse, LndError> {
        self.post("v1/invoices", body, "POST /v1/invoices").await
    }

    /// `POST /v1/channels/transactions`, LND's synchronous send.
    ///
    /// # Errors
    ///
    /// Returns [`LndError`] if the request fails.
    pub async fn v1_channels_transactions(
        &self,
        body: &SendPaymentRequest,
    ) -> Result<SendPaymentResponse, LndError> {
        self.post("v1/channels/transactions", body, "POST /v1/channels/transactions")
            .await
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn add_invoice(&self, request: InvoiceRequest) -> Result<String, LndError> {
        let response = self
            .v1_invoices(&AddInvoiceRequest {
                memo: request.memo,
                value_msat: request.value_msat,
                description_hash: request.description_hash,
            })
            .await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(add_index = response.add_index, "invoice added");

        Ok(response.payment_request)
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self, payment_request), err))]
    async fn send_payment(&self, payment_request: &str, max_fee_msat: u64) -> Result<Preimage, LndError> {
        let response = self
            .v1_channels_transactions(&SendPaymentRequest {
                payment_request: payment_request.to_owned(),
                fee_limit: FeeLimit {
                    fixed_msat: max_fee_msat,
                },
            })
            .await?;

        if !response.payment_error.is_empty() {
            return Err(LndError::PaymentFailed(response.payment_error));
        }
        let preimage: [u8; 32] = response.payment_preimage.as_slice().try_into().map_err(|_| {
            LndError::InvalidData(format!(
                "preimage of {} bytes",
                response.payment_preimage.len()
            ))
        })?;
        Ok(Preimage(preimage))
    }
}

impl LightningBackend for LndRestClient {
    fn node_alias(&self) -> BoxFuture<'_, Result<String, BackendError>> {
        Box::pin(async move { Ok(self.v1_getinfo().await?.alias) })
    }

    fn create_invoice(&self, request: InvoiceRequest) -> BoxFuture<'_, Result<String, BackendError>> {
        Box::pin(async move { Ok(self.add_invoice(request).await?) })
    }

    fn pay_invoice<'a>(
        &'a self,
        payment_request: &'a str,
        max_fee_msat: u64,
    ) -> BoxFuture<'a, Result<Preimage, BackendError>> {
        Box::pin(async move { Ok(self.send_payment(payment_request, max_fee_msat).await?) })
    }

    fn description_hash(&self, payment_request: &str) -> Result<Option<[u8; 32]>, BackendError> {
        invoice::description_hash(payment_request).map_err(|e| LndError::from(e).into())
    }
}
