//! Lightning node abstraction.
//!
//! The protocol engine never talks to a node directly. It mints and pays BOLT11
//! payment requests through [`LightningBackend`], which also owns decoding of
//! the payment request format.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A pinned, boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Parameters of an invoice to mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Human-readable memo stored by the node.
    pub memo: String,
    /// Amount in millisatoshi.
    pub value_msat: u64,
    /// SHA-256 of the metadata the invoice commits to.
    pub description_hash: [u8; 32],
}

/// Proof of payment returned by a settled payment.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Preimage(pub [u8; 32]);

impl Preimage {
    /// Hex encoding of the preimage.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Preimage").field(&self.to_hex()).finish()
    }
}

/// Errors reported by a Lightning backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The node could not be reached.
    #[error("backend transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The node answered with an error status.
    #[error("backend rejected request ({status}): {message}")]
    Rejected {
        /// HTTP or RPC status code.
        status: u16,
        /// Error message supplied by the node.
        message: String,
    },
    /// The payment was attempted and failed.
    #[error("payment failed: {0}")]
    PaymentFailed(String),
    /// The payment request could not be decoded.
    #[error("invalid payment request: {0}")]
    InvalidPaymentRequest(String),
    /// The node's answer could not be interpreted.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
}

/// Operations the protocol engine needs from a Lightning node.
///
/// All network-bound methods return a [`BoxFuture`] so the trait stays
/// object-safe and can be shared as `Arc<dyn LightningBackend>`.
pub trait LightningBackend: Send + Sync {
    /// Returns the node's alias.
    fn node_alias(&self) -> BoxFuture<'_, Result<String, BackendError>>;

    /// Mints a payment request committing to `request.description_hash`.
    fn create_invoice(&self, request: InvoiceRequest) -> BoxFuture<'_, Result<String, BackendError>>;

    /// Pays `payment_request`, spending at most `max_fee_msat` in routing fees.
    fn pay_invoice<'a>(
        &'a self,
        payment_request: &'a str,
        max_fee_msat: u64,
    ) -> BoxFuture<'a, Result<Preimage, BackendError>>;

    /// Extracts the description hash embedded in `payment_request`.
    ///
    /// Returns `Ok(None)` if the request carries a plain description instead.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidPaymentRequest`] if the request does not decode.
    fn description_hash(&self, payment_request: &str) -> Result<Option<[u8; 32]>, BackendError>;
}

impl<T: LightningBackend + ?Sized> LightningBackend for Arc<T> {
    fn node_alias(&self) -> BoxFuture<'_, Result<String, BackendError>> {
        (**self).node_alias()
    }

    fn create_invoice(&self, request: InvoiceRequest) -> BoxFuture<'_, Result<String, BackendError>> {
        (**self).create_invoice(request)
    }

    fn pay_invoice<'a>(
        &'a self,
        payment_request: &'a str,
        max_fee_msat: u64,
    ) -> BoxFuture<'a, Result<Preimage, BackendError>> {
        (**self).pay_invoice(payment_request, max_fee_msat)
    }

    fn description_hash(&self, payment_request: &str) -> Result<Option<[u8; 32]>, BackendError> {
        (**self).description_hash(payment_request)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockBackend;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use sha2::{Digest, Sha256};
    use tokio::sync::Mutex;

    use super::{BackendError, BoxFuture, InvoiceRequest, LightningBackend, Preimage};
    use crate::codec;

    const MOCK_HRP: &str = "lnmock";

    /// In-memory backend minting self-describing payment requests.
    ///
    /// Payment requests are bech32 strings with the `lnmock` prefix whose
    /// payload is the big-endian amount followed by the description hash, so
    /// [`LightningBackend::description_hash`] can decode them without a node.
    #[derive(Debug, Default)]
    pub struct MockBackend {
        alias: String,
        forced_hash: Option<[u8; 32]>,
        fail_invoices: bool,
        fail_payments: bool,
        invoices: Mutex<Vec<InvoiceRequest>>,
        payments: Mutex<Vec<(String, u64)>>,
    }

    impl MockBackend {
        /// Creates a backend that mints and pays successfully.
        #[must_use]
        pub fn new() -> Self {
            Self {
                alias: "mock-node".to_owned(),
                ..Self::default()
            }
        }

        /// Mints every payment request with `hash`, ignoring the requested one.
        #[must_use]
        pub const fn with_forced_hash(mut self, hash: [u8; 32]) -> Self {
            self.forced_hash = Some(hash);
            self
        }

        /// Makes every `create_invoice` call fail.
        #[must_use]
        pub const fn failing_invoices(mut self) -> Self {
            self.fail_invoices = true;
            self
        }

        /// Makes every `pay_invoice` call fail.
        #[must_use]
        pub const fn failing_payments(mut self) -> Self {
            self.fail_payments = true;
            self
        }

        /// Invoice requests received so far.
        pub async fn invoices(&self) -> Vec<InvoiceRequest> {
            self.invoices.lock().await.clone()
        }

        /// Payments dispatched so far, as `(payment_request, max_fee_msat)`.
        pub async fn payments(&self) -> Vec<(String, u64)> {
            self.payments.lock().await.clone()
        }

        /// Mints a payment request for `value_msat` committing to `hash`.
        ///
        /// # Errors
        ///
        /// Never fails in practice; the payload is far below the token limit.
        pub fn mint(value_msat: u64, hash: [u8; 32]) -> Result<String, BackendError> {
            let mut payload = Vec::with_capacity(40);
            payload.extend_from_slice(&value_msat.to_be_bytes());
            payload.extend_from_slice(&hash);
            codec::encode(MOCK_HRP, &payload)
                .map_err(|e| BackendError::InvalidPaymentRequest(e.to_string()))
        }
    }

    impl LightningBackend for MockBackend {
        fn node_alias(&self) -> BoxFuture<'_, Result<String, BackendError>> {
            Box::pin(async move { Ok(self.alias.clone()) })
        }

        fn create_invoice(
            &self,
            request: InvoiceRequest,
        ) -> BoxFuture<'_, Result<String, BackendError>> {
            Box::pin(async move {
                if self.fail_invoices {
                    return Err(BackendError::Rejected {
                        status: 500,
                        message: "invoice creation disabled".to_owned(),
                    });
                }
                let hash = self.forced_hash.unwrap_or(request.description_hash);
                let pr = Self::mint(request.value_msat, hash)?;
                self.invoices.lock().await.push(request);
                Ok(pr)
            })
        }

        fn pay_invoice<'a>(
            &'a self,
            payment_request: &'a str,
            max_fee_msat: u64,
        ) -> BoxFuture<'a, Result<Preimage, BackendError>> {
            Box::pin(async move {
                self.payments
                    .lock()
                    .await
                    .push((payment_request.to_owned(), max_fee_msat));
                if self.fail_payments {
                    return Err(BackendError::PaymentFailed("no route".to_owned()));
                }
                Ok(Preimage(Sha256::digest(payment_request.as_bytes()).into()))
            })
        }

        fn description_hash(
            &self,
            payment_request: &str,
        ) -> Result<Option<[u8; 32]>, BackendError> {
            let (hrp, payload) = codec::decode(payment_request)
                .map_err(|e| BackendError::InvalidPaymentRequest(e.to_string()))?;
            if hrp != MOCK_HRP || payload.len() != 40 {
                return Err(BackendError::InvalidPaymentRequest(
                    "not a mock payment request".to_owned(),
                ));
            }
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&payload[8..]);
            Ok(Some(hash))
        }
    }
}
