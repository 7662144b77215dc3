//! Bodies of the LND REST endpoints used by the backend.
//!
//! LND's gateway renders 64-bit integers as strings and byte fields as
//! base64, hence the `serde_with` adapters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, base64::Base64, serde_as};

/// `GET /v1/getinfo` response; only the fields the backend reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GetInfo {
    /// Node alias.
    #[serde(default)]
    pub alias: String,
    /// Hex-encoded node public key.
    #[serde(default)]
    pub identity_pubkey: String,
    /// Current best block height.
    #[serde(default)]
    pub block_height: u32,
    /// Whether the node is synced to the chain.
    #[serde(default)]
    pub synced_to_chain: bool,
}

/// `POST /v1/invoices` request.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddInvoiceRequest {
    /// Memo stored with the invoice.
    pub memo: String,
    /// Amount in millisatoshi.
    #[serde_as(as = "DisplayFromStr")]
    pub value_msat: u64,
    /// SHA-256 committed to by the `h` tagged field.
    #[serde_as(as = "Base64")]
    pub description_hash: [u8; 32],
}

/// `POST /v1/invoices` response.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct AddInvoiceResponse {
    /// Payment hash.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub r_hash: Vec<u8>,
    /// BOLT11 payment request.
    pub payment_request: String,
    /// Index of the invoice in the node's database.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub add_index: u64,
}

/// Fee ceiling of a payment.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeLimit {
    /// Maximum fee, in millisatoshi.
    #[serde_as(as = "DisplayFromStr")]
    pub fixed_msat: u64,
}

/// `POST /v1/channels/transactions` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendPaymentRequest {
    /// BOLT11 payment request to pay.
    pub payment_request: String,
    /// Fee ceiling.
    pub fee_limit: FeeLimit,
}

/// `POST /v1/channels/transactions` response.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct SendPaymentResponse {
    /// Non-empty when the payment failed.
    #[serde(default)]
    pub payment_error: String,
    /// Preimage proving the payment.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub payment_preimage: Vec<u8>,
    /// Payment hash.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub payment_hash: Vec<u8>,
}
