//! Wire format types for the LNURL-pay protocol.
//!
//! These are the JSON bodies exchanged between a wallet and a service:
//! [`PayParams`] for the first phase, [`InvoiceResponse`] for the second, and
//! [`LnurlErrorResponse`] for protocol-level failures on either leg.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Path of the static first-phase endpoint.
pub const PAY_PATH: &str = "/pay";

/// Path of the second-phase (redemption) endpoint.
pub const INVOICE_PATH: &str = "/invoice";

/// Path prefix of the internet-identifier first-phase endpoint.
pub const WELL_KNOWN_PREFIX: &str = "/.well-known/lnurlp/";

/// The `tag` value identifying a pay request.
///
/// Serializes as the literal string `"payRequest"` and refuses anything else
/// on deserialization, so a response for another LNURL sub-protocol cannot be
/// mistaken for a pay request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayRequestTag;

impl PayRequestTag {
    /// The literal tag value.
    pub const VALUE: &'static str = "payRequest";
}

impl AsRef<str> for PayRequestTag {
    fn as_ref(&self) -> &str {
        Self::VALUE
    }
}

impl fmt::Display for PayRequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::VALUE)
    }
}

impl Serialize for PayRequestTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for PayRequestTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl Visitor<'_> for TagVisitor {
            type Value = PayRequestTag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "the string \"{}\"", PayRequestTag::VALUE)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == PayRequestTag::VALUE {
                    Ok(PayRequestTag)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

/// First-phase response: the parameters of a pay request.
///
/// # JSON Format
///
/// ```json
/// {
///   "callback": "https://pay.example.com:443/invoice?id=3f9a...",
///   "maxSendable": 5000,
///   "minSendable": 1000,
///   "metadata": "[[\"text/plain\",\"3f9a...\"]]",
///   "tag": "payRequest"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayParams {
    /// URL to call with the chosen amount.
    pub callback: String,

    /// Largest payable amount, in millisatoshi.
    pub max_sendable: u64,

    /// Smallest payable amount, in millisatoshi.
    pub min_sendable: u64,

    /// Pre-serialized metadata; hashed verbatim.
    pub metadata: String,

    /// Always `"payRequest"`.
    pub tag: PayRequestTag,
}

/// Second-phase response carrying the minted payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    /// BOLT11 payment request.
    pub pr: String,

    /// Routing hints; always empty when issued by this service.
    #[serde(default)]
    pub routes: Vec<Value>,
}

impl InvoiceResponse {
    /// Wraps a payment request with an empty route list.
    #[must_use]
    pub const fn new(pr: String) -> Self {
        Self {
            pr,
            routes: Vec::new(),
        }
    }
}

/// Status marker of an LNURL error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LnurlStatus {
    /// `"ERROR"`.
    #[serde(rename = "ERROR")]
    Error,
}

/// Protocol-level error body: `{"status":"ERROR","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnurlErrorResponse {
    /// Always [`LnurlStatus::Error`].
    pub status: LnurlStatus,

    /// Human-readable reason.
    pub reason: String,
}

impl LnurlErrorResponse {
    /// Creates an error body with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            status: LnurlStatus::Error,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_params_wire_shape() {
        let params = PayParams {
            callback: "http://localhost:8080/invoice?id=00".into(),
            max_sendable: 5000,
            min_sendable: 1000,
            metadata: r#"[["text/plain","abc123"]]"#.into(),
            tag: PayRequestTag,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["maxSendable"], 5000);
        assert_eq!(json["minSendable"], 1000);
        assert_eq!(json["tag"], "payRequest");
        assert_eq!(json["metadata"], r#"[["text/plain","abc123"]]"#);
    }

    #[test]
    fn test_foreign_tag_rejected() {
        let json = r#"{"callback":"https://x.io/cb","maxSendable":1,"minSendable":1,"metadata":"[]","tag":"withdrawRequest"}"#;
        assert!(serde_json::from_str::<PayParams>(json).is_err());
    }

    #[test]
    fn test_invoice_response_defaults_routes() {
        let parsed: InvoiceResponse = serde_json::from_str(r#"{"pr":"lnbc1"}"#).unwrap();
        assert_eq!(parsed, InvoiceResponse::new("lnbc1".into()));
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"{"pr":"lnbc1","routes":[]}"#
        );
    }

    #[test]
    fn test_error_body() {
        let body = serde_json::to_string(&LnurlErrorResponse::new("unknown id")).unwrap();
        assert_eq!(body, r#"{"status":"ERROR","reason":"unknown id"}"#);
    }
}
