//! BOLT11 decoding.
//!
//! Only the description hash (`h` tagged field) is extracted. The signature
//! is not checked here; LND verifies it before paying.

use bitcoin::hashes::Hash;
use lightning_invoice::{RawTaggedField, SignedRawBolt11Invoice, TaggedField};

/// Errors decoding a BOLT11 payment request.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// The string is not a BOLT11 payment request.
    #[error("invalid BOLT11 payment request: {0}")]
    Parse(String),
}

/// Returns the description hash of a BOLT11 payment request, or `None` if it
/// carries a plain description.
///
/// A `lightning:` URI prefix is accepted.
///
/// # Errors
///
/// Returns [`InvoiceError::Parse`] if the payment request does not decode.
pub fn description_hash(payment_request: &str) -> Result<Option<[u8; 32]>, InvoiceError> {
    let payment_request = payment_request.trim();
    let payment_request = payment_request
        .get(..10)
        .filter(|prefix| prefix.eq_ignore_ascii_case("lightning:"))
        .map_or(payment_request, |_| &payment_request[10..]);

    let signed = payment_request
        .parse::<SignedRawBolt11Invoice>()
        .map_err(|e| InvoiceError::Parse(e.to_string()))?;
    let (raw, _hash, _signature) = signed.into_parts();

    Ok(raw
        .data
        .tagged_fields
        .into_iter()
        .find_map(|field| match field {
            RawTaggedField::KnownSemantics(TaggedField::DescriptionHash(sha256)) => {
                Some(sha256.0.to_byte_array())
            }
            _ => None,
        }))
}
