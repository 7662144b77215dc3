//! Second phase of the handshake: redeeming commitments.
//!
//! A redemption consumes its commitment before asking the backend for a
//! payment request, so a commitment is never redeemed twice even if the
//! backend call fails.

use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::backend::{InvoiceRequest, LightningBackend};
use crate::config::SendableRange;
use crate::error::RedeemError;
use crate::metadata::description_hash;
use crate::proto::InvoiceResponse;
use crate::store::CommitmentStore;

/// Memo attached to every invoice minted by a redemption.
pub const INVOICE_MEMO: &str = "LNURL-pay";

/// Parses raw `id` and `amount` query values.
///
/// # Errors
///
/// Returns [`RedeemError::MissingId`] for an absent or empty id,
/// [`RedeemError::MissingAmount`] for an absent amount, and
/// [`RedeemError::InvalidAmount`] unless the amount is a positive integer.
pub fn parse_request(id: Option<&str>, amount: Option<&str>) -> Result<(String, u64), RedeemError> {
    let id = id.filter(|id| !id.is_empty()).ok_or(RedeemError::MissingId)?;
    let raw = amount.ok_or(RedeemError::MissingAmount)?;
    let amount = raw
        .parse::<u64>()
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or_else(|| RedeemError::InvalidAmount(raw.to_owned()))?;
    Ok((id.to_owned(), amount))
}

/// Redeems commitments against a Lightning backend.
#[derive(Clone)]
pub struct Redeemer {
    store: Arc<CommitmentStore>,
    backend: Arc<dyn LightningBackend>,
    range: SendableRange,
}

impl std::fmt::Debug for Redeemer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redeemer")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl Redeemer {
    /// Creates a redeemer accepting amounts within `range`.
    #[must_use]
    pub fn new(
        store: Arc<CommitmentStore>,
        backend: Arc<dyn LightningBackend>,
        range: SendableRange,
    ) -> Self {
        Self {
            store,
            backend,
            range,
        }
    }

    /// Consumes commitment `id` and mints a payment request for `amount`
    /// millisatoshi bound to the commitment's metadata.
    ///
    /// Out-of-range amounts are rejected before the commitment is touched.
    ///
    /// # Errors
    ///
    /// Returns a client error for out-of-range amounts and unknown ids, and
    /// [`RedeemError::Backend`] if the backend fails; the commitment is gone
    /// in the latter case.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub async fn redeem(&self, id: &str, amount: u64) -> Result<InvoiceResponse, RedeemError> {
        if !self.range.contains(amount) {
            return Err(RedeemError::AmountOutOfRange {
                amount,
                min: self.range.min_sendable,
                max: self.range.max_sendable,
            });
        }

        let commitment = self
            .store
            .take(id)
            .await
            .ok_or(RedeemError::UnknownCommitment)?;

        let pr = self
            .backend
            .create_invoice(InvoiceRequest {
                memo: INVOICE_MEMO.to_owned(),
                value_msat: amount,
                description_hash: description_hash(&commitment.metadata),
            })
            .await?;

        Ok(InvoiceResponse::new(pr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::store::Commitment;

    const METADATA: &str = r#"[["text/plain","abc123"]]"#;

    async fn setup(backend: MockBackend) -> (Redeemer, Arc<CommitmentStore>, Arc<MockBackend>) {
        let store = Arc::new(CommitmentStore::new());
        store.put("c1", Commitment::new(METADATA)).await;
        let backend = Arc::new(backend);
        let redeemer = Redeemer::new(
            Arc::clone(&store),
            backend.clone(),
            SendableRange::new(1000, 5000).unwrap(),
        );
        (redeemer, store, backend)
    }

    #[tokio::test]
    async fn test_redeem_binds_metadata_hash() {
        let (redeemer, _, backend) = setup(MockBackend::new()).await;

        let response = redeemer.redeem("c1", 2500).await.unwrap();

        assert!(response.routes.is_empty());
        let invoices = backend.invoices().await;
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].memo, "LNURL-pay");
        assert_eq!(invoices[0].value_msat, 2500);
        assert_eq!(
            hex::encode(invoices[0].description_hash),
            "be3d7cbc84a0bde08240e1fb716b80e931cac2b2b9ce590a411981ce1fe20c43"
        );
        assert_eq!(
            backend.description_hash(&response.pr).unwrap(),
            Some(invoices[0].description_hash)
        );
    }

    #[tokio::test]
    async fn test_second_redemption_rejected() {
        let (redeemer, _, _) = setup(MockBackend::new()).await;
        redeemer.redeem("c1", 1000).await.unwrap();
        let err = redeemer.redeem("c1", 1000).await.unwrap_err();
        assert!(matches!(err, RedeemError::UnknownCommitment));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_out_of_range_keeps_commitment() {
        let (redeemer, store, _) = setup(MockBackend::new()).await;
        for amount in [500, 5001] {
            assert!(matches!(
                redeemer.redeem("c1", amount).await,
                Err(RedeemError::AmountOutOfRange { .. })
            ));
        }
        assert_eq!(store.len().await, 1);
        redeemer.redeem("c1", 5000).await.unwrap();
    }

    #[tokio::test]
    async fn test_backend_failure_discards_commitment() {
        let (redeemer, store, _) = setup(MockBackend::new().failing_invoices()).await;
        let err = redeemer.redeem("c1", 2000).await.unwrap_err();
        assert!(matches!(err, RedeemError::Backend(_)));
        assert!(!err.is_client_error());
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(
            parse_request(Some("c1"), Some("2500")).unwrap(),
            ("c1".to_owned(), 2500)
        );
        assert!(matches!(parse_request(None, Some("1")), Err(RedeemError::MissingId)));
        assert!(matches!(parse_request(Some(""), Some("1")), Err(RedeemError::MissingId)));
        assert!(matches!(parse_request(Some("c1"), None), Err(RedeemError::MissingAmount)));
        for raw in ["0", "-5", "12abc", "1.5", ""] {
            assert!(matches!(
                parse_request(Some("c1"), Some(raw)),
                Err(RedeemError::InvalidAmount(_))
            ));
        }
    }
}
