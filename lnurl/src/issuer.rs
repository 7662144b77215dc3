//! First phase of the handshake: issuing metadata commitments.
//!
//! Each call draws fresh randomness, builds a metadata string around it,
//! registers the commitment and returns the [`PayParams`] the wallet will see.

use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::{SendableRange, ServiceConfig};
use crate::error::IssueError;
use crate::metadata::Metadata;
use crate::proto::{INVOICE_PATH, PayParams, PayRequestTag};
use crate::store::{Commitment, CommitmentStore};

/// Number of random bytes behind each commitment.
const ENTROPY_LENGTH: usize = 32;

/// Number of leading random bytes that form the commitment id.
const ID_LENGTH: usize = 10;

/// Issues commitments into a shared [`CommitmentStore`].
#[derive(Debug, Clone)]
pub struct Issuer {
    config: ServiceConfig,
    range: SendableRange,
    store: Arc<CommitmentStore>,
}

impl Issuer {
    /// Creates an issuer for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::InvalidBounds`] unless `0 < min_sendable <= max_sendable`.
    pub fn new(config: ServiceConfig, store: Arc<CommitmentStore>) -> Result<Self, IssueError> {
        let range = config.sendable().ok_or(IssueError::InvalidBounds {
            min: config.min_sendable,
            max: config.max_sendable,
        })?;
        Ok(Self {
            config,
            range,
            store,
        })
    }

    /// Issues a fresh commitment and returns its pay parameters.
    ///
    /// With `with_identifier` set, the metadata also carries the service's
    /// internet identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Random`] if the secure random source fails.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub async fn issue(&self, with_identifier: bool) -> Result<PayParams, IssueError> {
        let mut entropy = [0u8; ENTROPY_LENGTH];
        OsRng
            .try_fill_bytes(&mut entropy)
            .map_err(IssueError::Random)?;

        let id = hex::encode(&entropy[..ID_LENGTH]);
        let nonce = hex::encode(entropy);
        Ok(self.issue_commitment(id, &nonce, with_identifier).await)
    }

    /// Registers a commitment with a caller-chosen id and nonce.
    ///
    /// [`Issuer::issue`] is the entry point for live traffic; this is exposed
    /// for deterministic fixtures.
    pub async fn issue_commitment(
        &self,
        id: String,
        nonce: &str,
        with_identifier: bool,
    ) -> PayParams {
        let mut metadata = Metadata::new(nonce);
        if with_identifier {
            metadata = metadata.with_identifier(self.config.identifier());
        }
        let metadata = metadata.to_json();
        let callback = format!("{}{INVOICE_PATH}?id={id}", self.config.base_url());

        self.store
            .put(id, Commitment::new(metadata.clone()))
            .await;

        PayParams {
            callback,
            max_sendable: self.range.max_sendable,
            min_sendable: self.range.min_sendable,
            metadata,
            tag: PayRequestTag,
        }
    }

    /// The configuration this issuer publishes.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The validated payable range.
    #[must_use]
    pub const fn range(&self) -> SendableRange {
        self.range
    }
}
