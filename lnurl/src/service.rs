//! Service-side façade.
//!
//! [`PayService`] owns the commitment store and wires the [`Issuer`] and
//! [`Redeemer`] to it. HTTP handlers only ever talk to this type.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::backend::LightningBackend;
use crate::codec::{self, CodecError};
use crate::config::ServiceConfig;
use crate::error::{IssueError, RedeemError};
use crate::issuer::Issuer;
use crate::proto::{InvoiceResponse, PAY_PATH, PayParams};
use crate::redeemer::Redeemer;
use crate::store::CommitmentStore;
use crate::timestamp::UnixTimestamp;

/// The static forms under which a service can be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticCodes {
    /// Upper-case bech32 token of the static pay URL.
    pub lnurl: String,
    /// The token behind a `lightning:` URI scheme.
    pub lightning_uri: String,
    /// The static pay URL with the `lnurlp://` scheme.
    pub lnurlp: String,
    /// The internet identifier, `user@host[:port]`.
    pub address: String,
}

/// An LNURL-pay service instance.
#[derive(Debug, Clone)]
pub struct PayService {
    store: Arc<CommitmentStore>,
    issuer: Issuer,
    redeemer: Redeemer,
}

impl PayService {
    /// Creates a service with an empty commitment store.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::InvalidBounds`] if the configured sendable bounds
    /// are not `0 < min <= max`.
    pub fn new(
        config: ServiceConfig,
        backend: Arc<dyn LightningBackend>,
    ) -> Result<Self, IssueError> {
        let store = Arc::new(CommitmentStore::new());
        let issuer = Issuer::new(config, Arc::clone(&store))?;
        let redeemer = Redeemer::new(Arc::clone(&store), backend, issuer.range());
        Ok(Self {
            store,
            issuer,
            redeemer,
        })
    }

    /// The service configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        self.issuer.config()
    }

    /// The shared commitment store.
    #[must_use]
    pub const fn store(&self) -> &Arc<CommitmentStore> {
        &self.store
    }

    /// The issuer, for callers that need deterministic commitments.
    #[must_use]
    pub const fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// First phase on the static path.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Random`] if the secure random source fails.
    pub async fn pay_params(&self) -> Result<PayParams, IssueError> {
        self.issuer.issue(false).await
    }

    /// First phase on the internet-identifier path.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::UnknownUser`] for any username other than the
    /// configured one, and [`IssueError::Random`] if the random source fails.
    pub async fn identifier_params(&self, username: &str) -> Result<PayParams, IssueError> {
        if username != self.config().username {
            return Err(IssueError::UnknownUser(username.to_owned()));
        }
        self.issuer.issue(true).await
    }

    /// Second phase: redeems commitment `id` for `amount` millisatoshi.
    ///
    /// # Errors
    ///
    /// See [`Redeemer::redeem`].
    pub async fn redeem(&self, id: &str, amount: u64) -> Result<InvoiceResponse, RedeemError> {
        self.redeemer.redeem(id, amount).await
    }

    /// Evicts commitments older than `ttl`, returning how many were removed.
    pub async fn sweep(&self, ttl: Duration) -> usize {
        self.store.sweep(UnixTimestamp::now(), ttl).await
    }

    /// Derives the static codes under which this service is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooLong`] if the pay URL is too long to encode.
    pub fn static_codes(&self) -> Result<StaticCodes, CodecError> {
        let config = self.config();
        let lnurl = codec::encode_url(&format!("{}{PAY_PATH}", config.base_url()))?;
        Ok(StaticCodes {
            lightning_uri: format!("lightning:{lnurl}"),
            lnurl,
            lnurlp: format!("lnurlp://{}:{}{PAY_PATH}", config.host, config.port),
            address: config.identifier(),
        })
    }
}
