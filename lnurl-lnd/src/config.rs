//! Connection settings for an LND node.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::LndError;

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A macaroon credential.
#[derive(Clone)]
pub struct Macaroon(Vec<u8>);

impl Macaroon {
    /// Hex encoding, as sent in the `Grpc-Metadata-Macaroon` header.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl FromStr for Macaroon {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim()).map(Self)
    }
}

impl From<Vec<u8>> for Macaroon {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Macaroon {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Macaroon(<redacted>)")
    }
}

/// LND REST connection settings.
///
/// Exactly one of `macaroon_hex` and `macaroon_path` should be set; the hex
/// form wins if both are.
///
/// # Example
///
/// ```toml
/// [lnd]
/// rest_url = "https://localhost:8080"
/// macaroon_path = "/home/lnd/.lnd/data/chain/bitcoin/mainnet/admin.macaroon"
/// tls_cert_path = "/home/lnd/.lnd/tls.cert"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LndConfig {
    /// Base URL of the REST gateway.
    pub rest_url: String,

    /// Hex-encoded macaroon.
    #[serde(default)]
    pub macaroon_hex: Option<String>,

    /// Path to a binary macaroon file.
    #[serde(default)]
    pub macaroon_path: Option<PathBuf>,

    /// Path to the node's PEM TLS certificate.
    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,

    /// Skip TLS certificate verification entirely.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl LndConfig {
    /// Creates settings for `rest_url` authenticated with `macaroon_hex`.
    #[must_use]
    pub fn new(rest_url: impl Into<String>, macaroon_hex: impl Into<String>) -> Self {
        Self {
            rest_url: rest_url.into(),
            macaroon_hex: Some(macaroon_hex.into()),
            macaroon_path: None,
            tls_cert_path: None,
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// The request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Loads the macaroon from the hex setting or the macaroon file.
    ///
    /// # Errors
    ///
    /// Returns [`LndError::MissingMacaroon`] if neither is configured,
    /// [`LndError::Hex`] for malformed hex and [`LndError::Io`] if the file
    /// cannot be read.
    pub fn load_macaroon(&self) -> Result<Macaroon, LndError> {
        if let Some(hex) = &self.macaroon_hex {
            return Ok(hex.parse()?);
        }
        let path = self.macaroon_path.as_ref().ok_or(LndError::MissingMacaroon)?;
        std::fs::read(path)
            .map(Macaroon::from)
            .map_err(|source| LndError::Io {
                path: path.clone(),
                source,
            })
    }

    /// Loads the PEM TLS certificate, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`LndError::Io`] if the file cannot be read.
    pub fn load_tls_cert(&self) -> Result<Option<Vec<u8>>, LndError> {
        self.tls_cert_path
            .as_ref()
            .map(|path| {
                std::fs::read(path).map_err(|source| LndError::Io {
                    path: path.clone(),
                    source,
                })
            })
            .transpose()
    }
}
