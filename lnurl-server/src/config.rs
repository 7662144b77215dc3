//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8080
//!
//! [service]
//! protocol = "https"
//! host = "pay.example.com"
//! port = 443
//! username = "alice"
//! min_sendable = 1000
//! max_sendable = 100000000
//!
//! [commitments]
//! ttl_secs = 600
//! sweep_interval_secs = 60
//!
//! [lnd]
//! rest_url = "https://localhost:8080"
//! macaroon_hex = "$LND_MACAROON_HEX"
//! tls_cert_path = "/home/lnd/.lnd/tls.cert"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG`: path to the configuration file (default: `config.toml`)
//! - `HOST`: overrides the bind address
//! - `PORT`: overrides the bind port
//! - any variable referenced by `$VAR` in the file, typically the macaroon

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use lnurl::config::ServiceConfig;
use lnurl_lnd::LndConfig;
use serde::Deserialize;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Bind port (default: `8080`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public address and payable bounds.
    pub service: ServiceConfig,

    /// Commitment lifetime.
    #[serde(default)]
    pub commitments: CommitmentsConfig,

    /// The LND node minting invoices.
    pub lnd: LndConfig,
}

/// Lifetime of unredeemed commitments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CommitmentsConfig {
    /// Age after which an unredeemed commitment is dropped.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CommitmentsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CommitmentsConfig {
    /// Commitment time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep period, never shorter than one second.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    8080
}

const fn default_ttl_secs() -> u64 {
    600
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

impl ServerConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is treated as empty, so the error names the first
    /// required section.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut config = Self::parse(&expand_env_vars(&content))?;

        if let Ok(host) = std::env::var("HOST") {
            if let Ok(addr) = host.parse() {
                config.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        Ok(config)
    }

    /// Parses an already expanded TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`toml::de::Error`] if the document is malformed or incomplete.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
