//! Configuration for an LNURL-pay service.
//!
//! [`ServiceConfig`] describes how the service is reachable from the outside
//! (the callback and identifier are built from it) and which amounts it
//! accepts.

use serde::{Deserialize, Serialize};

/// Inclusive range of payable amounts, in millisatoshi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendableRange {
    /// Smallest payable amount.
    pub min_sendable: u64,
    /// Largest payable amount.
    pub max_sendable: u64,
}

impl SendableRange {
    /// Creates a range, returning `None` unless `0 < min <= max`.
    #[must_use]
    pub const fn new(min_sendable: u64, max_sendable: u64) -> Option<Self> {
        if min_sendable == 0 || min_sendable > max_sendable {
            None
        } else {
            Some(Self {
                min_sendable,
                max_sendable,
            })
        }
    }

    /// Whether `amount` lies within the range.
    #[must_use]
    pub const fn contains(&self, amount: u64) -> bool {
        self.min_sendable <= amount && amount <= self.max_sendable
    }
}

/// Public address and payment limits of a service.
///
/// # Example
///
/// ```rust
/// use lnurl::config::ServiceConfig;
///
/// let config = ServiceConfig {
///     protocol: "https".into(),
///     host: "pay.example.com".into(),
///     port: 443,
///     username: "alice".into(),
///     min_sendable: 1000,
///     max_sendable: 5000,
/// };
/// assert_eq!(config.identifier(), "alice@pay.example.com:443");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Public scheme, `http` or `https`.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Public host name.
    pub host: String,

    /// Public port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username served under `/.well-known/lnurlp/`.
    pub username: String,

    /// Smallest payable amount, in millisatoshi.
    pub min_sendable: u64,

    /// Largest payable amount, in millisatoshi.
    pub max_sendable: u64,
}

fn default_protocol() -> String {
    "https".to_owned()
}

const fn default_port() -> u16 {
    443
}

impl ServiceConfig {
    /// Returns `scheme://host:port`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Returns the internet identifier `user@host`, with `:port` appended
    /// unless the port is 80.
    #[must_use]
    pub fn identifier(&self) -> String {
        if self.port == 80 {
            format!("{}@{}", self.username, self.host)
        } else {
            format!("{}@{}:{}", self.username, self.host, self.port)
        }
    }

    /// Returns the validated sendable range, or `None` if the bounds are invalid.
    #[must_use]
    pub const fn sendable(&self) -> Option<SendableRange> {
        SendableRange::new(self.min_sendable, self.max_sendable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16) -> ServiceConfig {
        ServiceConfig {
            protocol: "http".into(),
            host: "example.com".into(),
            port,
            username: "alice".into(),
            min_sendable: 1000,
            max_sendable: 5000,
        }
    }

    #[test]
    fn test_identifier_omits_port_80() {
        assert_eq!(config(80).identifier(), "alice@example.com");
        assert_eq!(config(8080).identifier(), "alice@example.com:8080");
    }

    #[test]
    fn test_sendable_bounds() {
        let range = config(80).sendable().unwrap();
        assert!(!range.contains(500));
        assert!(range.contains(1000));
        assert!(range.contains(2500));
        assert!(range.contains(5000));
        assert!(!range.contains(5001));
        assert_eq!(SendableRange::new(0, 10), None);
        assert_eq!(SendableRange::new(10, 9), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let parsed: ServiceConfig = serde_json::from_str(
            r#"{"host":"pay.example.com","username":"bob","min_sendable":1,"max_sendable":2}"#,
        )
        .unwrap();
        assert_eq!(parsed.base_url(), "https://pay.example.com:443");
    }
}
