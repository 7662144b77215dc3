//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lnurl_lnd::LndConfig;
use lnurl_lnd::config::DEFAULT_TIMEOUT_SECS;

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "lnurl", version, about = "LNURL encoder, decoder and LNURL-pay wallet")]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode a URL as an upper-case LNURL token.
    Encode {
        /// The URL to encode.
        url: String,
    },
    /// Decode an LNURL token back to its URL.
    Decode {
        /// The token, with or without a `lightning:` prefix.
        token: String,
    },
    /// Pay an LNURL-pay target from an LND node.
    Pay(PayArgs),
}

/// Arguments of `lnurl pay`.
#[derive(Debug, clap::Args)]
pub struct PayArgs {
    /// LNURL token, `lightning:` URI, `lnurlp://` URL or `user@domain`.
    #[arg(long)]
    pub target: String,

    /// Amount in millisatoshi. Asked for on stdin when missing or out of range.
    #[arg(long)]
    pub amount: Option<u64>,

    /// Routing fee ceiling in millisatoshi.
    #[arg(long, default_value_t = 1000)]
    pub max_fee: u64,

    /// Use `http` instead of `https` for `lnurlp://` and `user@domain` targets.
    #[arg(long)]
    pub no_tls: bool,

    /// The paying node.
    #[command(flatten)]
    pub lnd: LndArgs,
}

/// Connection to the paying LND node.
#[derive(Debug, Clone, clap::Args)]
pub struct LndArgs {
    /// Base URL of the LND REST API.
    #[arg(long, env = "LND_REST_URL", default_value = "https://localhost:8080")]
    pub lnd_rest_url: String,

    /// Macaroon in hex format.
    #[arg(long, env = "LND_MACAROON", hide_env_values = true)]
    pub lnd_macaroon: Option<String>,

    /// Path to a binary macaroon file, used when no hex macaroon is given.
    #[arg(long, env = "LND_MACAROON_PATH")]
    pub lnd_macaroon_path: Option<PathBuf>,

    /// Path to LND's PEM TLS certificate.
    #[arg(long, env = "LND_TLS_CERT_PATH")]
    pub lnd_tls_cert_path: Option<PathBuf>,

    /// Skip TLS certificate verification for the LND connection.
    #[arg(long, env = "LND_ACCEPT_INVALID_CERTS")]
    pub lnd_accept_invalid_certs: bool,

    /// Per-request timeout, in seconds.
    #[arg(long, env = "LND_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub lnd_timeout_secs: u64,
}

impl From<LndArgs> for LndConfig {
    fn from(args: LndArgs) -> Self {
        Self {
            rest_url: args.lnd_rest_url,
            macaroon_hex: args.lnd_macaroon,
            macaroon_path: args.lnd_macaroon_path,
            tls_cert_path: args.lnd_tls_cert_path,
            accept_invalid_certs: args.lnd_accept_invalid_certs,
            timeout_secs: args.lnd_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pay_defaults() {
        let cli = Cli::try_parse_from([
            "lnurl",
            "pay",
            "--target",
            "alice@example.com",
            "--lnd-macaroon",
            "0201",
        ])
        .unwrap();
        let Command::Pay(args) = cli.command else {
            panic!("expected pay");
        };
        assert_eq!(args.amount, None);
        assert_eq!(args.max_fee, 1000);
        assert!(!args.no_tls);

        let config = LndConfig::from(args.lnd);
        assert_eq!(config.macaroon_hex.as_deref(), Some("0201"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_pay_requires_target() {
        assert!(Cli::try_parse_from(["lnurl", "pay", "--amount", "2500"]).is_err());
    }
}
