//! `lnurl`: encode, decode and pay LNURLs from the command line.
//!
//! # Usage
//!
//! ```bash
//! lnurl encode https://pay.example.com/pay
//! lnurl decode LNURL1DP68GURN8GHJ7...
//! LND_MACAROON=$(xxd -p -c 1000 admin.macaroon) \
//!     lnurl pay --target alice@pay.example.com --amount 2500
//! ```
//!
//! LND connection flags fall back to `LND_*` environment variables, which
//! may also come from a `.env` file. `RUST_LOG` controls log output on
//! stderr (default: `info`).

#![allow(clippy::print_stdout)]

mod args;
mod prompt;

use std::io;

use clap::Parser;
use lnurl::resolver::Resolver;
use lnurl_http::HttpTransport;
use lnurl_lnd::{LndConfig, LndRestClient};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command, PayArgs};
use crate::prompt::Prompt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Encode { url } => println!("{}", lnurl::encode_url(&url)?),
        Command::Decode { token } => println!("{}", lnurl::decode_url(strip_lightning(&token))?),
        Command::Pay(args) => pay(args).await?,
    }
    Ok(())
}

async fn pay(args: PayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let node = LndRestClient::try_new(&LndConfig::from(args.lnd))?;
    let resolver = Resolver::new(HttpTransport::new()?, node).allow_insecure(args.no_tls);

    let offer = resolver.fetch_offer(&args.target).await?;
    println!("{}", offer.description);
    println!(
        "Payable: {} to {} msat",
        offer.range.min_sendable, offer.range.max_sendable
    );

    let mut prompt = Prompt::new(io::BufReader::new(io::stdin()), io::stdout());
    let payment = resolver
        .pay_offer(&offer, args.amount.unwrap_or(0), args.max_fee, &mut prompt)
        .await?;

    println!(
        "Successful payment of {} msat! Preimage: {}",
        payment.amount_msat, payment.preimage
    );
    Ok(())
}

fn strip_lightning(token: &str) -> &str {
    let token = token.trim();
    token
        .get(..10)
        .filter(|prefix| prefix.eq_ignore_ascii_case("lightning:"))
        .map_or(token, |_| &token[10..])
}
