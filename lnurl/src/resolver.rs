//! Wallet side of the handshake.
//!
//! The [`Resolver`] turns a user-supplied target into a pay URL, fetches the
//! pay parameters, settles on an amount, redeems the callback and pays the
//! resulting payment request, but only after checking that the request
//! commits to the metadata it was shown.
//!
//! Four target forms are accepted:
//!
//! | Form | Example |
//! |------|---------|
//! | bech32 token | `LNURL1DP68GURN8GHJ7...` |
//! | `lightning:` URI | `lightning:LNURL1DP68GURN8GHJ7...` |
//! | `lnurlp://` URL | `lnurlp://pay.example.com/pay` |
//! | internet identifier | `alice@pay.example.com` |

use url::Url;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::backend::{BoxFuture, LightningBackend, Preimage};
use crate::codec::{self, LNURL_HRP};
use crate::config::SendableRange;
use crate::error::{BoxError, ResolveError};
use crate::metadata::{description_hash, text_plain};
use crate::proto::{InvoiceResponse, PayParams, WELL_KNOWN_PREFIX};

const LIGHTNING_PREFIX: &str = "lightning:";
const LNURLP_SCHEME: &str = "lnurlp";

/// A parsed payment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A bech32 LNURL token, with or without a `lightning:` prefix.
    Token(String),
    /// An `lnurlp://` URL.
    Lnurlp(String),
    /// An internet identifier `user@domain`.
    Address {
        /// Local part.
        user: String,
        /// Domain, optionally with a port.
        domain: String,
    },
}

impl Target {
    /// Classifies `input` into one of the accepted target forms.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnsupportedTarget`] if no form matches.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let input = input.trim();
        let unsupported = || ResolveError::UnsupportedTarget(input.to_owned());

        let body = strip_prefix_ignore_case(input, LIGHTNING_PREFIX);
        if let Some(token) = body {
            return if starts_with_ignore_case(token, LNURL_HRP) {
                Ok(Self::Token(token.to_owned()))
            } else {
                Err(unsupported())
            };
        }
        if starts_with_ignore_case(input, "lnurlp://") {
            return Ok(Self::Lnurlp(input.to_owned()));
        }
        if starts_with_ignore_case(input, LNURL_HRP) && !input.contains('@') {
            return Ok(Self::Token(input.to_owned()));
        }
        if let Some((user, domain)) = input.split_once('@') {
            let valid = |part: &str| {
                !part.is_empty() && !part.contains(['@', '/', '?', '#']) && !part.contains(char::is_whitespace)
            };
            if valid(user) && valid(domain) {
                return Ok(Self::Address {
                    user: user.to_owned(),
                    domain: domain.to_owned(),
                });
            }
        }
        Err(unsupported())
    }

    /// Resolves the target to the URL of its pay parameters.
    ///
    /// Unless `allow_insecure` is set the URL must use `https`; with it set,
    /// `lnurlp://` and identifier targets map to `http`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Codec`] for undecodable tokens,
    /// [`ResolveError::InvalidUrl`] for unparsable URLs and
    /// [`ResolveError::InsecureUrl`] for non-`https` URLs.
    pub fn to_url(&self, allow_insecure: bool) -> Result<Url, ResolveError> {
        let scheme = if allow_insecure { "http" } else { "https" };
        let url = match self {
            Self::Token(token) => Url::parse(&codec::decode_url(token)?)?,
            Self::Lnurlp(raw) => Url::parse(&format!("{scheme}{}", &raw[LNURLP_SCHEME.len()..]))?,
            Self::Address { user, domain } => {
                Url::parse(&format!("{scheme}://{domain}{WELL_KNOWN_PREFIX}{user}"))?
            }
        };
        if !allow_insecure && url.scheme() != "https" {
            return Err(ResolveError::InsecureUrl(url.into()));
        }
        Ok(url)
    }
}

fn starts_with_ignore_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    starts_with_ignore_case(input, prefix).then(|| &input[prefix.len()..])
}

/// Fetches LNURL-pay documents over some transport.
pub trait Transport: Send + Sync {
    /// GETs the pay parameters at `url`.
    fn fetch_pay_params<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PayParams, BoxError>>;

    /// GETs the callback at `url`, which already carries the amount.
    fn fetch_invoice<'a>(&'a self, url: &'a Url)
    -> BoxFuture<'a, Result<InvoiceResponse, BoxError>>;
}

/// Chooses a replacement amount when the requested one is out of range.
///
/// Receives the advertised range and the rejected amount; returns a new
/// amount to try, or `None` to cancel the payment. Implemented for any
/// matching closure.
pub trait AmountStrategy {
    /// Proposes another amount, or `None` to cancel.
    fn choose(&mut self, range: SendableRange, rejected: u64) -> Option<u64>;
}

impl<F> AmountStrategy for F
where
    F: FnMut(SendableRange, u64) -> Option<u64>,
{
    fn choose(&mut self, range: SendableRange, rejected: u64) -> Option<u64> {
        self(range, rejected)
    }
}

/// Strategy that never proposes a replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl AmountStrategy for NoRetry {
    fn choose(&mut self, _range: SendableRange, _rejected: u64) -> Option<u64> {
        None
    }
}

/// Validated pay parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayOffer {
    /// The raw parameters as received.
    pub params: PayParams,
    /// The advertised sendable range.
    pub range: SendableRange,
    /// Value of the `text/plain` metadata entry.
    pub description: String,
}

/// Result of a successful payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// The payment request that was paid.
    pub payment_request: String,
    /// Amount paid, in millisatoshi, excluding fees.
    pub amount_msat: u64,
    /// Proof of payment.
    pub preimage: Preimage,
    /// The `text/plain` description the payment committed to.
    pub description: String,
}

/// Client for resolving and paying LNURL-pay targets.
#[derive(Debug, Clone)]
pub struct Resolver<T, B> {
    transport: T,
    backend: B,
    allow_insecure: bool,
}

impl<T: Transport, B: LightningBackend> Resolver<T, B> {
    /// Creates a resolver that requires `https`.
    #[must_use]
    pub const fn new(transport: T, backend: B) -> Self {
        Self {
            transport,
            backend,
            allow_insecure: false,
        }
    }

    /// Allows plain `http` service URLs.
    #[must_use]
    pub const fn allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    /// Parses and resolves `target` without touching the network.
    ///
    /// # Errors
    ///
    /// See [`Target::parse`] and [`Target::to_url`].
    pub fn resolve_url(&self, target: &str) -> Result<Url, ResolveError> {
        Target::parse(target)?.to_url(self.allow_insecure)
    }

    /// Resolves `target` and fetches its pay parameters.
    ///
    /// # Errors
    ///
    /// Returns input errors before any request, [`ResolveError::Transport`]
    /// if the request fails, and a protocol error if the parameters carry
    /// invalid bounds or no `text/plain` entry.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub async fn fetch_offer(&self, target: &str) -> Result<PayOffer, ResolveError> {
        let url = self.resolve_url(target)?;
        let params = self
            .transport
            .fetch_pay_params(&url)
            .await
            .map_err(ResolveError::Transport)?;

        let range = SendableRange::new(params.min_sendable, params.max_sendable).ok_or(
            ResolveError::InvalidBounds {
                min: params.min_sendable,
                max: params.max_sendable,
            },
        )?;
        let description = text_plain(&params.metadata).ok_or(ResolveError::MissingTextPlain)?;

        Ok(PayOffer {
            params,
            range,
            description,
        })
    }

    /// Redeems `offer` for `amount` and pays the result, spending at most
    /// `max_fee_msat` in routing fees.
    ///
    /// Out-of-range amounts are passed to `strategy` until it returns an
    /// amount within range or cancels.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if the strategy gives up,
    /// [`ResolveError::HashMismatch`] if the payment request does not commit
    /// to the offer's metadata, and transport or backend errors otherwise.
    /// No payment is attempted after any error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(skip(self, offer, strategy), err, fields(callback = %offer.params.callback))
    )]
    pub async fn pay_offer(
        &self,
        offer: &PayOffer,
        amount: u64,
        max_fee_msat: u64,
        strategy: &mut (dyn AmountStrategy + Send),
    ) -> Result<Payment, ResolveError> {
        let amount = choose_amount(offer.range, amount, strategy)?;
        let callback = callback_url(&offer.params.callback, amount)?;

        let invoice = self
            .transport
            .fetch_invoice(&callback)
            .await
            .map_err(ResolveError::Transport)?;

        let expected = description_hash(&offer.params.metadata);
        let found = self
            .backend
            .description_hash(&invoice.pr)?
            .ok_or(ResolveError::MissingDescriptionHash)?;
        if found != expected {
            return Err(ResolveError::HashMismatch {
                expected: hex::encode(expected),
                found: hex::encode(found),
            });
        }

        let preimage = self.backend.pay_invoice(&invoice.pr, max_fee_msat).await?;

        #[cfg(feature = "telemetry")]
        tracing::info!(amount_msat = amount, preimage = %preimage, "LNURL-pay settled");

        Ok(Payment {
            payment_request: invoice.pr,
            amount_msat: amount,
            preimage,
            description: offer.description.clone(),
        })
    }

    /// Runs the whole flow: resolve, fetch, choose amount, redeem, verify, pay.
    ///
    /// # Errors
    ///
    /// See [`Resolver::fetch_offer`] and [`Resolver::pay_offer`].
    pub async fn pay(
        &self,
        target: &str,
        amount: u64,
        max_fee_msat: u64,
        strategy: &mut (dyn AmountStrategy + Send),
    ) -> Result<Payment, ResolveError> {
        let offer = self.fetch_offer(target).await?;
        self.pay_offer(&offer, amount, max_fee_msat, strategy).await
    }
}

/// Returns `amount` if within `range`, otherwise asks `strategy` until it
/// proposes an amount within range.
///
/// # Errors
///
/// Returns [`ResolveError::Cancelled`] if the strategy returns `None`.
pub fn choose_amount(
    range: SendableRange,
    amount: u64,
    strategy: &mut (dyn AmountStrategy + Send),
) -> Result<u64, ResolveError> {
    let mut amount = amount;
    while !range.contains(amount) {
        amount = strategy
            .choose(range, amount)
            .ok_or(ResolveError::Cancelled)?;
    }
    Ok(amount)
}

/// Appends `amount=<msat>` to a callback URL.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] if the callback does not parse.
pub fn callback_url(callback: &str, amount: u64) -> Result<Url, ResolveError> {
    let mut url = Url::parse(callback)?;
    url.query_pairs_mut()
        .append_pair("amount", &amount.to_string());
    Ok(url)
}
