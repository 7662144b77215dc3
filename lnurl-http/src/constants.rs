//! HTTP-specific constants for the LNURL-pay transport.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("lnurl-http/", env!("CARGO_PKG_VERSION"));

/// Upper bound on response bodies read into memory.
pub const MAX_BODY_BYTES: usize = 1 << 20;
