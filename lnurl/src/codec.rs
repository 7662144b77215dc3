//! Bech32 text codec for LNURL tokens.
//!
//! An LNURL is a URL encoded as bech32 with the human-readable part `lnurl`.
//! Unlike segwit addresses, LNURL tokens carry arbitrary byte payloads and are
//! routinely longer than the 90 characters allowed by BIP-173, so this codec
//! applies its own, larger, [`MAX_TOKEN_LENGTH`].
//!
//! Tokens are case-insensitive on the wire but must not mix cases. Encoders
//! emit the canonical upper-case form, which packs better into QR codes.
//!
//! # Example
//!
//! ```rust
//! use lnurl::codec::{decode_url, encode_url};
//!
//! let token = encode_url("https://x.io/pay").unwrap();
//! assert_eq!(token, "LNURL1DP68GURN8GHJ77PWD9HJ7URP0YXN9R67");
//! assert_eq!(decode_url(&token).unwrap(), "https://x.io/pay");
//! ```

/// Human-readable part of every LNURL token.
pub const LNURL_HRP: &str = "lnurl";

/// Maximum accepted token length, in characters.
///
/// Large enough for a 4 KiB payload.
pub const MAX_TOKEN_LENGTH: usize = 8192;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const SEPARATOR: char = '1';
const CHECKSUM_LENGTH: usize = 6;
const GENERATOR: [u32; 5] = [
    0x3b6a_57b2,
    0x2650_8e6d,
    0x1ea1_19fa,
    0x3d42_33dd,
    0x2a14_62b3,
];

/// Errors produced while encoding or decoding bech32 tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The token contains both upper-case and lower-case characters.
    #[error("token mixes upper and lower case")]
    MixedCase,
    /// The token exceeds [`MAX_TOKEN_LENGTH`].
    #[error("token length {length} exceeds maximum of {max}")]
    TooLong {
        /// Length of the rejected token.
        length: usize,
        /// Maximum permitted length.
        max: usize,
    },
    /// No `1` separator between the human-readable part and the data.
    #[error("missing separator between human-readable part and data")]
    MissingSeparator,
    /// The data part is shorter than the checksum.
    #[error("data part is too short to hold a checksum")]
    TooShort,
    /// The human-readable part is empty or contains characters outside `!`..=`~`.
    #[error("invalid human-readable part")]
    InvalidHrp,
    /// A data character is not part of the bech32 alphabet.
    #[error("invalid character {0:?} in data part")]
    InvalidChar(char),
    /// The checksum does not validate.
    #[error("invalid checksum")]
    InvalidChecksum,
    /// A value does not fit the source group width during bit repacking.
    #[error("value {0} out of range for bit conversion")]
    InvalidData(u8),
    /// Leftover padding bits are non-zero or span a whole group.
    #[error("invalid padding in data part")]
    InvalidPadding,
    /// The human-readable part is not the one expected by the caller.
    #[error("unexpected human-readable part: expected '{expected}', got '{found}'")]
    UnexpectedHrp {
        /// The expected human-readable part.
        expected: &'static str,
        /// The human-readable part found in the token.
        found: String,
    },
    /// The decoded payload is not valid UTF-8.
    #[error("decoded payload is not valid UTF-8")]
    InvalidUtf8,
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut expanded = Vec::with_capacity(bytes.len() * 2 + 1);
    expanded.extend(bytes.iter().map(|b| b >> 5));
    expanded.push(0);
    expanded.extend(bytes.iter().map(|b| b & 0x1f));
    expanded
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let values = hrp_expand(hrp)
        .into_iter()
        .chain(data.iter().copied())
        .chain([0; CHECKSUM_LENGTH]);
    let modulus = polymod(values) ^ 1;
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (i, slot) in checksum.iter_mut().enumerate() {
        #[allow(clippy::cast_possible_truncation)] // masked to 5 bits
        {
            *slot = ((modulus >> (5 * (5 - i))) & 0x1f) as u8;
        }
    }
    checksum
}

fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    polymod(hrp_expand(hrp).into_iter().chain(data.iter().copied())) == 1
}

fn is_valid_hrp(hrp: &str) -> bool {
    !hrp.is_empty() && hrp.bytes().all(|b| (33..=126).contains(&b))
}

fn charset_index(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)] // alphabet has 32 entries
    CHARSET
        .iter()
        .position(|&b| char::from(b) == c)
        .map(|i| i as u8)
}

/// Regroups a sequence of `from`-bit values into `to`-bit values, most
/// significant bit first.
///
/// With `pad` set, a trailing partial group is zero-padded. Without it, the
/// trailing bits must be fewer than `from` and all zero.
///
/// # Errors
///
/// Returns [`CodecError::InvalidData`] if an input value does not fit in
/// `from` bits, and [`CodecError::InvalidPadding`] if `pad` is unset and the
/// trailing bits are inconsistent.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, CodecError> {
    let max_value: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        let v = u32::from(value);
        if v >> from != 0 {
            return Err(CodecError::InvalidData(value));
        }
        acc = ((acc << from) | v) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            #[allow(clippy::cast_possible_truncation)] // masked to `to` bits
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            #[allow(clippy::cast_possible_truncation)]
            out.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return Err(CodecError::InvalidPadding);
    }

    Ok(out)
}

/// Encodes `payload` as a lower-case bech32 string with the given
/// human-readable part.
///
/// # Errors
///
/// Returns [`CodecError::InvalidHrp`] if `hrp` is not a valid human-readable
/// part, or [`CodecError::TooLong`] if the resulting token would exceed
/// [`MAX_TOKEN_LENGTH`].
pub fn encode(hrp: &str, payload: &[u8]) -> Result<String, CodecError> {
    if !is_valid_hrp(hrp) {
        return Err(CodecError::InvalidHrp);
    }
    let hrp = hrp.to_ascii_lowercase();
    let data = convert_bits(payload, 8, 5, true)?;

    let length = hrp.len() + 1 + data.len() + CHECKSUM_LENGTH;
    if length > MAX_TOKEN_LENGTH {
        return Err(CodecError::TooLong {
            length,
            max: MAX_TOKEN_LENGTH,
        });
    }

    let checksum = create_checksum(&hrp, &data);
    let mut token = String::with_capacity(length);
    token.push_str(&hrp);
    token.push(SEPARATOR);
    token.extend(
        data.iter()
            .chain(checksum.iter())
            .map(|&v| char::from(CHARSET[usize::from(v)])),
    );
    Ok(token)
}

/// Decodes a bech32 token into its human-readable part and payload bytes.
///
/// The human-readable part is returned in lower case.
///
/// # Errors
///
/// Returns a [`CodecError`] if the token mixes cases, is too long, lacks a
/// separator, contains characters outside the alphabet, fails the checksum,
/// or has inconsistent padding.
pub fn decode(token: &str) -> Result<(String, Vec<u8>), CodecError> {
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(CodecError::TooLong {
            length: token.len(),
            max: MAX_TOKEN_LENGTH,
        });
    }
    let has_lower = token.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = token.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(CodecError::MixedCase);
    }

    let token = token.to_ascii_lowercase();
    let separator = token.rfind(SEPARATOR).ok_or(CodecError::MissingSeparator)?;
    let (hrp, data) = (&token[..separator], &token[separator + 1..]);
    if !is_valid_hrp(hrp) {
        return Err(CodecError::InvalidHrp);
    }
    if data.len() < CHECKSUM_LENGTH {
        return Err(CodecError::TooShort);
    }

    let values = data
        .chars()
        .map(|c| charset_index(c).ok_or(CodecError::InvalidChar(c)))
        .collect::<Result<Vec<u8>, _>>()?;
    if !verify_checksum(hrp, &values) {
        return Err(CodecError::InvalidChecksum);
    }

    let payload = convert_bits(&values[..values.len() - CHECKSUM_LENGTH], 5, 8, false)?;
    Ok((hrp.to_owned(), payload))
}

/// Encodes a URL as an upper-case LNURL token.
///
/// # Errors
///
/// Returns [`CodecError::TooLong`] if the URL is too long to encode.
pub fn encode_url(url: &str) -> Result<String, CodecError> {
    encode(LNURL_HRP, url.as_bytes()).map(|token| token.to_ascii_uppercase())
}

/// Decodes an LNURL token back into the URL it carries.
///
/// # Errors
///
/// Returns a [`CodecError`] if the token does not decode, its human-readable
/// part is not `lnurl`, or the payload is not UTF-8.
pub fn decode_url(token: &str) -> Result<String, CodecError> {
    let (hrp, payload) = decode(token)?;
    if hrp != LNURL_HRP {
        return Err(CodecError::UnexpectedHrp {
            expected: LNURL_HRP,
            found: hrp,
        });
    }
    String::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_TOKEN: &str = "LNURL1DP68GURN8GHJ7UM9WFMXJCM99E3K7MF0V9CXJ0M385EKVCENXC6R2C35XVUKXEFCV5MKVV34X5EKZD3EV56NYD3HXQURZEPEXEJXXEPNXSCRVWFNV9NXZCN9XQ6XYEFHVGCXXCMYXYMNSERXFQ5FNS";
    const SERVICE_URL: &str =
        "https://service.com/api?q=3fc3645b439ce8e7f2553a69e5267081d96dcd340693afabe04be7b0ccd178df";

    #[test]
    fn test_decode_reference_token() {
        assert_eq!(decode_url(SERVICE_TOKEN).unwrap(), SERVICE_URL);
    }

    #[test]
    fn test_encode_reference_url() {
        assert_eq!(encode_url(SERVICE_URL).unwrap(), SERVICE_TOKEN);
    }

    #[test]
    fn test_encode_local_pay_url() {
        assert_eq!(
            encode_url("http://localhost:8080/pay").unwrap(),
            "LNURL1DP68GUP69UHKCMMRV9KXSMMNWSARSVPCXQHHQCTEFQQ9R0"
        );
    }

    #[test]
    fn test_empty_payload_is_checksum_only() {
        let token = encode_url("").unwrap();
        assert_eq!(token, "LNURL13MYVSU");
        let (hrp, payload) = decode(&token).unwrap();
        assert_eq!(hrp, LNURL_HRP);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_roundtrip_payload_lengths() {
        for len in [0usize, 1, 2, 3, 4, 5, 7, 31, 64, 255, 1000, 4096] {
            #[allow(clippy::cast_possible_truncation)]
            let payload: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let token = encode(LNURL_HRP, &payload).unwrap();
            let (hrp, decoded) = decode(&token).unwrap();
            assert_eq!(hrp, LNURL_HRP);
            assert_eq!(decoded, payload, "payload of length {len}");
        }
    }

    #[test]
    fn test_upper_and_lower_decode_identically() {
        let lower = SERVICE_TOKEN.to_ascii_lowercase();
        assert_eq!(decode(SERVICE_TOKEN).unwrap(), decode(&lower).unwrap());
    }

    #[test]
    fn test_mixed_case_rejected() {
        let mut mixed = SERVICE_TOKEN.to_owned();
        mixed.replace_range(0..1, "l");
        assert_eq!(decode(&mixed), Err(CodecError::MixedCase));
    }

    #[test]
    fn test_single_character_flip_rejected() {
        let token = encode_url("https://x.io/pay").unwrap().to_ascii_lowercase();
        let separator = token.rfind('1').unwrap();
        for (i, original) in token.char_indices() {
            if i == separator {
                continue;
            }
            let replacement = if i < separator {
                if original == 'a' { 'b' } else { 'a' }
            } else if original == 'q' {
                'p'
            } else {
                'q'
            };
            let mut flipped = token.clone();
            flipped.replace_range(i..=i, &replacement.to_string());
            assert!(decode(&flipped).is_err(), "flip at {i} was accepted");
        }
    }

    #[test]
    fn test_too_long_rejected() {
        let token = format!("lnurl1{}", "q".repeat(MAX_TOKEN_LENGTH));
        assert!(matches!(decode(&token), Err(CodecError::TooLong { .. })));
    }

    #[test]
    fn test_invalid_character_rejected() {
        // 'b' is not part of the bech32 alphabet.
        let token = "lnurl1dp68gurn8ghj77pwd9hj7urp0yxn9r6b";
        assert_eq!(decode(token), Err(CodecError::InvalidChar('b')));
    }

    #[test]
    fn test_missing_separator_rejected() {
        assert_eq!(decode("lnurlqpzry9x8"), Err(CodecError::MissingSeparator));
    }

    #[test]
    fn test_short_data_rejected() {
        assert_eq!(decode("lnurl1qpzry"), Err(CodecError::TooShort));
    }

    #[test]
    fn test_unexpected_hrp_rejected() {
        let token = encode("lnbc", b"https://x.io/pay").unwrap();
        assert!(matches!(
            decode_url(&token),
            Err(CodecError::UnexpectedHrp { expected: "lnurl", .. })
        ));
    }

    #[test]
    fn test_non_zero_padding_rejected() {
        // A single 5-bit group carries no full byte and must be all zero.
        assert_eq!(convert_bits(&[1], 5, 8, false), Err(CodecError::InvalidPadding));
        assert_eq!(convert_bits(&[0], 5, 8, false), Ok(vec![]));
    }

    #[test]
    fn test_excess_padding_rejected() {
        // Two zero groups are ten bits, more than a group's worth of padding.
        assert_eq!(convert_bits(&[0, 0], 5, 8, false), Err(CodecError::InvalidPadding));
    }

    #[test]
    fn test_out_of_range_group_rejected() {
        assert_eq!(convert_bits(&[32], 5, 8, false), Err(CodecError::InvalidData(32)));
    }
}
