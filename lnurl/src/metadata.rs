//! LNURL-pay metadata.
//!
//! Metadata is an ordered list of `[contentType, value]` pairs, transmitted as
//! a pre-serialized JSON string. The string itself, byte for byte, is what the
//! payment request's description hash commits to, so it is never
//! re-serialized between issuance and verification.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Content type of the mandatory plain-text entry.
pub const TEXT_PLAIN: &str = "text/plain";

/// Content type of the internet-identifier entry.
pub const TEXT_IDENTIFIER: &str = "text/identifier";

/// Builder for metadata strings issued by the service.
///
/// # Example
///
/// ```rust
/// use lnurl::metadata::Metadata;
///
/// let metadata = Metadata::new("abc123").with_identifier("alice@example.com");
/// assert_eq!(
///     metadata.to_json(),
///     r#"[["text/plain","abc123"],["text/identifier","alice@example.com"]]"#,
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates metadata holding a single `text/plain` entry.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            entries: vec![(TEXT_PLAIN.to_owned(), text.into())],
        }
    }

    /// Appends a `text/identifier` entry.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.entries
            .push((TEXT_IDENTIFIER.to_owned(), identifier.into()));
        self
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Serializes the entries into the compact JSON form sent on the wire.
    #[must_use]
    pub fn to_json(&self) -> String {
        // A list of string pairs always serializes.
        serde_json::to_string(&self.entries).unwrap_or_default()
    }
}

/// Returns the value of the first `text/plain` entry of a metadata string.
///
/// Entries with other content types, or with non-string values, are skipped.
/// Returns `None` if the string is not a JSON array of entries or holds no
/// `text/plain` entry.
#[must_use]
pub fn text_plain(metadata: &str) -> Option<String> {
    let entries: Vec<Vec<Value>> = serde_json::from_str(metadata).ok()?;
    entries.into_iter().find_map(|entry| match entry.as_slice() {
        [Value::String(kind), Value::String(text), ..] if kind == TEXT_PLAIN => Some(text.clone()),
        _ => None,
    })
}

/// Computes the description hash of a metadata string: SHA-256 over its exact bytes.
#[must_use]
pub fn description_hash(metadata: &str) -> [u8; 32] {
    Sha256::digest(metadata.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_metadata_serialization() {
        assert_eq!(Metadata::new("abc123").to_json(), r#"[["text/plain","abc123"]]"#);
    }

    #[test]
    fn test_description_hash_of_plain_metadata() {
        assert_eq!(
            hex::encode(description_hash(r#"[["text/plain","abc123"]]"#)),
            "be3d7cbc84a0bde08240e1fb716b80e931cac2b2b9ce590a411981ce1fe20c43"
        );
    }

    #[test]
    fn test_description_hash_covers_identifier_entry() {
        let metadata = Metadata::new("abc123").with_identifier("alice@example.com");
        assert_eq!(
            hex::encode(description_hash(&metadata.to_json())),
            "a2d2d4163ef7080990f07ac6548f82dcf46de7f0c7d511ce1e6a5a00670cafde"
        );
    }

    #[test]
    fn test_html_escaping_changes_hash() {
        let exact = r#"[["text/plain","fish & chips"]]"#;
        let escaped = r#"[["text/plain","fish &amp; chips"]]"#;
        assert_ne!(description_hash(exact), description_hash(escaped));
    }

    #[test]
    fn test_text_plain_lookup() {
        let metadata = r#"[["image/png;base64","iVBO"],["text/plain","coffee"]]"#;
        assert_eq!(text_plain(metadata).as_deref(), Some("coffee"));
        assert_eq!(text_plain(r#"[["text/identifier","a@b.c"]]"#), None);
        assert_eq!(text_plain("not json"), None);
    }
}
