//! Internal implementation of UUID services.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Canonical drug order identifier (hyphenated, lowercase).
///
/// Once constructed, the contained UUID is known to render in canonical form.
///
/// # Construction
/// - [`UuidService::new`] generates a fresh identifier for a newly created order.
/// - [`UuidService::parse`] validates an externally supplied identifier (for example, an order
///   loaded from the existing-order store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new random (v4) order identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other UUID spellings (uppercase, braces, simple form).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 36 lowercase hex characters with hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("{input}: {e}")))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical hyphenated lowercase form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for UuidService {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UuidService::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UuidService {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UuidService {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UuidService::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns true if `token` has the shape of a UUID: five non-empty blocks of word characters
/// (`[A-Za-z0-9_]`) separated by hyphens.
///
/// Looser than [`UuidService::is_canonical`]: catalog identifiers such as
/// `3cccecdc-26fe-102b-80cb-0017a47871b2AAAAA` are still resolved by UUID, never by name.
pub fn looks_like_uuid(token: &str) -> bool {
    let mut blocks = 0usize;
    for block in token.split('-') {
        blocks += 1;
        if block.is_empty() || !block.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return false;
        }
    }
    blocks == 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_uuid() {
        let id = UuidService::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 36);
        assert!(UuidService::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "550e8400-e29b-41d4-a716-446655440000";
        let parsed = UuidService::parse(canonical).expect("canonical uuid");

        assert_eq!(parsed.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_simple_form() {
        let result = UuidService::parse("550e8400e29b41d4a716446655440000");

        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("36 lowercase hex characters"));
            }
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_uuid() {
        assert!(UuidService::parse("550E8400-E29B-41D4-A716-446655440000").is_err());
    }

    #[test]
    fn test_looks_like_uuid_accepts_five_word_blocks() {
        assert!(looks_like_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(looks_like_uuid("a-b-c-d-e"));
        assert!(looks_like_uuid("3cccecdc-26fe-102b-80cb-0017a47871b2AAAAA"));
        assert!(looks_like_uuid("drug_1-x-y-z-w"));
    }

    #[test]
    fn test_looks_like_uuid_rejects_names_and_ids() {
        assert!(!looks_like_uuid("Aspirin"));
        assert!(!looks_like_uuid("42"));
        assert!(!looks_like_uuid("co-trimoxazole"));
        assert!(!looks_like_uuid("a-b-c-d"));
        assert!(!looks_like_uuid("a-b-c-d-e-f"));
        assert!(!looks_like_uuid("a-b--d-e"));
        assert!(!looks_like_uuid("a-b-c d-e-f"));
    }

    #[test]
    fn test_serde_round_trip_uses_hyphenated_form() {
        let id = UuidService::parse("550e8400-e29b-41d4-a716-446655440000").expect("valid");
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");

        let err = serde_json::from_str::<UuidService>("\"not-a-uuid\"");
        assert!(err.is_err());
    }
}
