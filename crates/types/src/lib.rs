//! Validated primitive types shared across the rxform crates.
//!
//! Form parameters and posted values arrive as raw strings. The types here are the point at
//! which those strings become trusted values: once constructed they are known to be well formed.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when parsing catalog identifiers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("identifier must be a positive integer, got '{0}'")]
    NotNumeric(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None`.
    ///
    /// Posted form values use the empty string for "nothing entered".
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_numeric_id(input: &str) -> Result<u32, IdError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| IdError::NotNumeric(trimmed.to_string()))
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_numeric_id(s).map(Self)
            }
        }
    };
}

numeric_id!(
    /// Catalog identifier of a drug (a concrete formulation, e.g. "Aspirin 325mg tablet").
    DrugId
);

numeric_id!(
    /// Catalog identifier of a concept (the clinical meaning a drug or answer refers to).
    ConceptId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Take with food ").expect("valid text");
        assert_eq!(text.as_str(), "Take with food");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
        assert!(NonEmptyText::optional("").is_none());
    }

    #[test]
    fn drug_id_parses_trimmed_integer() {
        let id: DrugId = " 42 ".parse().expect("numeric id");
        assert_eq!(id, DrugId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn drug_id_rejects_non_numeric_input() {
        assert_eq!(
            "aspirin".parse::<DrugId>(),
            Err(IdError::NotNumeric("aspirin".into()))
        );
        assert_eq!("".parse::<ConceptId>(), Err(IdError::Empty));
        assert!("-3".parse::<ConceptId>().is_err());
    }

    #[test]
    fn ids_serialise_as_plain_numbers() {
        let json = serde_json::to_string(&ConceptId::new(1107)).expect("serialise");
        assert_eq!(json, "1107");
        let back: ConceptId = serde_json::from_str("1107").expect("deserialise");
        assert_eq!(back.get(), 1107);
    }
}
