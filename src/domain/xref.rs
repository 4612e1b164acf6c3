use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Serialize, Serializer};

/// A cross-reference identifier linking records.
///
/// In a file these appear as `@I123@`. The stored form drops the `@`
/// delimiters and any spaces and is lowercased, so `@I123@` becomes `i123`.
///
/// Identifiers order naturally: by their leading alphabetic prefix, then by
/// the number that follows it, so `i2` sorts before `i10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xref(NonEmptyString);

/// Error returned when a cross-reference token holds no identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The token was empty once delimiters and whitespace were removed.
    #[error("cross-reference '{0}' has no identifier")]
    Empty(String),
}

impl Xref {
    /// Extracts an identifier from a cross-reference token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if nothing remains after removing the `@`
    /// delimiters and whitespace.
    pub fn new(token: &str) -> Result<Self, Error> {
        let id: String = token
            .chars()
            .filter(|c| *c != '@' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        NonEmptyString::new(id)
            .map(Self)
            .map_err(|_| Error::Empty(token.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The leading non-numeric part of the identifier (`i` for `i123`).
    #[must_use]
    pub fn prefix(&self) -> &str {
        let end = self
            .as_str()
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.as_str().len());
        &self.as_str()[..end]
    }

    /// The first run of digits in the identifier, as an integer.
    ///
    /// Returns `None` if the identifier has no digits or the number does not
    /// fit in a `u64`.
    #[must_use]
    pub fn number(&self) -> Option<u64> {
        let rest = &self.as_str()[self.prefix().len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    }

    /// Renders the identifier in file form, `@I123@`.
    #[must_use]
    pub fn to_token(&self) -> String {
        format!("@{}@", self.as_str().to_uppercase())
    }
}

impl Ord for Xref {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix()
            .cmp(other.prefix())
            .then_with(|| self.number().cmp(&other.number()))
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl PartialOrd for Xref {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Xref {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<&str> for Xref {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Xref {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Xref {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Xref {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Xref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
