//! Cart line key type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`LineKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineKeyError {
    /// The input string is empty or whitespace.
    #[error("line key cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("line key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a control character.
    #[error("line key cannot contain control characters")]
    ControlCharacter,
}

/// Identity of a distinct cart line.
///
/// A line key usually equals the product id, but differs when the same
/// product is in the cart more than once as different variants. Removal and
/// quantity updates address lines by key, never by product.
///
/// ## Examples
///
/// ```
/// use cruzy_core::LineKey;
///
/// assert!(LineKey::parse("12").is_ok());
/// assert!(LineKey::parse("12:grind=espresso").is_ok());
///
/// assert!(LineKey::parse("").is_err());
/// assert!(LineKey::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct LineKey(String);

impl LineKey {
    /// Maximum length of a line key.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `LineKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, longer than 255 characters, or
    /// contains control characters.
    pub fn parse(s: &str) -> Result<Self, LineKeyError> {
        if s.trim().is_empty() {
            return Err(LineKeyError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(LineKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_control) {
            return Err(LineKeyError::ControlCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the line key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `LineKey` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LineKey {
    type Err = LineKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LineKey {
    type Error = LineKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LineKey> for String {
    fn from(key: LineKey) -> Self {
        key.0
    }
}

impl From<crate::ProductId> for LineKey {
    fn from(id: crate::ProductId) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for LineKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
