//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("username may only contain letters, digits and @/./+/-/_ (found {found:?})")]
    InvalidCharacter {
        /// The first offending character.
        found: char,
    },
}

/// A login name.
///
/// ## Constraints
///
/// - Length: 1-150 characters
/// - Letters, digits and `@ . + - _` only (so no whitespace or markup)
///
/// ## Examples
///
/// ```
/// use little_lemon_core::Username;
///
/// assert!(Username::parse("Bo_Peep").is_ok());
/// assert!(Username::parse("rex@toybox.example").is_ok());
///
/// assert!(Username::parse("").is_err());
/// assert!(Username::parse("two words").is_err());
/// assert!(Username::parse("<script>").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 150;

    /// Parse a `Username` from a string. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 150
    /// characters, or contains a character outside the allowed set.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(found) = s
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
        {
            return Err(UsernameError::InvalidCharacter { found });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl_pg_text!(Username);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_usernames() {
        assert!(Username::parse("Woody").is_ok());
        assert!(Username::parse("Bo_Peep").is_ok());
        assert!(Username::parse("first.last+tag@example.com").is_ok());
        assert!(Username::parse("crew-7").is_ok());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let name = Username::parse("  Buzz ").unwrap();
        assert_eq!(name.as_str(), "Buzz");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
        assert_eq!(Username::parse("   "), Err(UsernameError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(151);
        assert!(matches!(
            Username::parse(&long),
            Err(UsernameError::TooLong { max: 150 })
        ));
        assert!(Username::parse(&"a".repeat(150)).is_ok());
    }

    #[test]
    fn test_parse_rejects_markup() {
        assert_eq!(
            Username::parse("<b>rex</b>"),
            Err(UsernameError::InvalidCharacter { found: '<' })
        );
        assert!(Username::parse("two words").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let name: Username = serde_json::from_str("\"Slinky\"").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Slinky\"");
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
    }
}
