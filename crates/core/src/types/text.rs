//! Free-text fields: titles and slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Title`] or [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The input is empty after trimming.
    #[error("{field} cannot be empty")]
    Empty {
        /// Field being parsed.
        field: &'static str,
    },
    /// The input is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field being parsed.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
    /// A slug contains something other than lowercase ASCII, digits, `-` or `_`.
    #[error("slug may only contain lowercase letters, digits, hyphens and underscores")]
    InvalidSlug,
}

/// Escape the characters HTML treats specially.
///
/// Stored titles are escaped, so filters compared against them must be too.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A display title for a category or menu item.
///
/// Input is trimmed and HTML-escaped before it is stored, so titles can be
/// rendered by any client without further sanitizing. The length limit
/// applies to the escaped form because that is what the column holds.
///
/// ```
/// use little_lemon_core::Title;
///
/// let title = Title::parse("  Mac & Cheese ").unwrap();
/// assert_eq!(title.as_str(), "Mac &amp; Cheese");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    /// Maximum stored length.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `Title`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or the escaped result is
    /// longer than 255 characters.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty { field: "title" });
        }

        let escaped = escape_html(trimmed);
        if escaped.chars().count() > Self::MAX_LENGTH {
            return Err(TextError::TooLong {
                field: "title",
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(escaped))
    }

    /// Returns the stored (escaped) title.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A URL-safe category identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 50
    /// characters, or contains anything but `[a-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TextError::Empty { field: "slug" });
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TextError::TooLong {
                field: "slug",
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(TextError::InvalidSlug);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_text_conversions {
    ($name:ident) => {
        impl TryFrom<String> for $name {
            type Error = TextError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl_pg_text!($name);
    };
}

impl_text_conversions!(Title);
impl_text_conversions!(Slug);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_title_trims_and_escapes() {
        let title = Title::parse(" <b>Greek</b> Salad ").unwrap();
        assert_eq!(title.as_str(), "&lt;b&gt;Greek&lt;/b&gt; Salad");
    }

    #[test]
    fn test_title_plain_text_unchanged() {
        assert_eq!(Title::parse("Beef Pasta").unwrap().as_str(), "Beef Pasta");
    }

    #[test]
    fn test_title_empty() {
        assert_eq!(
            Title::parse("  "),
            Err(TextError::Empty { field: "title" })
        );
    }

    #[test]
    fn test_title_length_counts_escaped_form() {
        assert!(Title::parse(&"a".repeat(255)).is_ok());
        assert!(Title::parse(&"&".repeat(60)).is_err());
    }

    #[test]
    fn test_slug() {
        assert_eq!(Slug::parse("main-course").unwrap().as_str(), "main-course");
        assert_eq!(Slug::parse("Main"), Err(TextError::InvalidSlug));
        assert_eq!(Slug::parse("a b"), Err(TextError::InvalidSlug));
        assert!(Slug::parse(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let slug: Slug = serde_json::from_str("\"drinks\"").unwrap();
        assert_eq!(slug.to_string(), "drinks");
        assert!(serde_json::from_str::<Title>("\"\"").is_err());
    }
}
