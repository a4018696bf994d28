//! URL slugs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum slug length, in characters.
pub const SLUG_MAX_LENGTH: usize = 250;

/// A URL-safe identifier made of ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate `value` as a slug.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::validation("slug must not be empty"));
        }
        if value.chars().count() > SLUG_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "slug must be at most {SLUG_MAX_LENGTH} characters"
            )));
        }
        if let Some(bad) = value.chars().find(|c| !is_slug_char(*c)) {
            return Err(DomainError::Validation(format!(
                "slug may only contain letters, digits, '_' and '-' (found {bad:?})"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Propose a slug for `title`.
///
/// Lowercases, drops anything that is not an ASCII letter, digit, `_`, `-` or
/// whitespace, and joins the remaining words with single hyphens. Returns
/// `None` when nothing usable is left (e.g. a title made only of symbols).
pub fn slugify(title: &str) -> Option<Slug> {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        }
    }

    let trimmed: String = out
        .trim_matches(|c| c == '-' || c == '_')
        .chars()
        .take(SLUG_MAX_LENGTH)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');

    Slug::new(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_url_safe_alphabet() {
        let slug = Slug::new("hello_World-2024").unwrap();
        assert_eq!(slug.as_str(), "hello_World-2024");
    }

    #[test]
    fn rejects_spaces_and_punctuation() {
        assert!(Slug::new("hello world").is_err());
        assert!(Slug::new("hello/world").is_err());
        assert!(Slug::new("héllo").is_err());
    }

    #[test]
    fn rejects_empty_and_too_long() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("a".repeat(SLUG_MAX_LENGTH)).is_ok());
        assert!(Slug::new("a".repeat(SLUG_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Slug = serde_json::from_str("\"my-post\"").unwrap();
        assert_eq!(ok.as_str(), "my-post");
        assert!(serde_json::from_str::<Slug>("\"my post\"").is_err());
    }

    #[test]
    fn slugify_title() {
        assert_eq!(
            slugify("Who was Django Reinhardt?").unwrap().as_str(),
            "who-was-django-reinhardt"
        );
        assert_eq!(
            slugify("  Rust -- 2024   Edition ").unwrap().as_str(),
            "rust-2024-edition"
        );
        assert_eq!(slugify("snake_case title").unwrap().as_str(), "snake_case-title");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café au lait").unwrap().as_str(), "caf-au-lait");
        assert!(slugify("!!! ???").is_none());
    }

    #[test]
    fn slugify_truncates() {
        let title = "word ".repeat(100);
        let slug = slugify(&title).unwrap();
        assert!(slug.as_str().len() <= SLUG_MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }
}
