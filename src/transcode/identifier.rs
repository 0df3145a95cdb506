//! Recording identifier validation
//!
//! Identifiers arrive straight from a form field and end up in two
//! filesystem paths, so they are parsed into [`Identifier`] before any
//! path is built. A valid identifier is one or more `/`-separated segments
//! made of ASCII letters, digits, `_`, `-` and `.`, where no segment is
//! empty, `.` or `..`. Such an identifier can never leave the root it is
//! joined onto.

use std::fmt;
use std::str::FromStr;

/// Longest accepted identifier in bytes
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Separator between identifier segments
pub const SEPARATOR: char = '/';

/// Replacement for separators in the flattened identifier
pub const FLATTEN_CHAR: char = '-';

/// Reasons an identifier is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier is {len} bytes long (max {max})")]
    TooLong { len: usize, max: usize },
    #[error("identifier contains forbidden character {0:?}")]
    InvalidChar(char),
    #[error("identifier must be relative")]
    Absolute,
    #[error("identifier contains an empty segment")]
    EmptySegment,
    #[error("identifier contains a {0:?} segment")]
    DotSegment(String),
}

/// A validated recording identifier, e.g. `user2/Sentence_1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                len: raw.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        if let Some(c) = raw.chars().find(|c| !is_allowed_char(*c)) {
            return Err(IdentifierError::InvalidChar(c));
        }
        if raw.starts_with(SEPARATOR) {
            return Err(IdentifierError::Absolute);
        }
        for segment in raw.split(SEPARATOR) {
            match segment {
                "" => return Err(IdentifierError::EmptySegment),
                "." | ".." => return Err(IdentifierError::DotSegment(segment.to_string())),
                _ => {}
            }
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments in order; never empty
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Single filename component used for the output file
    pub fn flattened(&self) -> String {
        flatten(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace every path separator (`/` or `\`) with a hyphen
pub fn flatten(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { FLATTEN_CHAR } else { c })
        .collect()
}

const fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_nested_identifier() {
        let id = Identifier::parse("user2/Sentence_1").unwrap();
        assert_eq!(id.as_str(), "user2/Sentence_1");
        assert_eq!(id.segments().collect::<Vec<_>>(), vec!["user2", "Sentence_1"]);
        assert_eq!(id.flattened(), "user2-Sentence_1");
    }

    #[test]
    fn test_flat_identifier_unchanged() {
        let id: Identifier = "take-3.v2".parse().unwrap();
        assert_eq!(id.flattened(), "take-3.v2");
    }

    #[test]
    fn test_flatten_replaces_both_separators() {
        assert_eq!(flatten("a/b\\c/d"), "a-b-c-d");
        assert!(!flatten("x/y/z").contains('/'));
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(
            Identifier::parse("../etc/passwd"),
            Err(IdentifierError::DotSegment("..".to_string()))
        );
        assert_eq!(
            Identifier::parse("a/../../b"),
            Err(IdentifierError::DotSegment("..".to_string()))
        );
        assert_eq!(
            Identifier::parse("./a"),
            Err(IdentifierError::DotSegment(".".to_string()))
        );
        assert_eq!(Identifier::parse("/etc/passwd"), Err(IdentifierError::Absolute));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Identifier::parse(""), Err(IdentifierError::Empty));
        assert_eq!(Identifier::parse("a//b"), Err(IdentifierError::EmptySegment));
        assert_eq!(Identifier::parse("a/"), Err(IdentifierError::EmptySegment));
        assert_eq!(Identifier::parse("a b"), Err(IdentifierError::InvalidChar(' ')));
        assert_eq!(Identifier::parse("a\\b"), Err(IdentifierError::InvalidChar('\\')));
        assert_eq!(Identifier::parse("a;rm"), Err(IdentifierError::InvalidChar(';')));
        assert_eq!(Identifier::parse("ü"), Err(IdentifierError::InvalidChar('ü')));
    }

    #[test]
    fn test_length_limit() {
        let ok = "a".repeat(MAX_IDENTIFIER_LEN);
        assert!(Identifier::parse(&ok).is_ok());

        let long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert_eq!(
            Identifier::parse(&long),
            Err(IdentifierError::TooLong {
                len: MAX_IDENTIFIER_LEN + 1,
                max: MAX_IDENTIFIER_LEN
            })
        );
    }

    #[test]
    fn test_dots_inside_segment_allowed() {
        assert!(Identifier::parse("a..b/c.").is_ok());
        assert!(Identifier::parse("...").is_ok());
    }
}
