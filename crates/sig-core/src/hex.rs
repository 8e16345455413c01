//! Textual hex representation of signature patterns.
//!
//! Patterns are entered and stored as whitespace-separated byte pairs, for
//! example `"25 50 44 46 2D"`. Each token must be exactly two hex digits;
//! digits are case-insensitive on input and upper-case on output.
//!
//! # Examples
//!
//! ```
//! use sig_core::hex::{format_pattern, parse_pattern};
//!
//! let bytes = parse_pattern("89 50 4e 47").unwrap();
//! assert_eq!(bytes, vec![0x89, 0x50, 0x4E, 0x47]);
//! assert_eq!(format_pattern(&bytes), "89 50 4E 47");
//! ```

use std::fmt::Write;

/// Errors produced when parsing a hex pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    /// The input contained no byte pairs.
    #[error("pattern is empty")]
    Empty,

    /// A token was not exactly two characters long.
    #[error("byte {position} ('{token}') must be exactly two hex digits")]
    OddGrouping {
        /// The offending token.
        token: String,
        /// 1-based position of the token in the input.
        position: usize,
    },

    /// A token contained a character outside `0-9a-fA-F`.
    #[error("byte {position} ('{token}') contains a non-hex character")]
    InvalidDigit {
        /// The offending token.
        token: String,
        /// 1-based position of the token in the input.
        position: usize,
    },
}

/// Parses a whitespace-separated hex pattern into bytes.
///
/// # Errors
///
/// Returns [`HexParseError::Empty`] for blank input,
/// [`HexParseError::OddGrouping`] when a token is not two characters, and
/// [`HexParseError::InvalidDigit`] when a token is not valid hex.
///
/// # Examples
///
/// ```
/// use sig_core::hex::{parse_pattern, HexParseError};
///
/// assert_eq!(parse_pattern("FF D8 FF").unwrap(), vec![0xFF, 0xD8, 0xFF]);
/// assert!(matches!(parse_pattern("zz 50"), Err(HexParseError::InvalidDigit { .. })));
/// ```
pub fn parse_pattern(text: &str) -> Result<Vec<u8>, HexParseError> {
    let mut bytes = Vec::new();

    for (index, token) in text.split_whitespace().enumerate() {
        let position = index + 1;

        if token.len() != 2 {
            return Err(HexParseError::OddGrouping {
                token: token.to_owned(),
                position,
            });
        }

        // from_str_radix accepts a leading '+', so check digits explicitly
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HexParseError::InvalidDigit {
                token: token.to_owned(),
                position,
            });
        }

        let byte = u8::from_str_radix(token, 16).map_err(|_| HexParseError::InvalidDigit {
            token: token.to_owned(),
            position,
        })?;
        bytes.push(byte);
    }

    if bytes.is_empty() {
        return Err(HexParseError::Empty);
    }

    Ok(bytes)
}

/// Formats bytes as upper-case hex pairs separated by single spaces.
///
/// An empty slice formats as an empty string.
#[must_use]
pub fn format_pattern(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Serde adapter storing a byte pattern as its hex text.
pub(crate) mod serde_pattern {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_pattern(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        // Empty patterns are representable in memory, so accept them here too
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        super::parse_pattern(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_signatures() {
        assert_eq!(
            parse_pattern("25 50 44 46 2D").unwrap(),
            vec![0x25, 0x50, 0x44, 0x46, 0x2D]
        );
        assert_eq!(
            parse_pattern("89 50 4E 47 0D 0A 1A 0A").unwrap(),
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[test]
    fn test_parse_lowercase_and_extra_whitespace() {
        assert_eq!(parse_pattern("  ff\td8  ff ").unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_parse_zero_bytes() {
        assert_eq!(parse_pattern("00 00 00").unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_parse_invalid_digit() {
        let err = parse_pattern("zz 50").unwrap_err();
        assert_eq!(
            err,
            HexParseError::InvalidDigit {
                token: "zz".to_owned(),
                position: 1,
            }
        );
    }

    #[test]
    fn test_parse_rejects_sign_prefix() {
        assert!(matches!(
            parse_pattern("50 +F"),
            Err(HexParseError::InvalidDigit { position: 2, .. })
        ));
    }

    #[test]
    fn test_parse_odd_grouping() {
        assert!(matches!(
            parse_pattern("255 0"),
            Err(HexParseError::OddGrouping { position: 1, .. })
        ));
        assert!(matches!(
            parse_pattern("25 5"),
            Err(HexParseError::OddGrouping { position: 2, .. })
        ));
        assert!(matches!(
            parse_pattern("2550"),
            Err(HexParseError::OddGrouping { .. })
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_pattern(""), Err(HexParseError::Empty));
        assert_eq!(parse_pattern("   "), Err(HexParseError::Empty));
    }

    #[test]
    fn test_format_pattern() {
        insta::assert_snapshot!(format_pattern(&[0x25, 0x50, 0x44, 0x46, 0x2D]), @"25 50 44 46 2D");
        assert_eq!(format_pattern(&[0x00, 0x0A, 0xFF]), "00 0A FF");
        assert_eq!(format_pattern(&[]), "");
    }

    #[test]
    fn test_format_then_parse_every_byte() {
        let all: Vec<u8> = (0..=u8::MAX).collect();
        assert_eq!(parse_pattern(&format_pattern(&all)).unwrap(), all);
    }

    #[test]
    fn test_error_display() {
        let err = parse_pattern("25 5").unwrap_err();
        assert_eq!(err.to_string(), "byte 2 ('5') must be exactly two hex digits");
    }
}
