//! Signature records: the entries of the catalog.

use serde::{Deserialize, Serialize};

use crate::hex;

/// A named byte pattern identifying a file type by its leading bytes.
///
/// Records are immutable once constructed. No validation is performed:
/// empty names, patterns, and extensions are all accepted. An empty pattern
/// is a vacuous prefix and matches every readable regular file.
///
/// The extension is a free-form label; it is never checked against the
/// pattern or against the names of matched files.
///
/// # Serialization
///
/// The pattern serializes as hex text (`"25 50 44 46 2D"`), which keeps the
/// persisted catalog readable and lossless for every byte value.
///
/// # Examples
///
/// ```
/// use sig_core::SignatureRecord;
///
/// let pdf = SignatureRecord::new("PDF Document", vec![0x25, 0x50, 0x44, 0x46, 0x2D], "pdf");
/// assert_eq!(pdf.name(), "PDF Document");
/// assert_eq!(pdf.pattern_len(), 5);
/// assert_eq!(pdf.pattern_hex(), "25 50 44 46 2D");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureRecord {
    name: String,
    #[serde(with = "hex::serde_pattern")]
    pattern: Vec<u8>,
    extension: String,
}

impl SignatureRecord {
    /// Creates a new signature record.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<Vec<u8>>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            extension: extension.into(),
        }
    }

    /// Returns the human-readable name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the byte pattern compared against file prefixes.
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Returns the associated extension label.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the number of bytes read from each candidate file.
    #[inline]
    #[must_use]
    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Returns the pattern as space-separated upper-case hex.
    #[must_use]
    pub fn pattern_hex(&self) -> String {
        hex::format_pattern(&self.pattern)
    }

    /// Returns `true` if `prefix` equals the pattern byte-for-byte.
    ///
    /// Callers pass exactly [`pattern_len`](Self::pattern_len) bytes read
    /// from the start of a file; a shorter slice never matches.
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, prefix: &[u8]) -> bool {
        prefix.starts_with(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let sig = SignatureRecord::new("ZIP Archive", vec![0x50, 0x4B, 0x03, 0x04], "zip");
        assert_eq!(sig.name(), "ZIP Archive");
        assert_eq!(sig.pattern(), &[0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(sig.extension(), "zip");
        assert_eq!(sig.pattern_len(), 4);
    }

    #[test]
    fn test_no_validation() {
        let sig = SignatureRecord::new("", Vec::new(), "");
        assert!(sig.name().is_empty());
        assert_eq!(sig.pattern_len(), 0);
        assert!(sig.is_prefix_of(b"anything"));
    }

    #[test]
    fn test_is_prefix_of() {
        let sig = SignatureRecord::new("JPEG", vec![0xFF, 0xD8, 0xFF], "jpg");
        assert!(sig.is_prefix_of(&[0xFF, 0xD8, 0xFF]));
        assert!(sig.is_prefix_of(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!sig.is_prefix_of(&[0xFF, 0xD8]));
        assert!(!sig.is_prefix_of(&[0xFF, 0xD8, 0xFE]));
    }

    #[test]
    fn test_serialization_uses_hex_text() {
        let sig = SignatureRecord::new("PDF", vec![0x25, 0x50, 0x44, 0x46, 0x2D], "pdf");
        insta::assert_json_snapshot!(sig, @r#"
        {
          "name": "PDF",
          "pattern": "25 50 44 46 2D",
          "extension": "pdf"
        }
        "#);
    }

    #[test]
    fn test_serialization_roundtrip_with_nul_bytes() {
        let sig = SignatureRecord::new("nul", vec![0x00, 0x00, 0xFF, 0x00], "bin");
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: SignatureRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn test_deserialize_rejects_bad_hex() {
        let json = r#"{"name":"x","pattern":"zz","extension":"x"}"#;
        assert!(serde_json::from_str::<SignatureRecord>(json).is_err());
    }
}
