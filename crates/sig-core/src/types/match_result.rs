//! Match results produced by a scan.

use std::fs::Metadata;
use std::time::SystemTime;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file whose leading bytes equal the chosen signature's pattern.
///
/// The `ordinal` is 1-based and assigned when the match is recorded. Under
/// parallel scanning it reflects completion order, not path order.
///
/// # Examples
///
/// ```
/// use sig_core::MatchResult;
/// use camino::Utf8PathBuf;
///
/// let result = MatchResult {
///     ordinal: 1,
///     path: Utf8PathBuf::from("/data/a.pdf"),
///     size: 1024,
///     created: None,
///     modified: None,
/// };
/// assert_eq!(result.file_name(), Some("a.pdf"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 1-based discovery ordinal.
    pub ordinal: u64,

    /// Absolute path of the matched file.
    pub path: Utf8PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Creation time, if the platform reports one.
    pub created: Option<DateTime<Utc>>,

    /// Last modification time, if available.
    pub modified: Option<DateTime<Utc>>,
}

impl MatchResult {
    /// Builds a result from file metadata.
    #[must_use]
    pub fn from_metadata(ordinal: u64, path: Utf8PathBuf, metadata: &Metadata) -> Self {
        Self {
            ordinal,
            path,
            size: metadata.len(),
            created: metadata.created().ok().map(to_utc),
            modified: metadata.modified().ok().map(to_utc),
        }
    }

    /// Returns the final path component.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
