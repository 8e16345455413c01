//! Error types for the sig-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! [`CatalogError`] for failures that cross the catalog boundary.

use camino::Utf8PathBuf;

use crate::hex::HexParseError;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use sig_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "scan.channel_capacity".to_owned(),
///     reason: "must be positive".to_owned(),
/// };
/// assert!(error.to_string().contains("channel_capacity"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors reported by [`CatalogStore`](crate::CatalogStore) mutations.
///
/// Loading never fails outward; only additions can report errors.
///
/// # Error Recovery Strategy
///
/// - **Parse errors** ([`CatalogError::Parse`]): the catalog is unchanged
/// - **Persist errors** ([`CatalogError::Persist`]): the in-memory append is
///   kept, so memory and disk disagree until the next successful write
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The signature pattern text was not valid hex.
    #[error("invalid signature pattern: {0}")]
    Parse(#[from] HexParseError),

    /// Writing the catalog file failed.
    #[error("failed to save signature catalog to {path}: {source}")]
    Persist {
        /// The catalog file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Creates a new [`CatalogError::Persist`] error.
    #[inline]
    pub fn persist(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the catalog was left unchanged by the failed call.
    #[inline]
    #[must_use]
    pub const fn catalog_unchanged(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::InvalidOption {
            option: "max_parallel_jobs".to_owned(),
            reason: "must be positive".to_owned(),
        };
        let msg = error.to_string();
        assert!(msg.contains("max_parallel_jobs"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_config_io_display() {
        let error = ConfigError::Io {
            path: Utf8PathBuf::from("/etc/sigscan.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(error.to_string().contains("/etc/sigscan.json"));
    }

    #[test]
    fn test_catalog_parse_error() {
        let error = CatalogError::from(HexParseError::Empty);
        assert!(error.catalog_unchanged());
        assert_eq!(error.to_string(), "invalid signature pattern: pattern is empty");
    }

    #[test]
    fn test_catalog_persist_error() {
        let error = CatalogError::persist(
            "signatures.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!error.catalog_unchanged());
        assert!(error.to_string().contains("signatures.json"));
    }
}
