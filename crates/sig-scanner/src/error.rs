//! Error types for the sig-scanner crate.
//!
//! This module provides the [`ScanError`] type for failures that end a scan
//! or prevent it from starting.
//!
//! # Error Recovery Strategy
//!
//! Per-file problems never become a [`ScanError`]. Walk errors, unreadable
//! files, short files and metadata failures are absorbed by the scanner and
//! only show up in [`StatsSnapshot`](crate::StatsSnapshot) counters and
//! debug logs. The variants here are all fatal for the scan at hand.
//!
//! # Examples
//!
//! ```
//! use sig_scanner::ScanError;
//!
//! fn handle_error(err: &ScanError) {
//!     match err {
//!         ScanError::InvalidInput(msg) => eprintln!("Bad request: {msg}"),
//!         ScanError::Root { path, .. } => eprintln!("Cannot open root: {path}"),
//!         ScanError::ThreadPool(e) => eprintln!("Worker pool: {e}"),
//!         ScanError::Join(e) => eprintln!("Scan task: {e}"),
//!     }
//! }
//! ```

use camino::Utf8PathBuf;

/// Errors that can occur during scanning operations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The scan request was invalid.
    ///
    /// Raised for an empty root path, a missing root, or no selected
    /// signature. Empty-path and missing-signature checks run before any
    /// filesystem access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The root path could not be resolved to an absolute UTF-8 path.
    #[error("failed to resolve scan root {path}: {source}")]
    Root {
        /// The root path as given.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The background scan task panicked or was aborted.
    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// Creates a new [`ScanError::InvalidInput`] error.
    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a new [`ScanError::Root`] error.
    #[inline]
    pub fn root(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Root {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error was caused by the caller's request rather
    /// than the environment.
    #[inline]
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_scan_error_invalid_input() {
        let err = ScanError::invalid_input("root path is empty");
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "invalid input: root path is empty");
    }

    #[test]
    fn test_scan_error_root() {
        let err = ScanError::root(
            "/data",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_invalid_input());
        assert!(err.to_string().contains("/data"));
    }
}
