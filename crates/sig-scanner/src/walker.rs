//! Directory traversal for candidate files.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to
//! walk a directory tree and collect every regular file beneath it.
//!
//! # Features
//!
//! - Includes hidden and git-ignored files unless ignore filters are enabled
//! - Does not follow symbolic links unless asked to
//! - Skips entries that fail to be read instead of aborting the walk
//! - Converts paths to UTF-8 [`Utf8PathBuf`](camino::Utf8PathBuf)
//!
//! # Symbolic Links
//!
//! With `follow_links` off (the default) a symlink is neither descended
//! into nor tested, even when it points at a regular file. With it on, links
//! are resolved and link loops surface as walk errors, which are skipped.
//!
//! # Examples
//!
//! ```ignore
//! use sig_scanner::{FileWalker, ScanStats};
//! use camino::Utf8Path;
//! use tokio_util::sync::CancellationToken;
//!
//! let walker = FileWalker::new(Utf8Path::new("/data"));
//! let paths = walker.collect_paths(&ScanStats::new(), &CancellationToken::new());
//!
//! for path in &paths {
//!     println!("Found: {path}");
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::stats::ScanStats;

/// A file walker that discovers regular files in a directory tree.
///
/// # Design
///
/// The walker uses a "collect-then-parallelize" pattern:
/// 1. Walker collects all paths first (single-threaded, I/O bound)
/// 2. Paths are then tested in parallel with rayon
#[derive(Debug)]
pub struct FileWalker {
    /// The root to walk. A regular file is walked as a one-entry tree.
    root: Utf8PathBuf,
    /// Whether to follow symbolic links.
    follow_links: bool,
    /// Whether to apply `.gitignore`/`.ignore`/hidden-file filters.
    respect_ignore: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root.
    ///
    /// The root is not checked here; a missing root yields a walk error,
    /// which is skipped like any other.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            follow_links: false,
            respect_ignore: false,
        }
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Configures whether ignore files and hidden-entry filters apply.
    #[must_use]
    pub const fn with_respect_ignore(mut self, respect: bool) -> Self {
        self.respect_ignore = respect;
        self
    }

    /// Collects every regular file in the tree.
    ///
    /// Walk errors (permission denied, broken links, link loops) and
    /// non-UTF-8 paths are counted in `stats` and skipped. The walk stops
    /// early, returning what it has so far, once `cancel` is triggered.
    pub fn collect_paths(&self, stats: &ScanStats, cancel: &CancellationToken) -> Vec<Utf8PathBuf> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            if cancel.is_cancelled() {
                debug!(collected = paths.len(), "Walk cancelled");
                break;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    stats.increment_skipped();
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            // Directories, symlinks (when not followed), and special files
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                stats.increment_skipped();
                debug!(path = %entry.path().display(), "Skipping non-UTF-8 path");
                continue;
            };

            stats.increment_discovered();
            paths.push(path.to_owned());
        }

        paths
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            // Hidden and ignored files are candidates unless asked otherwise
            .standard_filters(self.respect_ignore)
            .follow_links(self.follow_links)
            // Use a single thread for walking (we parallelize later)
            .threads(1)
            // Don't require the root to be a git repo
            .require_git(false)
            .build()
    }

    /// Returns the root being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
