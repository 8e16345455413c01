//! Parallel prefix matching using rayon.
//!
//! This module provides [`PrefixMatcher`], which tests candidate files
//! against one signature by reading exactly `pattern.len()` bytes from the
//! start of each file and comparing them byte-for-byte.
//!
//! # Design
//!
//! Uses the "collect-then-parallelize" pattern:
//!
//! 1. Paths are collected first by [`FileWalker`](crate::FileWalker)
//! 2. `PrefixMatcher` tests paths in parallel with `rayon::par_iter()`
//! 3. Per-thread read buffers are initialized via `map_init()` /
//!    `for_each_init()` and reused for every file a worker tests
//!
//! # Outcomes per file
//!
//! | Outcome                       | Reported | Counter           |
//! |-------------------------------|----------|-------------------|
//! | prefix equals pattern         | yes      | `matched`         |
//! | prefix differs                | no       | `tested`          |
//! | file shorter than pattern     | no       | `short`           |
//! | open/read failure             | no       | `unreadable`      |
//! | metadata failure after match  | no       | `metadata_errors` |
//!
//! The file handle lives only inside [`read_prefix`] and is closed on every
//! return path before the worker moves on.

use std::fs::{self, File};
use std::io::{self, Read};

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use sig_core::{MatchResult, SignatureRecord};
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ScanUpdate;
use crate::stats::ScanStats;

/// Per-worker prefix buffer; common signatures fit inline.
type PrefixBuf = SmallVec<[u8; 32]>;

/// Parallel matcher for a single signature.
///
/// # Thread Safety
///
/// `PrefixMatcher` is both `Send` and `Sync`. Workers share only the
/// [`ScanStats`] counters, whose match counter hands out ordinals.
///
/// # Examples
///
/// ```ignore
/// use sig_scanner::{PrefixMatcher, ScanStats};
/// use sig_core::SignatureRecord;
/// use tokio_util::sync::CancellationToken;
///
/// let pdf = SignatureRecord::new("PDF", vec![0x25, 0x50, 0x44, 0x46, 0x2D], "pdf");
/// let matcher = PrefixMatcher::new(pdf);
/// let results = matcher.match_files(&paths, &ScanStats::new(), &CancellationToken::new());
/// ```
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    signature: SignatureRecord,
}

impl PrefixMatcher {
    /// Creates a matcher for `signature`.
    #[inline]
    #[must_use]
    pub fn new(signature: SignatureRecord) -> Self {
        Self { signature }
    }

    /// Returns the signature being matched.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &SignatureRecord {
        &self.signature
    }

    /// Tests files in parallel and returns the matches.
    ///
    /// Results come back in ordinal order. Files not yet started when
    /// `cancel` fires are skipped.
    #[must_use]
    pub fn match_files(
        &self,
        paths: &[Utf8PathBuf],
        stats: &ScanStats,
        cancel: &CancellationToken,
    ) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = paths
            .par_iter()
            .map_init(PrefixBuf::new, |buf, path| {
                if cancel.is_cancelled() {
                    return None;
                }
                self.test_file(path, buf, stats)
            })
            .flatten()
            .collect();

        results.sort_unstable_by_key(|r| r.ordinal);
        results
    }

    /// Tests files in parallel, sending each match through `tx` as soon as
    /// it is recorded.
    ///
    /// If the receiver is dropped, `cancel` is triggered so the remaining
    /// workers stop picking up files. The receiver is checked before every
    /// file, not only when a match is sent.
    pub fn match_files_streaming(
        &self,
        paths: &[Utf8PathBuf],
        stats: &ScanStats,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<ScanUpdate>,
    ) {
        paths.par_iter().for_each_init(
            || (PrefixBuf::new(), tx.clone()),
            |(buf, sender), path| {
                if cancel.is_cancelled() {
                    return;
                }
                if sender.is_closed() {
                    debug!("Update receiver dropped, cancelling scan");
                    cancel.cancel();
                    return;
                }

                if let Some(result) = self.test_file(path, buf, stats) {
                    if sender.blocking_send(ScanUpdate::Match(result)).is_err() {
                        debug!("Update receiver dropped, cancelling scan");
                        cancel.cancel();
                    }
                }
            },
        );
    }

    /// Returns `true` if the file at `path` starts with the pattern.
    ///
    /// This is the single-file form of the test the parallel methods run,
    /// without statistics or metadata.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened or read. A file
    /// shorter than the pattern is `Ok(false)`, not an error.
    pub fn matches_file(&self, path: &Utf8Path) -> io::Result<bool> {
        let mut buf = PrefixBuf::new();
        let full = read_prefix(path, self.signature.pattern_len(), &mut buf)?;
        Ok(full && self.signature.is_prefix_of(&buf))
    }

    /// Tests one file and builds its result if it matches.
    fn test_file(
        &self,
        path: &Utf8Path,
        buf: &mut PrefixBuf,
        stats: &ScanStats,
    ) -> Option<MatchResult> {
        stats.increment_tested();

        match read_prefix(path, self.signature.pattern_len(), buf) {
            Ok(true) if self.signature.is_prefix_of(buf) => {}
            Ok(true) => return None,
            Ok(false) => {
                stats.increment_short();
                return None;
            }
            Err(e) => {
                stats.increment_unreadable();
                debug!(path = %path, error = %e, "Skipping unreadable file");
                return None;
            }
        }

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                stats.increment_metadata_errors();
                warn!(path = %path, error = %e, "Failed to read metadata for matched file");
                return None;
            }
        };

        let ordinal = stats.record_match();
        debug!(path = %path, ordinal, "Matched file");
        Some(MatchResult::from_metadata(ordinal, path.to_owned(), &metadata))
    }
}

/// Reads the first `len` bytes of the file into `buf`.
///
/// Returns `Ok(false)` if the file ends before `len` bytes.
fn read_prefix(path: &Utf8Path, len: usize, buf: &mut PrefixBuf) -> io::Result<bool> {
    buf.clear();
    buf.resize(len, 0);

    let mut file = File::open(path)?;
    match file.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}
