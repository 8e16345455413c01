//! Scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`] for tracking scan progress and
//! [`StatsSnapshot`] for point-in-time statistics views.
//!
//! The match counter doubles as the source of discovery ordinals: each
//! call to [`ScanStats::record_match`] performs one `fetch_add` and returns
//! the new value, so ordinals within a scan are unique and gap-free no
//! matter how many workers race on it.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. Read-modify-write operations are still atomic under relaxed
//! ordering, which is all the ordinal guarantee needs.
//!
//! # Examples
//!
//! ```
//! use sig_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.increment_tested();
//! assert_eq!(stats.record_match(), 1);
//! assert_eq!(stats.record_match(), 2);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.matched, 2);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for scan statistics.
///
/// Skip counters are the diagnostic view of failures the scanner absorbs
/// silently: they never change which files are reported.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Regular files found by the walker.
    discovered: AtomicU64,
    /// Files whose prefix was read and compared.
    tested: AtomicU64,
    /// Matches kept (also the ordinal source).
    matched: AtomicU64,
    /// Walk entries skipped due to traversal errors or non-UTF-8 paths.
    skipped: AtomicU64,
    /// Files that could not be opened or read.
    unreadable: AtomicU64,
    /// Files shorter than the pattern.
    short: AtomicU64,
    /// Matched files dropped because their metadata could not be read.
    metadata_errors: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the discovered files counter.
    #[inline]
    pub fn increment_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the tested files counter.
    #[inline]
    pub fn increment_tested(&self) {
        self.tested.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a kept match and returns its 1-based ordinal.
    #[inline]
    pub fn record_match(&self) -> u64 {
        self.matched.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Increments the traversal skip counter.
    #[inline]
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the unreadable files counter.
    #[inline]
    pub fn increment_unreadable(&self) {
        self.unreadable.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the short files counter.
    #[inline]
    pub fn increment_short(&self) {
        self.short.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the metadata failure counter.
    #[inline]
    pub fn increment_metadata_errors(&self) {
        self.metadata_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of matches recorded so far.
    #[inline]
    #[must_use]
    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    /// Returns a point-in-time snapshot of all statistics.
    ///
    /// Values are read one at a time, so a snapshot taken mid-scan may not
    /// reflect a perfectly consistent state.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            tested: self.tested.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            short: self.short.load(Ordering::Relaxed),
            metadata_errors: self.metadata_errors.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    ///
    /// Useful for re-scanning with the same scanner.
    pub fn reset(&self) {
        self.discovered.store(0, Ordering::Relaxed);
        self.tested.store(0, Ordering::Relaxed);
        self.matched.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.unreadable.store(0, Ordering::Relaxed);
        self.short.store(0, Ordering::Relaxed);
        self.metadata_errors.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of scan statistics.
///
/// # Examples
///
/// ```
/// use sig_scanner::StatsSnapshot;
///
/// let snap = StatsSnapshot {
///     discovered: 10,
///     tested: 9,
///     matched: 2,
///     skipped: 1,
///     unreadable: 1,
///     short: 3,
///     metadata_errors: 0,
/// };
///
/// assert_eq!(snap.total_skipped(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Regular files found by the walker.
    pub discovered: u64,
    /// Files whose prefix was read and compared.
    pub tested: u64,
    /// Matches kept.
    pub matched: u64,
    /// Walk entries skipped due to traversal errors.
    pub skipped: u64,
    /// Files that could not be opened or read.
    pub unreadable: u64,
    /// Files shorter than the pattern.
    pub short: u64,
    /// Matched files dropped because their metadata could not be read.
    pub metadata_errors: u64,
}

impl StatsSnapshot {
    /// Returns the number of entries absorbed because of an error.
    ///
    /// Short files are not errors and are excluded.
    #[inline]
    #[must_use]
    pub const fn total_skipped(&self) -> u64 {
        self.skipped + self.unreadable + self.metadata_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_scan_stats_new() {
        let snap = ScanStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
    }

    #[test]
    fn test_scan_stats_increment() {
        let stats = ScanStats::new();

        stats.increment_discovered();
        stats.increment_discovered();
        stats.increment_tested();
        stats.increment_skipped();
        stats.increment_unreadable();
        stats.increment_short();
        stats.increment_metadata_errors();
        let ordinal = stats.record_match();

        let snap = stats.snapshot();
        assert_eq!(ordinal, 1);
        assert_eq!(snap.discovered, 2);
        assert_eq!(snap.tested, 1);
        assert_eq!(snap.matched, 1);
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.unreadable, 1);
        assert_eq!(snap.short, 1);
        assert_eq!(snap.metadata_errors, 1);
    }

    #[test]
    fn test_scan_stats_reset() {
        let stats = ScanStats::new();
        stats.increment_discovered();
        stats.record_match();
        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.record_match(), 1);
    }

    #[test]
    fn test_record_match_ordinals_unique_under_contention() {
        let stats = Arc::new(ScanStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || (0..500).map(|_| stats.record_match()).collect::<Vec<_>>())
            })
            .collect();

        let mut ordinals: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ordinals.sort_unstable();

        let expected: Vec<u64> = (1..=4000).collect();
        assert_eq!(ordinals, expected);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = StatsSnapshot {
            discovered: 3,
            tested: 3,
            matched: 1,
            short: 1,
            ..StatsSnapshot::default()
        };
        insta::assert_json_snapshot!(snap, @r#"
        {
          "discovered": 3,
          "tested": 3,
          "matched": 1,
          "skipped": 0,
          "unreadable": 0,
          "short": 1,
          "metadata_errors": 0
        }
        "#);
    }
}
