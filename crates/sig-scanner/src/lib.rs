//! Parallel filesystem scanner matching files against byte signatures.
//!
//! This crate is the scan engine behind `sigscan`. Given a root path and one
//! [`SignatureRecord`], it walks the tree, tests every regular file's leading
//! bytes against the signature in parallel, and reports matches with their
//! metadata.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`FileWalker`]: Directory traversal via the `ignore` crate
//! - [`PrefixMatcher`]: Parallel prefix comparison with rayon
//! - [`ScanStats`]: Atomic counters, including the match ordinal source
//!
//! # Example
//!
//! ```ignore
//! use sig_scanner::{ScanConfig, Scanner};
//! use sig_core::CatalogStore;
//! use camino::Utf8Path;
//!
//! let catalog = CatalogStore::open_default();
//! let scanner = Scanner::new(ScanConfig::new(Utf8Path::new("/data")), catalog.get(0))?;
//!
//! let result = scanner.scan()?;
//! for m in &result.matches {
//!     println!("{}: {} ({} bytes)", m.ordinal, m.path, m.size);
//! }
//! ```
//!
//! # Streaming API
//!
//! [`start`] runs the scan on Tokio's blocking pool and hands back a
//! [`ScanHandle`], so the caller's own loop stays responsive:
//!
//! ```ignore
//! use sig_scanner::{start, ScanConfig, ScanUpdate};
//!
//! let mut handle = start(ScanConfig::new(Utf8Path::new("/data")), catalog.get(0))?;
//!
//! while let Some(update) = handle.recv().await {
//!     match update {
//!         ScanUpdate::PathsDiscovered(count) => println!("Testing {count} files"),
//!         ScanUpdate::Match(m) => println!("Found {}: {}", m.ordinal, m.path),
//!         ScanUpdate::Complete(outcome) => println!("Done: {} matches", outcome.count()),
//!         ScanUpdate::Failed(message) => eprintln!("Scan failed: {message}"),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Scanner (main entry point)
//!     │
//!     ├── FileWalker (collect regular files)
//!     │       │
//!     │       └── WalkBuilder (ignore crate)
//!     │
//!     ├── PrefixMatcher (parallel prefix tests)
//!     │       │
//!     │       └── per-thread SmallVec buffers
//!     │
//!     └── ScanStats (atomic counters + ordinals)
//! ```
//!
//! # Ordering
//!
//! Files are tested concurrently and no order is guaranteed between them.
//! Ordinals reflect the order in which matches were recorded, and within
//! one scan they are always exactly `1..=count`.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod matcher;
mod stats;
mod walker;

pub use error::ScanError;
pub use matcher::PrefixMatcher;
pub use stats::{ScanStats, StatsSnapshot};
pub use walker::FileWalker;

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use rayon::ThreadPoolBuilder;
use sig_core::{MatchResult, ScanSettings, SignatureRecord};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

/// Default capacity of the streaming update channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Update sent during a streaming scan operation.
///
/// # Channel Protocol
///
/// 1. [`ScanUpdate::PathsDiscovered`] - once, after the walk
/// 2. [`ScanUpdate::Match`] - once per match, in send order; ordinals may
///    arrive out of order
/// 3. [`ScanUpdate::Complete`] or [`ScanUpdate::Failed`] - exactly once
#[derive(Debug)]
pub enum ScanUpdate {
    /// Number of regular files found by the walk.
    PathsDiscovered(usize),

    /// A file matched the signature.
    Match(MatchResult),

    /// The scan finished (possibly with no matches, or cancelled).
    Complete(ScanOutcome),

    /// The scan could not run.
    Failed(String),
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// At least one file matched.
    Completed {
        /// Number of matches reported.
        count: u64,
        /// Final statistics.
        stats: StatsSnapshot,
    },

    /// Every file was processed and none matched.
    NoMatches {
        /// Final statistics.
        stats: StatsSnapshot,
    },

    /// The scan was cancelled before finishing.
    Cancelled {
        /// Number of matches recorded before cancellation. After a dropped
        /// receiver this may exceed the matches actually delivered.
        count: u64,
        /// Statistics at the point of cancellation.
        stats: StatsSnapshot,
    },
}

impl ScanOutcome {
    fn new(cancelled: bool, stats: StatsSnapshot) -> Self {
        let count = stats.matched;
        if cancelled {
            Self::Cancelled { count, stats }
        } else if count == 0 {
            Self::NoMatches { stats }
        } else {
            Self::Completed { count, stats }
        }
    }

    /// Returns the number of matches recorded.
    #[must_use]
    pub const fn count(&self) -> u64 {
        match self {
            Self::Completed { count, .. } | Self::Cancelled { count, .. } => *count,
            Self::NoMatches { .. } => 0,
        }
    }

    /// Returns the final statistics.
    #[must_use]
    pub const fn stats(&self) -> &StatsSnapshot {
        match self {
            Self::Completed { stats, .. }
            | Self::NoMatches { stats }
            | Self::Cancelled { stats, .. } => stats,
        }
    }

    /// Returns `true` if the scan finished without any match.
    #[inline]
    #[must_use]
    pub const fn is_no_matches(&self) -> bool {
        matches!(self, Self::NoMatches { .. })
    }

    /// Returns `true` if the scan was cancelled.
    #[inline]
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Configuration for the scanner.
///
/// # Examples
///
/// ```
/// use sig_scanner::ScanConfig;
/// use camino::Utf8Path;
///
/// let config = ScanConfig::new(Utf8Path::new("/data"))
///     .with_follow_links(true)
///     .with_max_parallel_jobs(Some(4));
/// assert!(config.follow_links);
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory (or single file) to scan.
    pub root: Utf8PathBuf,
    /// Whether to follow symbolic links.
    pub follow_links: bool,
    /// Whether to honor ignore files and skip hidden entries.
    pub respect_ignore: bool,
    /// Worker count for a dedicated pool; `None` uses rayon's global pool.
    pub max_parallel_jobs: Option<usize>,
    /// Capacity of the streaming update channel used by [`start`].
    pub channel_capacity: usize,
}

impl ScanConfig {
    /// Creates a new scan configuration with the given root.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            follow_links: false,
            respect_ignore: false,
            max_parallel_jobs: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Creates a configuration from the shared settings section.
    #[must_use]
    pub fn from_settings(root: &Utf8Path, settings: &ScanSettings) -> Self {
        Self::new(root)
            .with_follow_links(settings.follow_links)
            .with_respect_ignore(settings.respect_ignore)
            .with_max_parallel_jobs(settings.max_parallel_jobs)
            .with_channel_capacity(settings.channel_capacity)
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

    /// Sets the worker count. `None` uses all available cores.
    #[must_use]
    pub const fn with_max_parallel_jobs(mut self, jobs: Option<usize>) -> Self {
        self.max_parallel_jobs = jobs;
        self
    }

    /// Sets the streaming channel capacity (minimum 1).
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

/// Result of a blocking scan.
#[derive(Debug)]
pub struct ScanResult {
    /// Matches in ordinal order.
    pub matches: Vec<MatchResult>,
    /// How the scan ended.
    pub outcome: ScanOutcome,
}

/// Scans a directory tree for files starting with one signature's bytes.
///
/// # Cloning
///
/// `Scanner` is cheaply cloneable. Clones share statistics and the
/// cancellation token, so a clone moved onto a background thread can be
/// cancelled from the original. A cancelled scanner stays cancelled; build a
/// new one for the next request.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Scanner configuration.
    config: ScanConfig,
    /// Matcher for the selected signature.
    matcher: PrefixMatcher,
    /// Statistics counters (shared via Arc for cloning).
    stats: Arc<ScanStats>,
    /// Cooperative cancellation, checked between files.
    cancel: CancellationToken,
}

impl Scanner {
    /// Validates a scan request and creates a scanner for it.
    ///
    /// Checks run in this order, the first two without touching the
    /// filesystem:
    ///
    /// 1. the root path is non-empty
    /// 2. a signature was selected
    /// 3. the root exists
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidInput`] if any check fails.
    pub fn new(config: ScanConfig, signature: Option<SignatureRecord>) -> Result<Self, ScanError> {
        if config.root.as_str().is_empty() {
            return Err(ScanError::invalid_input("root path is empty"));
        }

        let Some(signature) = signature else {
            return Err(ScanError::invalid_input("no signature selected"));
        };

        if !config.root.exists() {
            return Err(ScanError::invalid_input(format!(
                "root path does not exist: {}",
                config.root
            )));
        }

        info!(
            root = %config.root,
            signature = signature.name(),
            pattern = %signature.pattern_hex(),
            follow_links = config.follow_links,
            "Creating scanner"
        );

        Ok(Self {
            config,
            matcher: PrefixMatcher::new(signature),
            stats: Arc::new(ScanStats::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Performs a full scan and returns every match.
    ///
    /// Blocks until the scan finishes or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Root`] if the root cannot be resolved and
    /// [`ScanError::ThreadPool`] if a dedicated pool cannot be built.
    /// Per-file failures never produce an error.
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        let paths = self.collect_paths()?;

        let matches = self.install(|| self.matcher.match_files(&paths, &self.stats, &self.cancel))?;
        let outcome = self.finish();

        Ok(ScanResult { matches, outcome })
    }

    /// Performs a full scan, sending updates through `tx` as they happen.
    ///
    /// Follows the protocol documented on [`ScanUpdate`]. This blocks the
    /// calling thread and must not run on an async worker thread; use
    /// [`spawn`](Self::spawn) or [`start`] from async code.
    ///
    /// # Cancellation
    ///
    /// If the receiver is dropped, the scan cancels itself before testing
    /// the next file, whether or not any further file would match, and the
    /// method returns a [`ScanOutcome::Cancelled`].
    ///
    /// # Errors
    ///
    /// As for [`scan`](Self::scan). A [`ScanUpdate::Failed`] carrying the
    /// error message is sent before the error is returned.
    #[allow(clippy::needless_pass_by_value)] // dropping the sender closes the channel
    pub fn scan_streaming(&self, tx: mpsc::Sender<ScanUpdate>) -> Result<ScanOutcome, ScanError> {
        match self.scan_streaming_inner(&tx) {
            Ok(outcome) => {
                // Ignore if receiver dropped
                let _ = tx.blocking_send(ScanUpdate::Complete(outcome));
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.blocking_send(ScanUpdate::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Runs [`scan_streaming`](Self::scan_streaming) on Tokio's blocking
    /// pool and returns a handle for consuming its updates.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> ScanHandle {
        let (tx, updates) = mpsc::channel(self.config.channel_capacity);
        let cancel = self.cancel.clone();
        let task = tokio::task::spawn_blocking(move || self.scan_streaming(tx));

        ScanHandle {
            updates,
            task,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
        }
    }

    /// Requests cancellation of a running scan.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns a snapshot of current statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the signature being scanned for.
    #[must_use]
    pub fn signature(&self) -> &SignatureRecord {
        self.matcher.signature()
    }

    /// Returns the scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn scan_streaming_inner(&self, tx: &mpsc::Sender<ScanUpdate>) -> Result<ScanOutcome, ScanError> {
        let paths = self.collect_paths()?;

        if tx.blocking_send(ScanUpdate::PathsDiscovered(paths.len())).is_err() {
            debug!("Update receiver dropped before matching");
            self.cancel.cancel();
            return Ok(self.finish());
        }

        self.install(|| {
            self.matcher
                .match_files_streaming(&paths, &self.stats, &self.cancel, tx);
        })?;

        Ok(self.finish())
    }

    /// Resets statistics, resolves the root, and walks it.
    fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        info!(root = %self.config.root, signature = self.signature().name(), "Starting scan");
        self.stats.reset();

        let root = self
            .config
            .root
            .canonicalize_utf8()
            .map_err(|e| ScanError::root(&self.config.root, e))?;

        let paths = FileWalker::new(&root)
            .with_follow_links(self.config.follow_links)
            .with_respect_ignore(self.config.respect_ignore)
            .collect_paths(&self.stats, &self.cancel);

        info!(root = %root, count = paths.len(), "Collected candidate files");
        Ok(paths)
    }

    /// Runs `f` on a dedicated pool when a job limit is configured.
    fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> Result<R, ScanError> {
        match self.config.max_parallel_jobs {
            Some(jobs) => {
                let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
                Ok(pool.install(f))
            }
            None => Ok(f()),
        }
    }

    fn finish(&self) -> ScanOutcome {
        let outcome = ScanOutcome::new(self.cancel.is_cancelled(), self.stats.snapshot());
        let stats = outcome.stats();

        info!(
            matched = stats.matched,
            tested = stats.tested,
            short = stats.short,
            skipped = stats.total_skipped(),
            cancelled = outcome.is_cancelled(),
            "Scan completed"
        );
        outcome
    }
}

/// Handle to a scan running in the background.
///
/// Dropping the handle cancels the scan; the background task stops before
/// testing its next file.
#[derive(Debug)]
pub struct ScanHandle {
    updates: mpsc::Receiver<ScanUpdate>,
    task: JoinHandle<Result<ScanOutcome, ScanError>>,
    cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
}

impl ScanHandle {
    /// Receives the next update, or `None` once the scan has finished and
    /// all updates were delivered.
    pub async fn recv(&mut self) -> Option<ScanUpdate> {
        self.updates.recv().await
    }

    /// Requests cancellation. Files already being tested finish first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Discards any undelivered updates and waits for the scan to end.
    ///
    /// # Errors
    ///
    /// Returns the scan's own error, or [`ScanError::Join`] if the
    /// background task panicked.
    pub async fn join(mut self) -> Result<ScanOutcome, ScanError> {
        while self.updates.recv().await.is_some() {}
        self.task.await?
    }
}

/// Validates a scan request and starts it in the background.
///
/// This is the asynchronous entry point for front ends: `signature` is
/// typically `catalog.get(selected_index)`, so an out-of-range selection
/// arrives as `None` and is rejected.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`ScanError::InvalidInput`] as for [`Scanner::new`]; nothing is
/// spawned in that case.
pub fn start(config: ScanConfig, signature: Option<SignatureRecord>) -> Result<ScanHandle, ScanError> {
    Ok(Scanner::new(config, signature)?.spawn())
}
