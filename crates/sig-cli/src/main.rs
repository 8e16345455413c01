//! CLI entry point for the sigscan file-signature scanner.
//!
//! This binary manages the signature catalog and runs scans that report
//! every file whose leading bytes match a chosen signature.
//!
//! # Usage
//!
//! ```bash
//! sigscan [OPTIONS] <COMMAND>
//!
//! # Show the catalog with selection indices
//! sigscan list
//!
//! # Register a new signature
//! sigscan add --name "GIF Image" --pattern "47 49 46 38" --extension gif
//!
//! # Find every PDF under /data, one JSON object per match
//! sigscan scan /data --signature 0 --format json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::WrapErr;
use sig_core::{CatalogStore, Config, MatchResult};
use sig_scanner::{ScanConfig, ScanOutcome, ScanUpdate};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Finds files by their leading "magic" bytes.
///
/// Signatures live in a JSON catalog that is created with common defaults
/// on first use.
#[derive(Parser)]
#[command(name = "sigscan", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Path to the signature catalog.
    ///
    /// Defaults to `catalog.path` from the config file, or
    /// `./signatures.json`.
    #[arg(long, global = true, env = "SIGSCAN_CATALOG")]
    catalog: Option<Utf8PathBuf>,

    /// Path to a JSON config file.
    #[arg(long, global = true, env = "SIGSCAN_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List catalog signatures with their selection index.
    List,

    /// Add a signature to the catalog.
    Add {
        /// Display name, e.g. "PDF Document".
        #[arg(long)]
        name: String,

        /// Space-separated hex bytes, e.g. "25 50 44 46 2D".
        #[arg(long)]
        pattern: String,

        /// Conventional file extension, without the dot.
        #[arg(long)]
        extension: String,
    },

    /// Scan a directory tree for files matching a signature.
    Scan {
        /// Directory (or single file) to scan.
        path: Utf8PathBuf,

        /// Catalog index of the signature to look for (see `list`).
        #[arg(short, long)]
        signature: usize,

        /// Follow symbolic links.
        #[arg(long)]
        follow_links: bool,

        /// Honor .gitignore/.ignore files and skip hidden entries.
        #[arg(long)]
        respect_ignore: bool,

        /// Number of worker threads (defaults to all cores).
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Match output format.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Numbered human-readable blocks.
    Text,
    /// One JSON object per line.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so match output on stdout stays machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults.
fn load_config(cli: &Cli) -> color_eyre::Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path).wrap_err_with(|| format!("Failed to load config {path}")),
        None => Ok(Config::default()),
    }
}

/// Opens the catalog named by `--catalog`, falling back to the config.
fn open_catalog(cli: &Cli, config: &Config) -> CatalogStore {
    let path = cli
        .catalog
        .clone()
        .unwrap_or_else(|| config.catalog.path.clone());
    CatalogStore::open(path)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Prints every catalog signature with its index.
fn run_list(catalog: &CatalogStore) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let width = catalog.iter().map(|s| s.name().len()).max().unwrap_or(0);
    for (index, signature) in catalog.iter().enumerate() {
        writeln!(
            handle,
            "{index:>3}  {:<width$}  .{:<5}  {}",
            signature.name(),
            signature.extension(),
            signature.pattern_hex(),
        )?;
    }

    Ok(())
}

/// Parses and appends a new signature.
fn run_add(
    catalog: &mut CatalogStore,
    name: &str,
    pattern: &str,
    extension: &str,
) -> color_eyre::Result<()> {
    match catalog.add_hex(name, pattern, extension) {
        Ok(()) => {
            info!(name, path = %catalog.path(), "Signature added");
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "Added signature {}: {name}", catalog.len() - 1)?;
            Ok(())
        }
        Err(e) if e.catalog_unchanged() => Err(e).wrap_err("Signature not added"),
        Err(e) => Err(e).wrap_err("Signature added for this run only"),
    }
}

/// Runs a scan in the background, printing matches as they arrive.
///
/// Ctrl-C cancels the scan; matches already found are still reported.
async fn run_scan(
    config: ScanConfig,
    catalog: &CatalogStore,
    index: usize,
    format: OutputFormat,
) -> color_eyre::Result<()> {
    let signature = catalog.get(index);
    if signature.is_none() {
        warn!(index, available = catalog.len(), "Signature index out of range");
    }

    let mut handle = sig_scanner::start(config, signature)?;
    let cancel = handle.cancellation_token();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let stdout = std::io::stdout();
    loop {
        tokio::select! {
            update = handle.recv() => {
                let Some(update) = update else { break };
                match update {
                    ScanUpdate::PathsDiscovered(count) => info!(count, "Testing candidate files"),
                    ScanUpdate::Match(result) => {
                        let mut out = stdout.lock();
                        match format {
                            OutputFormat::Text => writeln!(out, "{}\n", format_match(&result))?,
                            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&result)?)?,
                        }
                    }
                    ScanUpdate::Complete(outcome) => debug!(?outcome, "Scan finished"),
                    ScanUpdate::Failed(message) => debug!(%message, "Scan failed"),
                }
            }
            result = &mut ctrl_c, if !cancel.is_cancelled() => {
                result?;
                info!("Interrupt received, cancelling scan");
                cancel.cancel();
            }
        }
    }

    let outcome = handle.join().await?;
    let summary = format_summary(&outcome);
    match format {
        OutputFormat::Text => writeln!(stdout.lock(), "{summary}")?,
        OutputFormat::Json => writeln!(std::io::stderr().lock(), "{summary}")?,
    }

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Formats one match as a numbered text block.
fn format_match(result: &MatchResult) -> String {
    format!(
        "Found file {}:\n  Path:     {}\n  Size:     {} bytes\n  Created:  {}\n  Modified: {}",
        result.ordinal,
        result.path,
        group_thousands(result.size),
        format_time(result.created),
        format_time(result.modified),
    )
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "unavailable".to_owned(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Formats `n` with comma thousands separators.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats the terminal line for a finished scan.
fn format_summary(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::NoMatches { .. } => "No files found.".to_owned(),
        ScanOutcome::Completed { count, .. } => format!("Scan complete. Files found: {count}"),
        ScanOutcome::Cancelled { count, .. } => format!("Scan cancelled. Files found: {count}"),
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration and the catalog
    let config = load_config(&cli)?;
    let mut catalog = open_catalog(&cli, &config);

    // 5. Route to appropriate command
    match &cli.command {
        Commands::List => run_list(&catalog),
        Commands::Add {
            name,
            pattern,
            extension,
        } => run_add(&mut catalog, name, pattern, extension),
        Commands::Scan {
            path,
            signature,
            follow_links,
            respect_ignore,
            jobs,
            format,
        } => {
            let mut scan_config = ScanConfig::from_settings(path, &config.scan);
            if *follow_links {
                scan_config = scan_config.with_follow_links(true);
            }
            if *respect_ignore {
                scan_config = scan_config.with_respect_ignore(true);
            }
            if jobs.is_some() {
                scan_config = scan_config.with_max_parallel_jobs(*jobs);
            }
            run_scan(scan_config, &catalog, *signature, *format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "sigscan", "scan", "/data", "--signature", "2", "--jobs", "4", "--format", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Scan {
                path,
                signature,
                jobs,
                format,
                follow_links,
                ..
            } => {
                assert_eq!(path, "/data");
                assert_eq!(signature, 2);
                assert_eq!(jobs, Some(4));
                assert!(matches!(format, OutputFormat::Json));
                assert!(!follow_links);
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_scan_requires_signature() {
        assert!(Cli::try_parse_from(["sigscan", "scan", "/data"]).is_err());
    }

    #[test]
    fn test_format_match() {
        let result = MatchResult {
            ordinal: 3,
            path: Utf8PathBuf::from("/data/a.pdf"),
            size: 1_234_567,
            created: None,
            modified: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single(),
        };

        insta::assert_snapshot!(format_match(&result), @r"
        Found file 3:
          Path:     /data/a.pdf
          Size:     1,234,567 bytes
          Created:  unavailable
          Modified: 2024-05-06 07:08:09 UTC
        ");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn test_format_summary() {
        let stats = sig_scanner::StatsSnapshot::default();
        assert_eq!(format_summary(&ScanOutcome::NoMatches { stats }), "No files found.");
        assert_eq!(
            format_summary(&ScanOutcome::Completed { count: 2, stats }),
            "Scan complete. Files found: 2"
        );
        assert_eq!(
            format_summary(&ScanOutcome::Cancelled { count: 1, stats }),
            "Scan cancelled. Files found: 1"
        );
    }
}
