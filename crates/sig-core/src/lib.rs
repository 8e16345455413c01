//! Core types, signature catalog, and configuration for the sigscan tool.
//!
//! This crate provides the foundational pieces used across the workspace:
//!
//! - Domain types ([`SignatureRecord`], [`MatchResult`])
//! - The durable signature catalog ([`CatalogStore`])
//! - Hex pattern parsing and formatting ([`hex`])
//! - Configuration structures ([`Config`])
//! - Error types for consistent error handling

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod hex;
pub mod types;

pub use catalog::{CatalogStore, DEFAULT_CATALOG_FILE};
pub use config::{CatalogSettings, Config, ScanSettings};
pub use error::{CatalogError, ConfigError};
pub use hex::HexParseError;
pub use types::{MatchResult, SignatureRecord};
