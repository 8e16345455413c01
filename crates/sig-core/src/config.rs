//! Configuration structures for the sigscan tool.
//!
//! This module provides configuration types for each component:
//!
//! - [`CatalogSettings`] - Where the signature catalog lives
//! - [`ScanSettings`] - Scanner behavior (symlinks, ignore files, parallelism)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`], and every section is
//! `#[serde(default)]` so a config file only needs the keys it overrides.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_FILE;
use crate::error::ConfigError;

/// Configuration for the signature catalog.
///
/// # Examples
///
/// ```
/// use sig_core::CatalogSettings;
///
/// let settings = CatalogSettings::default();
/// assert_eq!(settings.path, "signatures.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog file path, relative to the working directory unless absolute.
    pub path: Utf8PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::from(DEFAULT_CATALOG_FILE),
        }
    }
}

/// Configuration for the scanner.
///
/// # Examples
///
/// ```
/// use sig_core::ScanSettings;
///
/// let settings = ScanSettings::default();
/// assert!(!settings.follow_links);
/// assert_eq!(settings.channel_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,

    /// Whether to honor `.gitignore`/`.ignore` files and skip hidden entries.
    pub respect_ignore: bool,

    /// Maximum number of parallel matching jobs.
    /// `None` means use all available CPU cores.
    pub max_parallel_jobs: Option<usize>,

    /// Capacity of the streaming update channel.
    pub channel_capacity: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            follow_links: false,
            respect_ignore: false,
            max_parallel_jobs: None,
            channel_capacity: 256,
        }
    }
}

/// Root configuration for the sigscan tool.
///
/// # Examples
///
/// ```
/// use sig_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("signatures.json"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog configuration.
    pub catalog: CatalogSettings,

    /// Scanner configuration.
    pub scan: ScanSettings,
}

impl Config {
    /// Loads configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON, and
    /// [`ConfigError::InvalidOption`] if a value is out of range.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;

        tracing::debug!(path = %path, "Loaded configuration");
        Ok(config)
    }

    /// Checks option values that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for zero-sized channels or
    /// a zero job count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.channel_capacity == 0 {
            return Err(ConfigError::InvalidOption {
                option: "scan.channel_capacity".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.scan.max_parallel_jobs == Some(0) {
            return Err(ConfigError::InvalidOption {
                option: "scan.max_parallel_jobs".to_owned(),
                reason: "must be at least 1 when set".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_settings_defaults() {
        let settings = ScanSettings::default();
        assert!(!settings.follow_links);
        assert!(!settings.respect_ignore);
        assert_eq!(settings.max_parallel_jobs, None);
        assert_eq!(settings.channel_capacity, 256);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"scan": {"follow_links": true}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.scan.follow_links);
        // Other fields should have defaults
        assert_eq!(config.scan.channel_capacity, 256);
        assert_eq!(config.catalog.path, "signatures.json");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.scan.channel_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let mut config = Config::default();
        config.scan.max_parallel_jobs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("sigscan.json")).unwrap();
        std::fs::write(&path, r#"{"catalog": {"path": "/tmp/sigs.json"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.catalog.path, "/tmp/sigs.json");
        assert!(!config.scan.follow_links);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Utf8Path::new("/nonexistent/sigscan.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
