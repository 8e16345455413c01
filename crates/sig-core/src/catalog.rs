//! Durable, ordered catalog of signature records.
//!
//! The [`CatalogStore`] owns the list of known signatures and the file it is
//! persisted to. Memory and disk are reconciled only when the store is
//! opened and on each [`add`](CatalogStore::add); every addition rewrites the
//! whole catalog.
//!
//! # File Format
//!
//! The catalog is a versioned JSON document:
//!
//! ```text
//! {
//!   "version": 1,
//!   "signatures": [
//!     { "name": "PDF Document", "pattern": "25 50 44 46 2D", "extension": "pdf" }
//!   ]
//! }
//! ```
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the target,
//! so an interrupted write never leaves a truncated catalog behind.
//!
//! # Examples
//!
//! ```no_run
//! use sig_core::CatalogStore;
//!
//! let mut store = CatalogStore::open_default();
//! store.add_hex("GIF Image", "47 49 46 38", "gif")?;
//!
//! for (index, sig) in store.list().iter().enumerate() {
//!     println!("{index}: {} (.{})", sig.name(), sig.extension());
//! }
//! # Ok::<(), sig_core::CatalogError>(())
//! ```

use std::fs::{self, File};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::hex;
use crate::types::SignatureRecord;

/// Catalog file name used by [`CatalogStore::open_default`].
pub const DEFAULT_CATALOG_FILE: &str = "signatures.json";

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CatalogFileRef<'a> {
    version: u32,
    signatures: &'a [SignatureRecord],
}

#[derive(Deserialize)]
struct CatalogFile {
    version: u32,
    signatures: Vec<SignatureRecord>,
}

/// Reasons a persisted catalog was replaced by the defaults.
#[derive(Debug, thiserror::Error)]
enum LoadFallback {
    #[error("catalog file not found")]
    Missing,

    #[error("catalog file unreadable: {0}")]
    Unreadable(#[source] io::Error),

    #[error("catalog file corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("unsupported catalog format version {0}")]
    UnsupportedVersion(u32),
}

/// The ordered signature catalog and its backing file.
///
/// Index order is insertion order and is stable, since callers select
/// signatures by position.
///
/// # Examples
///
/// ```no_run
/// use sig_core::CatalogStore;
///
/// let store = CatalogStore::open("signatures.json");
/// let pdf = store.get(0).expect("defaults include PDF");
/// assert_eq!(pdf.extension(), "pdf");
/// ```
#[derive(Debug)]
pub struct CatalogStore {
    /// Location of the persisted catalog.
    path: Utf8PathBuf,
    /// Records in insertion order.
    signatures: Vec<SignatureRecord>,
}

impl CatalogStore {
    /// Opens the catalog at `path`, falling back to the built-in defaults.
    ///
    /// If the file is absent, unreadable, not valid JSON, or written in an
    /// unknown format version, the store is populated with [`defaults`] and
    /// the defaults are written out immediately. This never fails: a failure
    /// to write the defaults is logged and the store is returned anyway.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();

        match load(&path) {
            Ok(signatures) => {
                info!(path = %path, count = signatures.len(), "Loaded signature catalog");
                Self { path, signatures }
            }
            Err(reason) => {
                match &reason {
                    LoadFallback::Missing => {
                        info!(path = %path, "Signature catalog not found, creating defaults");
                    }
                    other => {
                        warn!(path = %path, error = %other, "Signature catalog unusable, resetting to defaults");
                    }
                }

                let store = Self {
                    path,
                    signatures: defaults(),
                };
                if let Err(e) = store.persist() {
                    warn!(error = %e, "Failed to save default signature catalog");
                }
                store
            }
        }
    }

    /// Opens the catalog at [`DEFAULT_CATALOG_FILE`] in the working directory.
    pub fn open_default() -> Self {
        Self::open(DEFAULT_CATALOG_FILE)
    }

    /// Appends a record and rewrites the whole catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Persist`] if the write fails. The record stays
    /// in memory regardless, so the file lags behind until the next
    /// successful write.
    pub fn add(&mut self, record: SignatureRecord) -> Result<(), CatalogError> {
        debug!(name = record.name(), pattern = %record.pattern_hex(), "Adding signature");
        self.signatures.push(record);
        self.persist()
    }

    /// Parses `pattern` as hex text and appends the resulting record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] without touching the catalog if the
    /// pattern is malformed, or [`CatalogError::Persist`] as for
    /// [`add`](Self::add).
    pub fn add_hex(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        extension: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let bytes = hex::parse_pattern(pattern)?;
        self.add(SignatureRecord::new(name, bytes, extension))
    }

    /// Returns a copy of all records in catalog order.
    #[must_use]
    pub fn list(&self) -> Vec<SignatureRecord> {
        self.signatures.clone()
    }

    /// Returns a copy of the record at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<SignatureRecord> {
        self.signatures.get(index).cloned()
    }

    /// Iterates over the records without copying them.
    pub fn iter(&self) -> impl Iterator<Item = &SignatureRecord> {
        self.signatures.iter()
    }

    /// Returns the number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Returns `true` if the catalog holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Returns the path of the backing file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn persist(&self) -> Result<(), CatalogError> {
        let document = CatalogFileRef {
            version: FORMAT_VERSION,
            signatures: &self.signatures,
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| CatalogError::persist(&self.path, io::Error::other(e)))?;

        write_atomic(&self.path, &bytes).map_err(|e| CatalogError::persist(&self.path, e))?;

        debug!(path = %self.path, count = self.signatures.len(), "Saved signature catalog");
        Ok(())
    }
}

/// Returns the built-in catalog used when no usable file exists.
///
/// # Examples
///
/// ```
/// let defaults = sig_core::catalog::defaults();
/// let extensions: Vec<_> = defaults.iter().map(|s| s.extension()).collect();
/// assert_eq!(extensions, ["pdf", "png", "jpg", "zip"]);
/// ```
#[must_use]
pub fn defaults() -> Vec<SignatureRecord> {
    vec![
        SignatureRecord::new("PDF Document", vec![0x25, 0x50, 0x44, 0x46, 0x2D], "pdf"),
        SignatureRecord::new(
            "PNG Image",
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            "png",
        ),
        SignatureRecord::new("JPEG Image", vec![0xFF, 0xD8, 0xFF], "jpg"),
        SignatureRecord::new("ZIP Archive", vec![0x50, 0x4B, 0x03, 0x04], "zip"),
    ]
}

fn load(path: &Utf8Path) -> Result<Vec<SignatureRecord>, LoadFallback> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadFallback::Missing,
        _ => LoadFallback::Unreadable(e),
    })?;

    let file: CatalogFile = serde_json::from_slice(&bytes).map_err(LoadFallback::Corrupt)?;
    if file.version != FORMAT_VERSION {
        return Err(LoadFallback::UnsupportedVersion(file.version));
    }

    Ok(file.signatures)
}

fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = Utf8PathBuf::from(format!("{path}.tmp"));
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    match written.and_then(|()| fs::rename(&tmp, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(DEFAULT_CATALOG_FILE)).unwrap()
    }

    #[test]
    fn test_open_missing_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);

        let store = CatalogStore::open(&path);
        assert_eq!(store.list(), defaults());
        assert!(path.exists(), "defaults should be persisted immediately");

        let reopened = CatalogStore::open(&path);
        assert_eq!(reopened.list(), defaults());
    }

    #[test]
    fn test_default_patterns() {
        let sigs = defaults();
        assert_eq!(sigs.len(), 4);
        assert_eq!(sigs[0].pattern_hex(), "25 50 44 46 2D");
        assert_eq!(sigs[1].pattern_hex(), "89 50 4E 47 0D 0A 1A 0A");
        assert_eq!(sigs[2].pattern_hex(), "FF D8 FF");
        assert_eq!(sigs[3].pattern_hex(), "50 4B 03 04");
    }

    #[test]
    fn test_open_corrupt_resets_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        fs::write(&path, b"\xAC\xED\x00\x05 not json").unwrap();

        let store = CatalogStore::open(&path);
        assert_eq!(store.list(), defaults());

        // The corrupt file was replaced by a readable one
        assert_eq!(load(&path).unwrap(), defaults());
    }

    #[test]
    fn test_open_unsupported_version_resets_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        fs::write(&path, r#"{"version": 99, "signatures": []}"#).unwrap();

        let store = CatalogStore::open(&path);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_add_appends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        let mut store = CatalogStore::open(&path);
        let before = store.list();

        let gif = SignatureRecord::new("GIF Image", vec![0x47, 0x49, 0x46, 0x38], "gif");
        store.add(gif.clone()).unwrap();

        let mut expected = before;
        expected.push(gif);
        assert_eq!(store.list(), expected);
        assert_eq!(CatalogStore::open(&path).list(), expected);
    }

    #[test]
    fn test_roundtrip_preserves_nul_bytes_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        let mut store = CatalogStore::open(&path);

        store
            .add(SignatureRecord::new("nul", vec![0x00, 0x00, 0x01], "bin"))
            .unwrap();
        store
            .add(SignatureRecord::new("all-ff", vec![0xFF; 4], ""))
            .unwrap();

        let reopened = CatalogStore::open(&path);
        assert_eq!(reopened.list(), store.list());
        assert_eq!(reopened.get(4).unwrap().pattern(), &[0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_add_hex_invalid_leaves_catalog_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        let mut store = CatalogStore::open(&path);
        let on_disk = fs::read(&path).unwrap();

        let err = store.add_hex("bad", "zz 50", "bad").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
        assert_eq!(store.len(), 4);
        assert_eq!(fs::read(&path).unwrap(), on_disk);
    }

    #[test]
    fn test_add_hex_valid() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CatalogStore::open(catalog_path(&dir));

        store.add_hex("GZIP", "1f 8b", "gz").unwrap();
        let last = store.get(store.len() - 1).unwrap();
        assert_eq!(last.pattern(), &[0x1F, 0x8B]);
        assert_eq!(last.extension(), "gz");
    }

    #[test]
    fn test_persist_failure_keeps_in_memory_append() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"a file, not a directory").unwrap();
        let path = Utf8PathBuf::from_path_buf(blocker.join(DEFAULT_CATALOG_FILE)).unwrap();

        let mut store = CatalogStore::open(&path);
        assert_eq!(store.len(), 4);

        let err = store
            .add(SignatureRecord::new("x", vec![0x01], "x"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Persist { .. }));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_list_is_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::open(catalog_path(&dir));

        let mut listed = store.list();
        listed.clear();
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_get_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::open(catalog_path(&dir));
        assert!(store.get(4).is_none());
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(&dir);
        let _store = CatalogStore::open(&path);
        assert!(!Utf8PathBuf::from(format!("{path}.tmp")).exists());
    }
}
