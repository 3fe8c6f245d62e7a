//! File-backed whitelist using one JSON array document.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{StoreError, WhitelistBackend, WhitelistEntry};

/// JSON document on disk, replaced wholesale on every save.
///
/// Saves go through a sibling temp file that is renamed over the document, so
/// readers never observe a half-written array.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Backend persisting to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Document location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the document with `.tmp` appended to the full file name, so
    /// it never coincides with the document itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("whitelist"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl WhitelistBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<Vec<WhitelistEntry>>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let entries = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &[WhitelistEntry]) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path).map_err(|e| self.io_error(e))?;
        file.write_all(body.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(e))?;
        drop(file);
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), entries = entries.len(), "whitelist document written");
        Ok(())
    }
}
