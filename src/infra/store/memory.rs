//! In-memory whitelist backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{StoreError, WhitelistBackend, WhitelistEntry};

#[derive(Default)]
struct Inner {
    document: Mutex<Option<Vec<WhitelistEntry>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Volatile backend for development and testing.
///
/// Clones share the same document, so a test can keep a handle after moving
/// one into the store.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

impl InMemoryBackend {
    /// Backend with no document, as on first start.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with a document.
    #[must_use]
    pub fn with_document(entries: Vec<WhitelistEntry>) -> Self {
        let backend = Self::new();
        *backend.inner.document.lock() = Some(entries);
        backend
    }

    /// Currently persisted document.
    #[must_use]
    pub fn document(&self) -> Option<Vec<WhitelistEntry>> {
        self.inner.document.lock().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::Acquire)
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::Release);
    }
}

impl WhitelistBackend for InMemoryBackend {
    fn load(&self) -> Result<Option<Vec<WhitelistEntry>>, StoreError> {
        Ok(self.document())
    }

    fn save(&self, entries: &[WhitelistEntry]) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::Acquire) {
            return Err(StoreError::Io {
                path: "<memory>".into(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        *self.inner.document.lock() = Some(entries.to_vec());
        self.inner.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
