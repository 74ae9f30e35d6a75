//! Storage boundary for the three calendar payloads of a property.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Resolved output.
    Master,
    /// Deduplicated reservations and buffers; the fallback when every feed fails.
    Import,
    /// Operator directives.
    Manual,
}

impl StoreKey {
    pub fn file_name(self) -> &'static str {
        match self {
            StoreKey::Master => "master_calendar.ics",
            StoreKey::Import => "import_calendar.ics",
            StoreKey::Manual => "manual_calendar.ics",
        }
    }
}

/// Load/store of whole payloads. `store` must be all-or-nothing.
pub trait CalendarStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn load(&self, key: StoreKey) -> Result<Option<Vec<u8>>>;

    fn store(&self, key: StoreKey, bytes: &[u8]) -> Result<()>;

    /// Drop whatever is stored under `key`. Removing an absent key is not an error.
    fn remove(&self, key: StoreKey) -> Result<()>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl CalendarStore for FileStore {
    fn load(&self, key: StoreKey) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Storage(format!("{}: {e}", path.display()))),
        }
    }

    fn store(&self, key: StoreKey, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        atomic_write(&path, bytes)
            .map_err(|e| SyncError::Storage(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored calendar");
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Storage(format!("{}: {e}", path.display()))),
        }
    }
}

/// Write through a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// In-process store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalendarStore for MemoryStore {
    fn load(&self, key: StoreKey) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| SyncError::Storage("memory store poisoned".to_string()))?;
        Ok(entries.get(&key).cloned())
    }

    fn store(&self, key: StoreKey, bytes: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SyncError::Storage("memory store poisoned".to_string()))?;
        entries.insert(key, bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SyncError::Storage("memory store poisoned".to_string()))?;
        entries.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/master_calendar.ics");
        atomic_write(&path, b"BEGIN:VCALENDAR").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"BEGIN:VCALENDAR");
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.ics");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        // No temp files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.load(StoreKey::Manual).unwrap(), None);
        store.store(StoreKey::Manual, b"x").unwrap();
        assert_eq!(store.load(StoreKey::Manual).unwrap(), Some(b"x".to_vec()));
        store.remove(StoreKey::Manual).unwrap();
        store.remove(StoreKey::Manual).unwrap();
        assert_eq!(store.load(StoreKey::Manual).unwrap(), None);
    }
}
