//! Staging store for batched index construction
//!
//! The builder writes one artifact per (index kind, batch) plus a manifest,
//! then reads them back to merge. A store is scoped to a single build run:
//! two concurrent builds must use two stores.
//!
//! - [`FsStaging`]: a unique directory per build run (`quarry-staging-<uuid>`)
//! - [`MemoryStaging`]: a map in memory, for tests and ephemeral use

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Key-addressable write/read/delete facility scoped to one build run.
pub trait StagingStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value.
    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Read the bytes stored under `key`.
    fn get(&self, key: &str) -> io::Result<Vec<u8>>;

    /// Delete every artifact of this build run.
    fn remove_all(&self) -> io::Result<()>;
}

// ============================================================================
// FsStaging
// ============================================================================

/// Directory-backed staging.
///
/// Each value is written to `<key>.tmp` and renamed into place, so a reader
/// never observes a half-written artifact.
#[derive(Debug)]
pub struct FsStaging {
    dir: PathBuf,
}

impl FsStaging {
    /// Create a fresh, uniquely named directory under `root`.
    pub fn create(root: &Path) -> io::Result<Self> {
        let dir = root.join(format!("quarry-staging-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&dir)?;
        Ok(FsStaging { dir })
    }

    /// Directory holding this run's artifacts
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        debug_assert!(!key.contains(['/', '\\']), "staging keys are flat");
        self.dir.join(format!("{}.qseg", key))
    }
}

impl StagingStore for FsStaging {
    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.key_path(key);
        let tmp_path = path.with_extension("qseg.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(bytes)?;
        }
        fs::rename(&tmp_path, &path)
    }

    fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.key_path(key))
    }

    fn remove_all(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

// ============================================================================
// MemoryStaging
// ============================================================================

/// In-memory staging. Does not bound memory; meant for tests and small sets.
#[derive(Debug, Default)]
pub struct MemoryStaging {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStaging {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StagingStore for MemoryStaging {
    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries.lock().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        self.entries.lock().get(key).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("staged artifact '{}' not found", key),
            )
        })
    }

    fn remove_all(&self) -> io::Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}
