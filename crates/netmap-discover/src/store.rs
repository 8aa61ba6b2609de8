//! Topology store: the single current snapshot and its on-disk copy.
//!
//! The snapshot is kept in memory behind a lock and mirrored to one JSON
//! document. Writes go to a sibling temporary file that is renamed over the
//! canonical path, so a reader of the file sees either the previous or the
//! new document, never a partial one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use netmap_core::Snapshot;

use crate::error::StoreError;

/// Holds the most recent scan outcome.
///
/// Shared between the polling task (the only writer) and request handlers.
/// File I/O happens outside the snapshot lock, so readers only ever wait for
/// a pointer swap.
pub struct TopologyStore {
    path: Option<PathBuf>,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes writers so file order matches memory order.
    persist: Mutex<()>,
}

impl TopologyStore {
    /// Open a store persisted at `path`, loading the document left by a
    /// previous run if there is one.
    ///
    /// An unreadable document is logged and ignored; the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match load(&path) {
            Ok(Some(snapshot)) => {
                tracing::info!(path = %path.display(), "Loaded persisted topology");
                Some(Arc::new(snapshot))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable topology file");
                None
            }
        };

        Self {
            path: Some(path),
            current: RwLock::new(current),
            persist: Mutex::new(()),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
            persist: Mutex::new(()),
        }
    }

    /// Canonical path of the persisted document, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The last stored snapshot, or `None` if nothing was ever stored.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current snapshot and persist it.
    ///
    /// The in-memory snapshot is replaced even when persisting fails; the
    /// error is returned so the caller can report it.
    pub fn set(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        if let Some(topology) = snapshot.topology() {
            let dangling = topology.dangling_connections().count();
            if dangling > 0 {
                tracing::warn!(dangling, "Snapshot has connections to unknown devices");
            }
        }

        let json = serde_json::to_vec(&snapshot)?;
        let snapshot = Arc::new(snapshot);

        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        let persisted = match &self.path {
            Some(path) => write_atomic(path, &json),
            None => Ok(()),
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);

        if let (Ok(()), Some(path)) = (&persisted, &self.path) {
            tracing::debug!(path = %path.display(), bytes = json.len(), "Topology persisted");
        }
        persisted
    }
}

/// Read a persisted snapshot. A missing file is `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<Snapshot>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let tmp = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()
    };
    write().map_err(|e| io_error(&tmp, e))?;

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("topology"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
