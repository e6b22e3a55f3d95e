//! File-backed persistence for [`Document`]s.
//!
//! # Defensive Loading
//!
//! A store file is only ever read as a whole. We handle:
//! - Missing file (default document)
//! - Empty file (default document)
//! - Corrupt JSON or wrong shape (default document, warning logged)
//! - Missing fields (serde defaults)
//!
//! Loading never fails; availability wins over strict integrity.
//!
//! # Atomic Writes
//!
//! Saves go to a temp file in the same directory which is then renamed over
//! the target, so a reader never sees a half-written document.
//!
//! # Read-Modify-Write
//!
//! [`DocumentStore::transact`] takes the advisory [`lock::StoreLock`], reloads
//! the file, applies the change and saves, so two processes bound to the same
//! file do not overwrite each other's updates.

pub mod lock;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs_err as fs;
use tempfile::NamedTempFile;

use crate::config::DEFAULT_LOCK_TIMEOUT_MS;
use crate::error::{Result, ShiftError};
use crate::types::Document;

use self::lock::StoreLock;

/// Reads a document, falling back to the default shape on any problem.
pub fn load_document(path: &Path) -> Document {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Document::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable store, using empty document");
            return Document::default();
        }
    };

    if content.trim().is_empty() {
        tracing::debug!(path = %path.display(), "Empty store file");
        return Document::default();
    }

    match serde_json::from_str::<Document>(&content) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Corrupt store, using empty document");
            Document::default()
        }
    }
}

/// Writes the whole document as pretty JSON, creating parent directories.
pub fn save_document(path: &Path, doc: &Document) -> Result<()> {
    let content = serde_json::to_string_pretty(doc).map_err(|e| ShiftError::Json {
        context: format!("serializing {}", path.display()),
        source: e,
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| ShiftError::Io {
        context: format!("creating {}", dir.display()),
        source: e,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ShiftError::Io {
        context: format!("creating temp file in {}", dir.display()),
        source: e,
    })?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| ShiftError::Io {
            context: format!("writing temp file for {}", path.display()),
            source: e,
        })?;
    tmp.flush().map_err(|e| ShiftError::Io {
        context: format!("flushing temp file for {}", path.display()),
        source: e,
    })?;
    tmp.persist(path).map_err(|e| ShiftError::Io {
        context: format!("persisting {}", path.display()),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), blockers = doc.blockers.len(), "Store saved");
    Ok(())
}

/// A document plus the file it belongs to.
///
/// Create with [`DocumentStore::load`] to bind to a file,
/// or [`DocumentStore::new_in_memory`] for tests.
#[derive(Debug)]
pub struct DocumentStore {
    doc: Document,
    file_path: Option<PathBuf>,
    lock_timeout: Duration,
}

impl DocumentStore {
    pub fn new_in_memory() -> Self {
        Self::from_document(Document::default())
    }

    pub fn from_document(doc: Document) -> Self {
        DocumentStore {
            doc,
            file_path: None,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    /// Binds to `file_path` without reading it.
    pub fn new(file_path: &Path) -> Self {
        DocumentStore {
            doc: Document::default(),
            file_path: Some(file_path.to_path_buf()),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    pub fn load(file_path: &Path) -> Self {
        DocumentStore {
            doc: load_document(file_path),
            file_path: Some(file_path.to_path_buf()),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Re-reads the bound file. No-op for in-memory stores.
    pub fn reload(&mut self) {
        if let Some(path) = &self.file_path {
            self.doc = load_document(path);
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = self.file_path.as_ref().ok_or(ShiftError::NoStorePath)?;
        save_document(path, &self.doc)
    }

    /// Applies `f` to the freshest copy of the document and persists it.
    ///
    /// When `f` fails nothing is written.
    pub fn transact<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let Some(path) = self.file_path.clone() else {
            let mut draft = self.doc.clone();
            let out = f(&mut draft)?;
            self.doc = draft;
            return Ok(out);
        };

        let _lock = StoreLock::acquire(&path, self.lock_timeout)?;
        let mut draft = load_document(&path);
        let out = match f(&mut draft) {
            Ok(out) => out,
            Err(e) => {
                // `draft` may be half-modified; keep the on-disk state instead.
                self.doc = load_document(&path);
                return Err(e);
            }
        };
        save_document(&path, &draft)?;
        self.doc = draft;
        Ok(out)
    }
}
