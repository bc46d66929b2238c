//! FileStore: one JSON file per document inside a per-collection directory.
//!
//! Invariants:
//! - A document with id `X` lives at `<dir>/X.json`; there is no catalog file
//! - The directory listing is the only record of which documents exist
//! - Every write goes to its own `.X.*.tmp` file and is renamed into place, so
//!   a reader sees either the previous or the new document, never a partial one
//!   even when several writers race on the same id
//! - A file that vanishes between listing and loading reads as absent

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use common::{Document, DocumentId};
use tempfile::Builder;

use crate::error::{StorageError, StorageResult};
use crate::{DocumentStore, validate_id};

const DOC_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the collection directory, creating it if absent.
    pub fn open<P: AsRef<Path>>(dir: P) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|err| StorageError::io(&dir, err))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the collection directories under `root`, sorted. A missing
    /// root holds no collections.
    pub fn list_collections<P: AsRef<Path>>(root: P) -> StorageResult<Vec<String>> {
        let root = root.as_ref();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::io(root, err)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::io(root, err))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match path.file_name().and_then(|name| name.to_str()) {
                Some(name) if validate_id(name).is_ok() => names.push(name.to_string()),
                _ => log::warn!("skipping collection directory {}", path.display()),
            }
        }
        names.sort();
        Ok(names)
    }

    fn document_path(&self, id: &str) -> StorageResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.{}", id, DOC_EXTENSION)))
    }
}

impl DocumentStore for FileStore {
    fn put(&self, id: &str, document: &Document) -> StorageResult<()> {
        let path = self.document_path(id)?;
        let bytes = serde_json::to_vec(document).map_err(|source| StorageError::Corrupt {
            path: path.clone(),
            source,
        })?;
        let mut tmp = Builder::new()
            .prefix(&format!(".{}.", id))
            .suffix(TMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|err| StorageError::io(&self.dir, err))?;
        tmp.write_all(&bytes)
            .map_err(|err| StorageError::io(tmp.path(), err))?;
        tmp.persist(&path)
            .map_err(|err| StorageError::io(&path, err.error))?;
        Ok(())
    }

    fn ids(&self) -> StorageResult<Vec<DocumentId>> {
        let entries = fs::read_dir(&self.dir).map_err(|err| StorageError::io(&self.dir, err))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::io(&self.dir, err))?;
            let path = entry.path();
            // Skips in-flight `.X.*.tmp` writes too.
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOC_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => ids.push(stem.to_string()),
                None => log::warn!("skipping non utf-8 document file {}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn load(&self, id: &str) -> StorageResult<Option<Document>> {
        let path = self.document_path(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io(&path, err)),
        };
        let document = serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Corrupt { path, source })?;
        Ok(Some(document))
    }

    fn remove(&self, id: &str) -> StorageResult<bool> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::io(&path, err)),
        }
    }
}
