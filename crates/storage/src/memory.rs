use std::collections::BTreeMap;

use common::{Document, DocumentId};
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::{DocumentStore, validate_id};

/// In-process store with the same per-document semantics as `FileStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentId, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&self, id: &str, document: &Document) -> StorageResult<()> {
        validate_id(id)?;
        self.documents
            .write()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    fn ids(&self) -> StorageResult<Vec<DocumentId>> {
        Ok(self.documents.read().keys().cloned().collect())
    }

    fn load(&self, id: &str) -> StorageResult<Option<Document>> {
        validate_id(id)?;
        Ok(self.documents.read().get(id).cloned())
    }

    fn remove(&self, id: &str) -> StorageResult<bool> {
        validate_id(id)?;
        Ok(self.documents.write().remove(id).is_some())
    }
}
