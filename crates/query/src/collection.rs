//! Coordinates a collection's document store with its secondary indexes.
//!
//! Documents are never cached here: every read goes to the store. Indexes
//! are in-memory only and advisory. `update` adds entries for keys that
//! changed but never removes old ones, and `delete` leaves entries behind,
//! so callers must re-check every document an index hands them.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use common::{Document, DocumentId, ID_FIELD, document_id};
use parking_lot::RwLock;
use serde_json::Value;
use storage::DocumentStore;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{QueryResult, malformed};
use crate::index::{BTreeIndex, IndexKey};

/// Field name to the value a predicate requires it to equal.
pub type FieldValues = BTreeMap<String, Value>;

/// Result of narrowing a lookup through an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    pub fields: Vec<String>,
    pub ids: Vec<DocumentId>,
}

pub struct Collection {
    name: String,
    store: Arc<dyn DocumentStore>,
    degree: usize,
    // Registration order; lookups use the first covering index.
    indexes: RwLock<Vec<Arc<BTreeIndex>>>,
}

impl Collection {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            name: name.into(),
            store,
            degree: config.btree_degree,
            indexes: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_fields(&self) -> Vec<Vec<String>> {
        self.indexes
            .read()
            .iter()
            .map(|index| index.fields().to_vec())
            .collect()
    }

    pub fn index(&self, fields: &[String]) -> Option<Arc<BTreeIndex>> {
        self.indexes
            .read()
            .iter()
            .find(|index| index.fields() == fields)
            .cloned()
    }

    /// Builds an index over `fields` and backfills it from every stored
    /// document. Returns `false` when an index on that exact field-set exists.
    ///
    /// The index-set write lock is held for the whole backfill, so a
    /// concurrent insert lands either before the scan or after registration.
    pub fn create_index(&self, fields: &[String]) -> QueryResult<bool> {
        if fields.iter().any(String::is_empty) {
            return malformed("index field names cannot be empty");
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = fields.iter().find(|field| !seen.insert(field.as_str())) {
            return malformed(format!("field {} listed twice in index", duplicate));
        }

        let mut indexes = self.indexes.write();
        if indexes.iter().any(|index| index.fields() == fields) {
            log::debug!("index {}({}) already exists", self.name, fields.join(", "));
            return Ok(false);
        }

        let index = BTreeIndex::new(fields.to_vec(), self.degree)?;
        let mut backfilled = 0;
        for id in self.store.ids()? {
            if let Some(document) = self.store.load(&id)? {
                index.insert(&document, &id);
                backfilled += 1;
            }
        }
        indexes.push(Arc::new(index));
        log::info!(
            "created index {}({}) over {} documents",
            self.name,
            fields.join(", "),
            backfilled
        );
        Ok(true)
    }

    /// Persists a document and adds it to every registered index, assigning a
    /// fresh `_id` when the document has none.
    pub fn insert(&self, mut document: Document) -> QueryResult<DocumentId> {
        let id = match (document_id(&document), document.get(ID_FIELD)) {
            (Some(id), _) => id.to_string(),
            (None, None | Some(Value::String(_))) => fresh_id(),
            (None, Some(other)) => {
                return malformed(format!("{} must be a string, got {}", ID_FIELD, other));
            }
        };
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let indexes = self.indexes.read();
        self.store.put(&id, &document)?;
        for index in indexes.iter() {
            index.insert(&document, &id);
        }
        Ok(id)
    }

    /// Looks the values up in the first index whose fields are all constrained.
    /// `None` means no index covers them and the caller has to scan.
    pub fn find_ids_by_index(&self, field_values: &FieldValues) -> Option<IndexHit> {
        let indexes = self.indexes.read();
        let index = indexes.iter().find(|index| {
            index
                .fields()
                .iter()
                .all(|field| field_values.contains_key(field))
        })?;
        let key = IndexKey::from_values(
            index
                .fields()
                .iter()
                .filter_map(|field| field_values.get(field)),
        );
        Some(IndexHit {
            fields: index.fields().to_vec(),
            ids: index.find(&key),
        })
    }

    /// Loads the given documents, or all of them when `ids` is `None`.
    /// Identifiers without a stored document are skipped.
    pub fn load_docs(&self, ids: Option<&[DocumentId]>) -> QueryResult<Vec<Document>> {
        Ok(self
            .load_entries(ids)?
            .into_iter()
            .map(|(_, document)| document)
            .collect())
    }

    /// Merges `updates` into every candidate matching `predicate` and
    /// re-persists it. Returns how many documents changed.
    pub fn update<F>(
        &self,
        updates: &Document,
        predicate: F,
        ids: Option<&[DocumentId]>,
    ) -> QueryResult<usize>
    where
        F: Fn(&Document) -> bool,
    {
        if updates.contains_key(ID_FIELD) {
            return malformed(format!("{} cannot be updated", ID_FIELD));
        }
        let indexes = self.indexes.read();
        let mut updated = 0;
        for (id, mut document) in self.load_entries(ids)? {
            if !predicate(&document) {
                continue;
            }
            let old_keys: Vec<IndexKey> = indexes
                .iter()
                .map(|index| index.key_for(&document))
                .collect();
            for (field, value) in updates {
                document.insert(field.clone(), value.clone());
            }
            self.store.put(&id, &document)?;
            for (index, old_key) in indexes.iter().zip(old_keys) {
                let new_key = index.key_for(&document);
                if new_key != old_key {
                    index.insert_key(new_key, id.clone());
                }
            }
            updated += 1;
        }
        Ok(updated)
    }

    /// Removes every candidate matching `predicate`. Returns how many were removed.
    pub fn delete<F>(&self, predicate: F, ids: Option<&[DocumentId]>) -> QueryResult<usize>
    where
        F: Fn(&Document) -> bool,
    {
        let mut removed = 0;
        for (id, document) in self.load_entries(ids)? {
            if predicate(&document) && self.store.remove(&id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn load_entries(&self, ids: Option<&[DocumentId]>) -> QueryResult<Vec<(DocumentId, Document)>> {
        let candidates: Vec<DocumentId> = match ids {
            Some(ids) => {
                let mut seen = HashSet::new();
                ids.iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            }
            None => self.store.ids()?,
        };
        let mut entries = Vec::with_capacity(candidates.len());
        for id in candidates {
            match self.store.load(&id)? {
                Some(document) => entries.push((id, document)),
                None => log::debug!("document {} vanished from {}", id, self.name),
            }
        }
        Ok(entries)
    }
}

fn fresh_id() -> DocumentId {
    Uuid::new_v4().simple().to_string()
}
