use std::fmt;

use common::{Document, DocumentId};
use serde_json::{Value, json};

use super::catalog::Catalog;
use crate::collection::Collection;
use crate::error::QueryResult;
use crate::request::{Predicate, Request};

/// How the candidate documents of a request are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPath {
    /// Narrowed to one index bucket. The ids may be stale and are re-checked.
    IndexLookup {
        fields: Vec<String>,
        ids: Vec<DocumentId>,
    },
    FullScan,
}

impl AccessPath {
    pub fn candidate_ids(&self) -> Option<&[DocumentId]> {
        match self {
            AccessPath::IndexLookup { ids, .. } => Some(ids),
            AccessPath::FullScan => None,
        }
    }

    pub fn is_index_lookup(&self) -> bool {
        matches!(self, AccessPath::IndexLookup { .. })
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPath::IndexLookup { fields, ids } => write!(
                f,
                "index lookup on ({}) with {} candidates",
                fields.join(", "),
                ids.len()
            ),
            AccessPath::FullScan => write!(f, "full scan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Inserted(DocumentId),
    IndexCreated,
    Documents(Vec<Document>),
    Updated(usize),
    Deleted(usize),
}

impl QueryOutput {
    /// The response body handed back to clients.
    pub fn to_json(&self) -> Value {
        match self {
            QueryOutput::Inserted(id) => json!({"_id": id}),
            QueryOutput::IndexCreated => json!({"status": "index created"}),
            QueryOutput::Documents(documents) => Value::Array(
                documents
                    .iter()
                    .cloned()
                    .map(Value::Object)
                    .collect(),
            ),
            QueryOutput::Updated(count) => json!({"updated": count}),
            QueryOutput::Deleted(count) => json!({"removed": count}),
        }
    }
}

pub struct Executor<'a> {
    catalog: &'a Catalog,
}

impl<'a> Executor<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn execute(&self, request: Request) -> QueryResult<QueryOutput> {
        let collection = self.catalog.collection(request.collection())?;
        match request {
            Request::Insert { document, .. } => {
                let id = collection.insert(document)?;
                Ok(QueryOutput::Inserted(id))
            }
            Request::CreateIndex { fields, .. } => {
                collection.create_index(&fields)?;
                Ok(QueryOutput::IndexCreated)
            }
            Request::Select {
                fields, predicate, ..
            } => {
                let predicate = predicate.unwrap_or_default();
                let path = self.access_path(&collection, &predicate);
                let documents = collection
                    .load_docs(path.candidate_ids())?
                    .into_iter()
                    .filter(|document| predicate.matches(document))
                    .map(|document| fields.apply(document))
                    .collect();
                Ok(QueryOutput::Documents(documents))
            }
            Request::Update {
                sets, predicate, ..
            } => {
                let predicate = predicate.unwrap_or_default();
                let path = self.access_path(&collection, &predicate);
                let updated = collection.update(
                    &sets,
                    |document| predicate.matches(document),
                    path.candidate_ids(),
                )?;
                Ok(QueryOutput::Updated(updated))
            }
            Request::Delete { predicate, .. } => {
                let predicate = predicate.unwrap_or_default();
                let path = self.access_path(&collection, &predicate);
                let removed =
                    collection.delete(|document| predicate.matches(document), path.candidate_ids())?;
                Ok(QueryOutput::Deleted(removed))
            }
        }
    }

    /// Picks the index lookup when a registered index is covered by the
    /// predicate's constrained fields, otherwise a full scan.
    pub fn access_path(&self, collection: &Collection, predicate: &Predicate) -> AccessPath {
        let constrained = predicate.constrained_fields();
        let path = if constrained.is_empty() {
            AccessPath::FullScan
        } else {
            match collection.find_ids_by_index(&constrained) {
                Some(hit) => AccessPath::IndexLookup {
                    fields: hit.fields,
                    ids: hit.ids,
                },
                None => AccessPath::FullScan,
            }
        };
        log::debug!("{} where [{}]: {}", collection.name(), predicate, path);
        path
    }
}
