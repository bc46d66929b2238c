use std::fmt;

use common::{Document, canonical_text, field_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::FieldValues;

/// Structured request produced by the parsing front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Insert {
        collection: String,
        document: Document,
    },
    CreateIndex {
        collection: String,
        fields: Vec<String>,
    },
    Select {
        collection: String,
        fields: Projection,
        predicate: Option<Predicate>,
    },
    Update {
        collection: String,
        sets: Document,
        predicate: Option<Predicate>,
    },
    Delete {
        collection: String,
        predicate: Option<Predicate>,
    },
}

impl Request {
    pub fn collection(&self) -> &str {
        match self {
            Request::Insert { collection, .. }
            | Request::CreateIndex { collection, .. }
            | Request::Select { collection, .. }
            | Request::Update { collection, .. }
            | Request::Delete { collection, .. } => collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    All,
    Fields(Vec<String>),
}

impl Projection {
    /// Keeps only the requested fields; a requested field the document lacks
    /// comes back as an explicit null.
    pub fn apply(&self, document: Document) -> Document {
        match self {
            Projection::All => document,
            Projection::Fields(fields) => fields
                .iter()
                .map(|field| (field.clone(), field_value(&document, field).clone()))
                .collect(),
        }
    }
}

/// `field = literal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub literal: Value,
}

impl Clause {
    pub fn new(field: impl Into<String>, literal: Value) -> Self {
        Self {
            field: field.into(),
            literal,
        }
    }

    /// Compares the textual forms, so `age = '30'` matches a numeric 30.
    pub fn matches(&self, document: &Document) -> bool {
        canonical_text(field_value(document, &self.field)) == canonical_text(&self.literal)
    }
}

/// Conjunction of equality clauses. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn eq(field: impl Into<String>, literal: Value) -> Self {
        Self::new(vec![Clause::new(field, literal)])
    }

    pub fn and(mut self, field: impl Into<String>, literal: Value) -> Self {
        self.clauses.push(Clause::new(field, literal));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }

    /// Constrained fields with their literals; the first clause on a field wins.
    pub fn constrained_fields(&self) -> FieldValues {
        let mut fields = FieldValues::new();
        for clause in &self.clauses {
            fields
                .entry(clause.field.clone())
                .or_insert_with(|| clause.literal.clone());
        }
        fields
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .clauses
            .iter()
            .map(|clause| format!("{} = {}", clause.field, clause.literal))
            .collect::<Vec<_>>()
            .join(" AND ");
        write!(f, "{}", rendered)
    }
}
