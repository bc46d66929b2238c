use std::cmp::Ordering;
use std::fmt;

use common::{Document, canonical_text, field_value};
use serde_json::Value;

/// One component of a compound key.
///
/// A part is the canonical text of a field value, the same text equality
/// predicates compare, so an index lookup and a full scan agree on which
/// documents match. Parts whose text reads as a number order numerically
/// and come before all other parts, which order lexicographically.
#[derive(Debug, Clone)]
pub struct KeyPart {
    text: String,
    number: Option<f64>,
}

impl KeyPart {
    pub fn from_value(value: &Value) -> Self {
        Self::from_text(canonical_text(value))
    }

    pub fn from_text(text: String) -> Self {
        let number = text.parse::<f64>().ok();
        Self { text, number }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for KeyPart {}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(left), Some(right)) => left
                .total_cmp(&right)
                .then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Ordered tuple of key parts, one per field of an index's field-set,
/// compared componentwise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexKey(Vec<KeyPart>);

impl IndexKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Extracts the key for `fields` from a document; missing fields read as null.
    pub fn from_document(document: &Document, fields: &[String]) -> Self {
        Self(
            fields
                .iter()
                .map(|field| KeyPart::from_value(field_value(document, field)))
                .collect(),
        )
    }

    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        Self(values.into_iter().map(KeyPart::from_value).collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self
            .0
            .iter()
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({})", inner)
    }
}
