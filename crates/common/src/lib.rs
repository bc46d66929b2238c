//! Document model shared by the storage and query layers.

use serde_json::{Map, Value};

/// A stored document: field name to JSON value.
pub type Document = Map<String, Value>;

/// Identifier of a document, unique within its collection.
pub type DocumentId = String;

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

static NULL: Value = Value::Null;

/// Returns the document's identifier when it carries a non-empty string `_id`.
pub fn document_id(document: &Document) -> Option<&str> {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
        _ => None,
    }
}

/// Looks up a field, treating a missing field as null.
pub fn field_value<'a>(document: &'a Document, field: &str) -> &'a Value {
    document.get(field).unwrap_or(&NULL)
}

/// Textual form of a value used for equality predicates and index keys.
///
/// Strings render without quotes, so `'30'` and `30` compare equal.
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
