// MODULE DECLARATIONS
mod disk;
mod error;
mod memory;

// PUBLIC API EXPORTS
// The query layer only sees the DocumentStore trait; the engine picks an implementation.
pub use disk::FileStore;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

use common::{Document, DocumentId};

/// Per-collection persistence keyed by document identifier.
///
/// Operations are atomic per document and uncoordinated across documents:
/// a document listed by `ids` may be gone by the time it is loaded.
pub trait DocumentStore: Send + Sync {
    /// Creates or overwrites the document stored under `id`.
    fn put(&self, id: &str, document: &Document) -> StorageResult<()>;

    /// Lists every stored identifier in ascending order.
    fn ids(&self) -> StorageResult<Vec<DocumentId>>;

    /// Loads a document, `None` when nothing is stored under `id`.
    fn load(&self, id: &str) -> StorageResult<Option<Document>>;

    /// Removes a document, returning whether one existed.
    fn remove(&self, id: &str) -> StorageResult<bool>;
}

/// Rejects identifiers that cannot name a single file inside a collection directory.
pub fn validate_id(id: &str) -> StorageResult<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_id_rejects_path_like_ids() {
        assert!(validate_id("abc-123").is_ok());
        assert!(validate_id("user_7.v2").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_id(bad), Err(StorageError::InvalidId(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
