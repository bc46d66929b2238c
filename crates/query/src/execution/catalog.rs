use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use storage::{DocumentStore, FileStore, MemoryStore, validate_id};

use crate::collection::Collection;
use crate::config::Config;
use crate::error::QueryResult;

/// Opens the store backing a named collection.
pub type StoreOpener = Box<dyn Fn(&str) -> QueryResult<Arc<dyn DocumentStore>> + Send + Sync>;

/// Registry of live collections. A collection is created on first use and
/// kept for the catalog's lifetime, so its indexes outlive single requests.
pub struct Catalog {
    config: Config,
    opener: StoreOpener,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Catalog {
    pub fn new(config: Config, opener: StoreOpener) -> QueryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            opener,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// File-backed catalog rooted at `config.data_dir`, one directory per
    /// collection. Collections already on disk are registered up front.
    pub fn open_dir(config: Config) -> QueryResult<Self> {
        let root = config.data_dir.clone();
        let existing = FileStore::list_collections(&root)?;
        let opener: StoreOpener = Box::new(move |name: &str| {
            let store: Arc<dyn DocumentStore> = Arc::new(FileStore::open(root.join(name))?);
            Ok(store)
        });
        let catalog = Self::new(config, opener)?;
        for name in &existing {
            catalog.collection(name)?;
        }
        log::info!(
            "opened {} with {} collections",
            catalog.config.data_dir.display(),
            existing.len()
        );
        Ok(catalog)
    }

    /// Catalog whose collections live in process memory only.
    pub fn in_memory(config: Config) -> QueryResult<Self> {
        Self::new(
            config,
            Box::new(|_: &str| {
                let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
                Ok(store)
            }),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the named collection, creating it if this is its first use.
    pub fn collection(&self, name: &str) -> QueryResult<Arc<Collection>> {
        if let Some(collection) = self.get(name) {
            return Ok(collection);
        }
        validate_id(name)?;
        let mut collections = self.collections.write();
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }
        let store = (self.opener)(name)?;
        let collection = Arc::new(Collection::new(name, store, &self.config));
        collections.insert(name.to_string(), Arc::clone(&collection));
        log::debug!("registered collection {}", name);
        Ok(collection)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
