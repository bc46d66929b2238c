use anyhow::{Context, Result};
use query::{Catalog, Config, Executor, QueryOutput, QueryParser, Request};

/// One open document database: the collection catalog plus the statement
/// parser. Collections and their indexes live as long as the engine.
pub struct Engine {
    catalog: Catalog,
    parser: QueryParser,
}

impl Engine {
    /// Opens the file-backed database under `config.data_dir`.
    pub fn open(config: Config) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        let catalog = Catalog::open_dir(config)
            .with_context(|| format!("open data directory {}", data_dir.display()))?;
        Ok(Self::with_catalog(catalog))
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let catalog = Catalog::in_memory(config).context("create in-memory catalog")?;
        Ok(Self::with_catalog(catalog))
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            parser: QueryParser::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.catalog.config()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Parses and runs a single statement.
    pub fn execute(&self, text: &str) -> Result<QueryOutput> {
        let request = self.parser.parse(text)?;
        self.execute_request(request)
    }

    pub fn execute_request(&self, request: Request) -> Result<QueryOutput> {
        let collection = request.collection().to_string();
        Executor::new(&self.catalog)
            .execute(request)
            .with_context(|| format!("on collection {}", collection))
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.catalog.collection_names()
    }

    /// Field-sets of the indexes on `collection`, `None` for an unknown collection.
    pub fn index_fields(&self, collection: &str) -> Option<Vec<Vec<String>>> {
        self.catalog
            .get(collection)
            .map(|collection| collection.index_fields())
    }
}
