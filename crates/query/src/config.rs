use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::index::MIN_DEGREE;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BTREE_DEGREE: usize = 16;

/// Startup settings handed explicitly to the catalog, collections and indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory; each collection is a subdirectory.
    pub data_dir: PathBuf,
    /// Minimum degree `t` of every index tree.
    pub btree_degree: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            btree_degree: DEFAULT_BTREE_DEGREE,
        }
    }
}

impl Config {
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_degree(mut self, btree_degree: usize) -> Self {
        self.btree_degree = btree_degree;
        self
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.btree_degree < MIN_DEGREE {
            return Err(QueryError::InvalidConfig(format!(
                "btree degree must be at least {}, got {}",
                MIN_DEGREE, self.btree_degree
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"btree_degree": 4}"#).unwrap();
        assert_eq!(config.btree_degree, 4);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn degree_below_two_is_rejected() {
        assert!(Config::default().validate().is_ok());
        let config = Config::default().with_degree(1);
        assert!(matches!(config.validate(), Err(QueryError::InvalidConfig(_))));
    }
}
