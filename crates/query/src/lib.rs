pub mod collection;
pub mod config;
pub mod error;
pub mod execution;
pub mod index;
pub mod parser;
pub mod request;

pub use collection::{Collection, FieldValues, IndexHit};
pub use config::Config;
pub use error::{QueryError, QueryResult};
pub use execution::{AccessPath, Catalog, Executor, QueryOutput, StoreOpener};
pub use index::{BTreeIndex, IndexKey, KeyPart};
pub use parser::QueryParser;
pub use request::{Clause, Predicate, Projection, Request};

/// Parses one textual statement into a structured request.
pub fn parse_request(text: &str) -> QueryResult<Request> {
    QueryParser::new().parse(text)
}
