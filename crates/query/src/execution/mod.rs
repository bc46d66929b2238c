pub mod catalog;
pub mod executor;

pub use catalog::{Catalog, StoreOpener};
pub use executor::{AccessPath, Executor, QueryOutput};
