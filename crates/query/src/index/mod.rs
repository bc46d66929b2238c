mod btree;
mod key;

pub use btree::{BTreeIndex, MIN_DEGREE};
pub use key::{IndexKey, KeyPart};

#[cfg(test)]
mod tests;
