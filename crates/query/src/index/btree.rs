//! Multiway search tree mapping compound keys to buckets of document ids.
//!
//! Buckets live in leaves only; internal nodes hold separator keys.
//!
//! Split convention (degree `t`, a full node holds `2t - 1` keys):
//! - leaf: the node keeps its lower `t - 1` keys and buckets, the new sibling
//!   takes the upper `t`, and a copy of the sibling's first key is promoted
//! - internal: the node keeps its lower `t - 1` keys and `t` children, the
//!   sibling takes the upper `t - 1` keys and `t` children, and the median
//!   key moves up into the parent
//!
//! Keys equal to a separator route right, both when searching and when
//! inserting, so every key in `children[i]` lies in `[keys[i - 1], keys[i])`.
//!
//! Inserts split full nodes on the way down, so a node is never entered while
//! full. Readers and writers share one `RwLock`: `find` never observes a node
//! mid-split.

use common::{Document, DocumentId};
use parking_lot::RwLock;

use super::key::IndexKey;
use crate::error::{QueryError, QueryResult};

pub const MIN_DEGREE: usize = 2;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        keys: Vec<IndexKey>,
        buckets: Vec<Vec<DocumentId>>,
    },
    Internal {
        keys: Vec<IndexKey>,
        children: Vec<Node>,
    },
}

impl Node {
    fn empty_leaf() -> Self {
        Node::Leaf {
            keys: Vec::new(),
            buckets: Vec::new(),
        }
    }

    fn keys(&self) -> &[IndexKey] {
        match self {
            Node::Leaf { keys, .. } | Node::Internal { keys, .. } => keys,
        }
    }

    fn is_full(&self, degree: usize) -> bool {
        self.keys().len() >= max_keys(degree)
    }

    /// Splits a full node in place, returning the key to promote and the new
    /// right sibling.
    fn split_off(&mut self, degree: usize) -> (IndexKey, Node) {
        match self {
            Node::Leaf { keys, buckets } => {
                let upper_keys = keys.split_off(degree - 1);
                let upper_buckets = buckets.split_off(degree - 1);
                let separator = upper_keys[0].clone();
                let sibling = Node::Leaf {
                    keys: upper_keys,
                    buckets: upper_buckets,
                };
                (separator, sibling)
            }
            Node::Internal { keys, children } => {
                let mut upper_keys = keys.split_off(degree - 1);
                let separator = upper_keys.remove(0);
                let upper_children = children.split_off(degree);
                let sibling = Node::Internal {
                    keys: upper_keys,
                    children: upper_children,
                };
                (separator, sibling)
            }
        }
    }
}

fn max_keys(degree: usize) -> usize {
    2 * degree - 1
}

/// Splits `children[index]`, which must be full, and links the sibling at
/// `index + 1` with the promoted key at `keys[index]`.
fn split_child(keys: &mut Vec<IndexKey>, children: &mut Vec<Node>, index: usize, degree: usize) {
    let (separator, sibling) = children[index].split_off(degree);
    keys.insert(index, separator);
    children.insert(index + 1, sibling);
}

fn insert_non_full(node: &mut Node, key: IndexKey, id: DocumentId, degree: usize) {
    match node {
        Node::Leaf { keys, buckets } => match keys.binary_search(&key) {
            Ok(position) => buckets[position].push(id),
            Err(position) => {
                keys.insert(position, key);
                buckets.insert(position, vec![id]);
            }
        },
        Node::Internal { keys, children } => {
            let mut index = keys.partition_point(|separator| *separator <= key);
            if children[index].is_full(degree) {
                split_child(keys, children, index, degree);
                if key >= keys[index] {
                    index += 1;
                }
            }
            insert_non_full(&mut children[index], key, id, degree);
        }
    }
}

fn search<'a>(mut node: &'a Node, key: &IndexKey) -> Option<&'a [DocumentId]> {
    loop {
        match node {
            Node::Leaf { keys, buckets } => {
                return keys
                    .binary_search(key)
                    .ok()
                    .map(|position| buckets[position].as_slice());
            }
            Node::Internal { keys, children } => {
                node = &children[keys.partition_point(|separator| separator <= key)];
            }
        }
    }
}

#[derive(Debug)]
pub struct BTreeIndex {
    fields: Vec<String>,
    degree: usize,
    root: RwLock<Node>,
}

impl BTreeIndex {
    pub fn new(fields: Vec<String>, degree: usize) -> QueryResult<Self> {
        if fields.is_empty() {
            return Err(QueryError::MalformedRequest(
                "index must include at least one field".to_string(),
            ));
        }
        if degree < MIN_DEGREE {
            return Err(QueryError::InvalidConfig(format!(
                "btree degree must be at least {}, got {}",
                MIN_DEGREE, degree
            )));
        }
        Ok(Self {
            fields,
            degree,
            root: RwLock::new(Node::empty_leaf()),
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn key_for(&self, document: &Document) -> IndexKey {
        IndexKey::from_document(document, &self.fields)
    }

    /// Indexes `document` under `id`. Ids sharing a key accumulate in one
    /// bucket in insertion order.
    pub fn insert(&self, document: &Document, id: &str) {
        self.insert_key(self.key_for(document), id.to_string());
    }

    pub fn insert_key(&self, key: IndexKey, id: DocumentId) {
        let mut root = self.root.write();
        if root.is_full(self.degree) {
            let old_root = std::mem::replace(&mut *root, Node::empty_leaf());
            let mut keys = Vec::with_capacity(1);
            let mut children = vec![old_root];
            split_child(&mut keys, &mut children, 0, self.degree);
            *root = Node::Internal { keys, children };
        }
        insert_non_full(&mut root, key, id, self.degree);
    }

    /// Returns the bucket for `key`, empty when the key was never inserted.
    pub fn find(&self, key: &IndexKey) -> Vec<DocumentId> {
        let root = self.root.read();
        search(&root, key).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn height(&self) -> usize {
        let root = self.root.read();
        let mut height = 1;
        let mut node = &*root;
        while let Node::Internal { children, .. } = node {
            height += 1;
            node = &children[0];
        }
        height
    }

    /// Number of distinct keys stored in the leaves.
    pub fn key_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { keys, .. } => keys.len(),
                Node::Internal { children, .. } => children.iter().map(count).sum(),
            }
        }
        count(&self.root.read())
    }

    /// Every key with its bucket, in key order.
    pub fn entries(&self) -> Vec<(IndexKey, Vec<DocumentId>)> {
        fn collect(node: &Node, out: &mut Vec<(IndexKey, Vec<DocumentId>)>) {
            match node {
                Node::Leaf { keys, buckets } => {
                    out.extend(keys.iter().cloned().zip(buckets.iter().cloned()));
                }
                Node::Internal { children, .. } => {
                    for child in children {
                        collect(child, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.root.read(), &mut out);
        out
    }

    /// Checks fill bounds, key ordering, separator bounds and uniform leaf
    /// depth across the whole tree.
    pub fn validate(&self) -> QueryResult<()> {
        let root = self.root.read();
        let mut leaf_depth = None;
        validate_node(&root, self.degree, true, None, None, 0, &mut leaf_depth)
    }
}

fn corruption<T>(message: String) -> QueryResult<T> {
    Err(QueryError::IndexCorruption(message))
}

fn validate_node(
    node: &Node,
    degree: usize,
    is_root: bool,
    lower: Option<&IndexKey>,
    upper: Option<&IndexKey>,
    depth: usize,
    leaf_depth: &mut Option<usize>,
) -> QueryResult<()> {
    let keys = node.keys();
    if keys.len() > max_keys(degree) {
        return corruption(format!(
            "node at depth {} holds {} keys, max {}",
            depth,
            keys.len(),
            max_keys(degree)
        ));
    }
    if !is_root && keys.len() < degree - 1 {
        return corruption(format!(
            "node at depth {} holds {} keys, min {}",
            depth,
            keys.len(),
            degree - 1
        ));
    }
    if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
        return corruption(format!(
            "keys {} and {} out of order at depth {}",
            pair[0], pair[1], depth
        ));
    }
    for key in keys {
        let below = lower.is_some_and(|lower| key < lower);
        let above = upper.is_some_and(|upper| key >= upper);
        if below || above {
            return corruption(format!(
                "key {} escapes its separator bounds at depth {}",
                key, depth
            ));
        }
    }

    match node {
        Node::Leaf { keys, buckets } => {
            if buckets.len() != keys.len() {
                return corruption(format!(
                    "leaf at depth {} has {} keys but {} buckets",
                    depth,
                    keys.len(),
                    buckets.len()
                ));
            }
            if buckets.iter().any(Vec::is_empty) {
                return corruption(format!("leaf at depth {} has an empty bucket", depth));
            }
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return corruption(format!(
                        "leaf at depth {} but other leaves at depth {}",
                        depth, expected
                    ));
                }
                Some(_) => {}
            }
            Ok(())
        }
        Node::Internal { keys, children } => {
            if children.len() != keys.len() + 1 {
                return corruption(format!(
                    "internal node at depth {} has {} keys but {} children",
                    depth,
                    keys.len(),
                    children.len()
                ));
            }
            for (index, child) in children.iter().enumerate() {
                let child_lower = if index == 0 {
                    lower
                } else {
                    Some(&keys[index - 1])
                };
                let child_upper = if index == keys.len() {
                    upper
                } else {
                    Some(&keys[index])
                };
                validate_node(
                    child,
                    degree,
                    false,
                    child_lower,
                    child_upper,
                    depth + 1,
                    leaf_depth,
                )?;
            }
            Ok(())
        }
    }
}
