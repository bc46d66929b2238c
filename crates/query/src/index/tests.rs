use super::{BTreeIndex, IndexKey};
use crate::error::QueryError;
use common::Document;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

fn name_index(degree: usize) -> BTreeIndex {
    BTreeIndex::new(vec!["n".to_string()], degree).unwrap()
}

fn int_key(value: i64) -> IndexKey {
    IndexKey::from_values([&json!(value)])
}

fn id_for(value: i64) -> String {
    format!("doc-{}", value)
}

fn insert_int(index: &BTreeIndex, value: i64, id: String) {
    index.insert_key(int_key(value), id);
}

fn keys_in_order(index: &BTreeIndex) -> Vec<i64> {
    index
        .entries()
        .into_iter()
        .map(|(key, _)| key.parts()[0].as_str().parse::<i64>().unwrap())
        .collect()
}

#[test]
fn empty_index_finds_nothing() {
    let index = name_index(2);
    assert!(index.find(&int_key(1)).is_empty());
    assert_eq!(index.height(), 1);
    assert_eq!(index.key_count(), 0);
    index.validate().unwrap();
}

#[test]
fn constructor_rejects_bad_parameters() {
    assert!(matches!(
        BTreeIndex::new(Vec::new(), 2),
        Err(QueryError::MalformedRequest(_))
    ));
    assert!(matches!(
        BTreeIndex::new(vec!["n".to_string()], 1),
        Err(QueryError::InvalidConfig(_))
    ));
}

#[test]
fn ascending_inserts_split_and_stay_valid() {
    let index = name_index(2);
    for value in 0..200 {
        insert_int(&index, value, id_for(value));
        index.validate().unwrap();
    }
    for value in 0..200 {
        assert_eq!(index.find(&int_key(value)), vec![id_for(value)]);
    }
    assert_eq!(keys_in_order(&index), (0..200).collect::<Vec<_>>());
    assert!(index.height() > 2);
}

#[test]
fn descending_inserts_split_and_stay_valid() {
    let index = name_index(3);
    for value in (0..200).rev() {
        insert_int(&index, value, id_for(value));
        index.validate().unwrap();
    }
    for value in 0..200 {
        assert_eq!(index.find(&int_key(value)), vec![id_for(value)]);
    }
    assert_eq!(keys_in_order(&index), (0..200).collect::<Vec<_>>());
}

#[test]
fn random_inserts_match_btreemap_reference() {
    let index = name_index(2);
    let mut rng = StdRng::seed_from_u64(1234);
    let mut reference: BTreeMap<i64, Vec<String>> = BTreeMap::new();

    for sequence in 0..1500 {
        let value = rng.gen_range(0..300) as i64;
        let id = format!("id-{}", sequence);
        insert_int(&index, value, id.clone());
        reference.entry(value).or_default().push(id);
    }
    index.validate().unwrap();

    for (value, ids) in &reference {
        assert_eq!(&index.find(&int_key(*value)), ids);
    }
    for missing in 300..320 {
        assert!(index.find(&int_key(missing)).is_empty());
    }
    assert_eq!(index.key_count(), reference.len());
    assert_eq!(
        keys_in_order(&index),
        reference.keys().cloned().collect::<Vec<_>>()
    );
}

#[test]
fn duplicate_keys_share_one_bucket_in_insertion_order() {
    let index = name_index(2);
    insert_int(&index, 7, "first".to_string());
    for value in 0..20 {
        insert_int(&index, value, id_for(value));
    }
    insert_int(&index, 7, "last".to_string());
    index.validate().unwrap();

    assert_eq!(
        index.find(&int_key(7)),
        vec!["first".to_string(), id_for(7), "last".to_string()]
    );
    let sevens = index
        .entries()
        .into_iter()
        .filter(|(key, _)| *key == int_key(7))
        .count();
    assert_eq!(sevens, 1);
}

#[test]
fn keys_equal_to_a_separator_route_right() {
    // Degree 2: the fourth distinct key splits the root leaf [1, 2, 3] into
    // [1] and [2, 3] with separator 2.
    let index = name_index(2);
    for value in 1..=3 {
        insert_int(&index, value, id_for(value));
    }
    insert_int(&index, 4, id_for(4));
    assert_eq!(index.height(), 2);

    // A duplicate of the separator must land in the right leaf's bucket,
    // not as a second entry in the left leaf.
    insert_int(&index, 2, "again".to_string());
    index.validate().unwrap();
    assert_eq!(index.find(&int_key(2)), vec![id_for(2), "again".to_string()]);
    assert_eq!(keys_in_order(&index), vec![1, 2, 3, 4]);
}

#[test]
fn height_stays_logarithmic() {
    let degree = 4;
    let index = name_index(degree);
    let count = 10_000;
    for value in 0..count {
        insert_int(&index, value, id_for(value));
    }
    index.validate().unwrap();
    // Every non-root node has at least `degree` children, so the height is
    // bounded by log_t(n) plus the root and leaf levels.
    let bound = ((count as f64).ln() / (degree as f64).ln()).ceil() as usize + 2;
    assert!(index.height() <= bound, "height {} > {}", index.height(), bound);
}

#[test]
fn compound_keys_are_extracted_in_field_order() {
    let index =
        BTreeIndex::new(vec!["last".to_string(), "first".to_string()], 2).unwrap();
    let people = [
        ("Smith", "Bob"),
        ("Smith", "Alice"),
        ("Adams", "Zoe"),
        ("Adams", "Aaron"),
    ];
    for (offset, (last, first)) in people.iter().enumerate() {
        let document = doc(json!({"last": last, "first": first}));
        index.insert(&document, &format!("p{}", offset));
    }
    index.validate().unwrap();

    let keys: Vec<String> = index
        .entries()
        .into_iter()
        .map(|(key, _)| key.to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "(Adams, Aaron)",
            "(Adams, Zoe)",
            "(Smith, Alice)",
            "(Smith, Bob)"
        ]
    );
    let smith_alice = IndexKey::from_values([&json!("Smith"), &json!("Alice")]);
    assert_eq!(index.find(&smith_alice), vec!["p1".to_string()]);
    let alice_smith = IndexKey::from_values([&json!("Alice"), &json!("Smith")]);
    assert!(index.find(&alice_smith).is_empty());
}

#[test]
fn documents_missing_an_indexed_field_file_under_null() {
    let index = BTreeIndex::new(vec!["email".to_string()], 2).unwrap();
    index.insert(&doc(json!({"name": "no email"})), "a");
    index.insert(&doc(json!({"email": null})), "b");
    assert_eq!(
        index.find(&IndexKey::from_values([&Value::Null])),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn concurrent_inserts_and_finds_never_observe_a_torn_tree() {
    let index = Arc::new(name_index(2));
    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for step in 0..500 {
                    let value = step * 4 + writer;
                    insert_int(&index, value, id_for(value));
                }
            })
        })
        .collect();
    let reader = {
        let index = Arc::clone(&index);
        thread::spawn(move || {
            for round in 0..2000 {
                let value = round % 2000;
                let found = index.find(&int_key(value));
                assert!(found.is_empty() || found == vec![id_for(value)]);
            }
        })
    };
    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    index.validate().unwrap();
    assert_eq!(index.key_count(), 2000);
    for value in 0..2000 {
        assert_eq!(index.find(&int_key(value)), vec![id_for(value)]);
    }
}

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}
