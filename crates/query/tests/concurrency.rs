mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use query::{Executor, Predicate};
use serde_json::json;
use support::{disk_catalog, doc, memory_catalog};

#[test]
fn inserts_racing_index_creation_are_all_indexed() {
    let catalog = Arc::new(memory_catalog(2));
    let users = catalog.collection("users").unwrap();
    for n in 0..100 {
        users.insert(doc(json!({"n": n, "group": n % 4}))).unwrap();
    }

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let users = Arc::clone(&users);
            thread::spawn(move || {
                for step in 0..150 {
                    let n = 100 + writer * 150 + step;
                    users.insert(doc(json!({"n": n, "group": n % 4}))).unwrap();
                }
            })
        })
        .collect();
    let indexer = {
        let users = Arc::clone(&users);
        thread::spawn(move || users.create_index(&["group".to_string()]).unwrap())
    };
    for writer in writers {
        writer.join().unwrap();
    }
    assert!(indexer.join().unwrap());

    let index = users.index(&["group".to_string()]).unwrap();
    index.validate().unwrap();
    let executor = Executor::new(&catalog);
    let mut seen = HashSet::new();
    for group in 0..4 {
        let path = executor.access_path(&users, &Predicate::eq("group", json!(group)));
        let ids = path.candidate_ids().unwrap();
        assert_eq!(ids.len(), 175);
        seen.extend(ids.iter().cloned());
    }
    assert_eq!(seen.len(), 700);
}

#[test]
fn readers_and_writers_share_a_disk_collection() {
    let (_dir, catalog) = disk_catalog(2);
    let catalog = Arc::new(catalog);
    catalog
        .collection("events")
        .unwrap()
        .create_index(&["kind".to_string()])
        .unwrap();

    let writers: Vec<_> = (0..3)
        .map(|writer| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let events = catalog.collection("events").unwrap();
                for step in 0..40 {
                    events
                        .insert(doc(json!({"kind": format!("k{}", writer), "step": step})))
                        .unwrap();
                }
            })
        })
        .collect();
    let reader = {
        let catalog = Arc::clone(&catalog);
        thread::spawn(move || {
            let events = catalog.collection("events").unwrap();
            for _ in 0..50 {
                for document in events.load_docs(None).unwrap() {
                    assert!(document["kind"].is_string());
                }
            }
        })
    };
    let deleter = {
        let catalog = Arc::clone(&catalog);
        thread::spawn(move || {
            let events = catalog.collection("events").unwrap();
            for _ in 0..20 {
                events
                    .delete(|document| document["step"] == json!(0), None)
                    .unwrap();
            }
        })
    };
    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
    deleter.join().unwrap();

    let events = catalog.collection("events").unwrap();
    // Each writer's step-0 document is gone unless it landed after the last delete pass.
    let remaining = events.load_docs(None).unwrap();
    assert!((117..=120).contains(&remaining.len()), "{} left", remaining.len());
    let executor = Executor::new(&catalog);
    for writer in 0..3 {
        let path = executor.access_path(
            &events,
            &Predicate::eq("kind", json!(format!("k{}", writer))),
        );
        assert_eq!(path.candidate_ids().unwrap().len(), 40);
    }
}
