use std::sync::Arc;
use std::thread;

use docdb::engine::Engine;
use query::{Config, QueryOutput};
use serde_json::json;
use tempfile::TempDir;

fn config_for(temp_dir: &TempDir) -> Config {
    Config::default().with_data_dir(temp_dir.path()).with_degree(3)
}

#[test]
fn documents_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open(config_for(&temp_dir)).unwrap();
        engine
            .execute(r#"INSERT INTO users {"_id": "u1", "name": "alice"}"#)
            .unwrap();
        engine.execute("CREATE INDEX ON users(name)").unwrap();
    }

    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert_eq!(engine.collection_names(), vec!["users"]);
    // Indexes live in memory only.
    assert_eq!(engine.index_fields("users"), Some(Vec::new()));
    let output = engine
        .execute("SELECT * FROM users WHERE name = 'alice'")
        .unwrap();
    assert_eq!(output.to_json(), json!([{"_id": "u1", "name": "alice"}]));
}

#[test]
fn reinserting_an_id_overwrites_the_document() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    engine
        .execute(r#"INSERT INTO users {"_id": "u1", "v": 1}"#)
        .unwrap();
    engine
        .execute(r#"INSERT INTO users {"_id": "u1", "v": 2}"#)
        .unwrap();
    let output = engine.execute("SELECT v FROM users").unwrap();
    assert_eq!(output.to_json(), json!([{"v": 2}]));
    assert!(temp_dir.path().join("users").join("u1.json").is_file());
}

#[test]
fn path_like_names_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert!(
        engine
            .execute(r#"INSERT INTO users {"_id": "../escape"}"#)
            .is_err()
    );
    assert!(!temp_dir.path().join("escape.json").exists());
}

#[test]
fn concurrent_sessions_share_one_engine() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(config_for(&temp_dir)).unwrap());
    engine.execute("CREATE INDEX ON events(worker)").unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for step in 0..25 {
                    let statement = format!(
                        r#"INSERT INTO events {{"worker": {}, "step": {}}}"#,
                        worker, step
                    );
                    engine.execute(&statement).unwrap();
                    engine
                        .execute(&format!("SELECT * FROM events WHERE worker = {}", worker))
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for worker in 0..4 {
        let output = engine
            .execute(&format!("SELECT step FROM events WHERE worker = {}", worker))
            .unwrap();
        match output {
            QueryOutput::Documents(documents) => assert_eq!(documents.len(), 25),
            other => panic!("unexpected {:?}", other),
        }
    }
}
