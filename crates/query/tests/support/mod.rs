#![allow(dead_code)]

use common::Document;
use query::{Catalog, Config, Executor, QueryOutput, parse_request};
use serde_json::Value;
use tempfile::TempDir;

pub fn memory_catalog(degree: usize) -> Catalog {
    Catalog::in_memory(Config::default().with_degree(degree)).expect("memory catalog")
}

pub fn disk_catalog(degree: usize) -> (TempDir, Catalog) {
    let dir = TempDir::new().expect("temp dir create failed");
    let config = Config::default()
        .with_data_dir(dir.path())
        .with_degree(degree);
    let catalog = Catalog::open_dir(config).expect("open catalog");
    (dir, catalog)
}

pub fn run(catalog: &Catalog, statement: &str) -> QueryOutput {
    let request = parse_request(statement).unwrap_or_else(|err| panic!("{}: {}", statement, err));
    Executor::new(catalog)
        .execute(request)
        .unwrap_or_else(|err| panic!("{}: {}", statement, err))
}

pub fn run_select(catalog: &Catalog, statement: &str) -> Vec<Document> {
    match run(catalog, statement) {
        QueryOutput::Documents(documents) => documents,
        other => panic!("{} returned {:?}", statement, other),
    }
}

pub fn inserted_id(output: QueryOutput) -> String {
    match output {
        QueryOutput::Inserted(id) => id,
        other => panic!("expected an inserted id, got {:?}", other),
    }
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

pub fn sorted_ids(documents: &[Document]) -> Vec<String> {
    let mut ids: Vec<String> = documents
        .iter()
        .map(|document| document["_id"].as_str().expect("string id").to_string())
        .collect();
    ids.sort();
    ids
}
