#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rankboard::ParserDiagnostic;
use rankboard::ingest::{Pipeline, StorageLayout};
use rankboard::producer::DocumentProducer;
use serde_json::{Value, json};

/// What the fake producer does on its next call.
#[derive(Debug, Clone)]
pub enum Outcome {
    Writes(Value),
    WritesRaw(Vec<u8>),
    Fails(String),
}

/// Stands in for the external parser.
pub struct FakeProducer {
    next: Mutex<Outcome>,
    calls: AtomicUsize,
    last_input: Mutex<Option<Vec<u8>>>,
}

impl FakeProducer {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self { next: Mutex::new(outcome), calls: AtomicUsize::new(0), last_input: Mutex::new(None) })
    }
    pub fn set(&self, outcome: Outcome) {
        *self.next.lock().unwrap() = outcome;
    }
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    pub fn last_input(&self) -> Option<Vec<u8>> {
        self.last_input.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentProducer for FakeProducer {
    async fn parse(&self, input: &Path, output: &Path) -> Result<(), ParserDiagnostic> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let spreadsheet = tokio::fs::read(input)
            .await
            .map_err(|e| ParserDiagnostic::new("fake", "could not read input", e.to_string()))?;
        *self.last_input.lock().unwrap() = Some(spreadsheet);
        let outcome = self.next.lock().unwrap().clone();
        let bytes = match outcome {
            Outcome::Writes(doc) => serde_json::to_vec_pretty(&doc).unwrap(),
            Outcome::WritesRaw(raw) => raw,
            Outcome::Fails(msg) => return Err(ParserDiagnostic::new("fake", "exit code 1", msg)),
        };
        tokio::fs::write(output, bytes)
            .await
            .map_err(|e| ParserDiagnostic::new("fake", "could not write output", e.to_string()))
    }
}

/// Columns Rank / Employee / Satisfaction Score with ranks 2, 1 and null.
pub fn ranked_document(exported: &str) -> Value {
    json!({
        "meta": { "Exported": exported, "Level": "426085 - Stevens Creek Volkswagen" },
        "dataset": {
            "title": "Service Employee Rank",
            "columns": ["Rank", "Employee", "Satisfaction Score", "Escorted To Vehicle", "Area"],
            "rows": [
                { "Rank": 2, "Employee": "Bea", "Satisfaction Score": 96.5, "Escorted To Vehicle": 74.9, "Area": "West" },
                { "Rank": 1, "Employee": "Al", "Satisfaction Score": 100, "Escorted To Vehicle": 75, "Area": "West" },
                { "Rank": null, "Employee": "Cy", "Satisfaction Score": "", "Escorted To Vehicle": "", "Area": "West" }
            ]
        },
        "fieldTypes": {
            "Rank": "number",
            "Employee": "string",
            "Satisfaction Score": "number",
            "Escorted To Vehicle": "percent",
            "Area": "string"
        }
    })
}

pub async fn pipeline(dir: &Path, producer: Arc<FakeProducer>) -> Pipeline {
    Pipeline::open(StorageLayout::new(dir.join("storage")), producer).await.unwrap()
}
