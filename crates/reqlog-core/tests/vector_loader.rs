//! JSON test vector loader for log line tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LineVector {
    pub description: String,
    pub line: String,
    /// `None` means the line must be skipped by the decoder.
    #[serde(default)]
    pub expect: Option<ExpectRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectRecord {
    pub timestamp_raw: String,
    pub bytes: u64,
    pub elapsed_seconds: f64,
    pub query_count: u64,
    pub method: String,
    pub uri: String,
    pub ip: String,
    pub user_agent: String,
}

pub fn load(name: &str) -> Vec<LineVector> {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
