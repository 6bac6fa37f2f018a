//! Request log records and the line format they travel in.
//!
//! One record occupies exactly one line of the log store:
//! - `codec` turns a record into that line and back, tolerating garbage.
//! - `parse_all` streams every decodable record out of a store.
//!
//! Decoding never fails loudly: a line that does not match the bracket layout
//! (for example one truncated by a crash mid-write) is dropped.

pub mod codec;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::store::LogStore;

pub use codec::{decode, encode, set_query_count, TIMESTAMP_FORMAT};

/// One logged request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Request start, second precision.
    pub timestamp: NaiveDateTime,
    /// `timestamp` exactly as it appears in the log line.
    pub timestamp_raw: String,
    /// Request body size in bytes (0 when absent).
    pub bytes: u64,
    /// Seconds between request start and the initial append.
    pub elapsed_seconds: f64,
    /// Executed queries; 0 until the record is patched.
    pub query_count: u64,
    pub method: String,
    pub uri: String,
    pub ip: String,
    pub user_agent: String,
}

impl LogRecord {
    /// Build a record whose raw timestamp is derived from `timestamp`.
    pub fn new(
        timestamp: NaiveDateTime,
        bytes: u64,
        elapsed_seconds: f64,
        method: impl Into<String>,
        uri: impl Into<String>,
        ip: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            timestamp_raw: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            bytes,
            elapsed_seconds,
            query_count: 0,
            method: method.into(),
            uri: uri.into(),
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }
}

/// Decode every well-formed line of `store`, in file order.
///
/// Fails with `ReqLogError::NotFound` when the log file does not exist yet;
/// callers treat that as "no logs". Calling again re-reads from scratch.
pub fn parse_all(store: &LogStore) -> Result<impl Iterator<Item = LogRecord>> {
    let lines = store.read_all()?;
    Ok(lines.into_iter().filter_map(|line| decode(&line)))
}
