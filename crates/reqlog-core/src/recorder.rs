//! Per-request recorder.
//!
//! Lifecycle per request: `start` (append a record with `queries:0`) returns an
//! [`OpenRecord`]; `finish` consumes it and patches the query count into that
//! same line. Consuming the open record makes a second patch impossible.
//!
//! The `time:` field is measured when the record is appended and is not
//! rewritten by `finish`; only the query count changes after the fact.
//!
//! Nothing here returns an error to the caller: store failures are reported via
//! `tracing` and dropped so logging can never fail the request it observes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::record::{encode, set_query_count, LogRecord};
use crate::store::{LogStore, RecordHandle};

/// Request metadata available when the request enters the system.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: String,
    pub uri: String,
    /// `Content-Length`, if the client sent one.
    pub content_length: Option<u64>,
    pub ip: String,
    pub user_agent: String,
}

/// Counts queries executed while serving one request.
///
/// Handlers either `record` each statement (kept for the query trace log) or
/// bump the counter with `add`.
#[derive(Debug, Default)]
pub struct QueryTally {
    count: AtomicU64,
    statements: Mutex<Vec<String>>,
}

impl QueryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record(&self, statement: impl Into<String>) {
        self.add(1);
        if let Ok(mut s) = self.statements.lock() {
            s.push(statement.into());
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

/// A record that has been appended but not yet patched.
#[derive(Debug)]
#[must_use = "an open record must be finished to patch its query count"]
pub struct OpenRecord {
    handle: Option<RecordHandle>,
    started: Instant,
    timestamp_raw: String,
    uri: String,
}

impl OpenRecord {
    /// Handle of the appended line; `None` if the append failed.
    pub fn handle(&self) -> Option<RecordHandle> {
        self.handle
    }
}

/// Writes one record per request into a [`LogStore`].
#[derive(Debug, Clone)]
pub struct Recorder {
    store: Arc<LogStore>,
    query_trace: Option<Arc<LogStore>>,
}

impl Recorder {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self {
            store,
            query_trace: None,
        }
    }

    /// Also write every recorded statement to a separate raw trace log.
    pub fn with_query_trace(mut self, trace: Arc<LogStore>) -> Self {
        self.query_trace = Some(trace);
        self
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Append the initial record for a request that started at `started`.
    pub fn start(&self, info: RequestInfo, started: Instant) -> OpenRecord {
        self.start_at(info, Local::now().naive_local(), started)
    }

    /// Like [`Recorder::start`] with an explicit wall-clock timestamp.
    pub fn start_at(
        &self,
        info: RequestInfo,
        timestamp: NaiveDateTime,
        started: Instant,
    ) -> OpenRecord {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        let record = LogRecord::new(
            timestamp,
            info.content_length.unwrap_or(0),
            started.elapsed().as_secs_f64(),
            info.method,
            info.uri,
            info.ip,
            info.user_agent,
        );

        let handle = match self.store.append(&encode(&record)) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "request log append failed"
                );
                None
            }
        };

        OpenRecord {
            handle,
            started,
            timestamp_raw: record.timestamp_raw,
            uri: record.uri,
        }
    }

    /// Patch the executed query count into the request's own record.
    pub fn finish(&self, open: OpenRecord, tally: &QueryTally) {
        let query_count = tally.count();
        let elapsed = open.started.elapsed().as_secs_f64();

        if let Some(trace) = &self.query_trace {
            write_query_trace(trace, &open, &tally.statements());
        }

        let Some(handle) = open.handle else {
            return;
        };

        match self
            .store
            .patch(handle, |line| set_query_count(line, query_count))
        {
            Ok(true) => {
                tracing::debug!(line = handle.line(), query_count, elapsed, "request log patched");
            }
            Ok(false) => {
                tracing::debug!(line = handle.line(), "request log record gone, patch skipped");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "request log patch failed"
                );
            }
        }
    }
}

fn write_query_trace(trace: &LogStore, open: &OpenRecord, statements: &[String]) {
    for stmt in statements {
        let line = format!("[{}] [uri:{}] {}", open.timestamp_raw, open.uri, stmt)
            .replace(['\r', '\n'], " ");
        if let Err(e) = trace.append(&line) {
            tracing::warn!(
                path = %trace.path().display(),
                error = %e,
                "query trace append failed"
            );
            return;
        }
    }
}
