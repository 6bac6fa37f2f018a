//! Shared application state for the request logger.
//!
//! One `LogStore` per configured file is built here and shared by `Arc`; the
//! recording middleware and the admin endpoints never open the files on their
//! own.

use std::sync::Arc;

use reqlog_core::error::{Result, ReqLogError};
use reqlog_core::recorder::Recorder;
use reqlog_core::store::LogStore;

use crate::config::LoggerConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: LoggerConfig,
    recorder: Recorder,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: LoggerConfig) -> Result<Self> {
        cfg.validate()?;

        let store = Arc::new(LogStore::new(&cfg.log.path));
        let mut recorder = Recorder::new(store);

        if let Some(trace_path) = &cfg.log.query_trace_path {
            recorder = recorder.with_query_trace(Arc::new(LogStore::new(trace_path)));
        }

        if cfg.admin.token.is_none() {
            tracing::warn!("admin.token not set; clearing logs over HTTP is disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, recorder }),
        })
    }

    pub fn cfg(&self) -> &LoggerConfig {
        &self.inner.cfg
    }

    pub fn recorder(&self) -> &Recorder {
        &self.inner.recorder
    }

    pub fn store(&self) -> &Arc<LogStore> {
        self.inner.recorder.store()
    }

    /// Check an `Authorization: Bearer <token>` value against `admin.token`.
    pub fn authorize_admin(&self, bearer: Option<&str>) -> Result<()> {
        match (&self.inner.cfg.admin.token, bearer) {
            (Some(expected), Some(given)) if constant_time_eq(expected.as_bytes(), given.as_bytes()) => {
                Ok(())
            }
            _ => Err(ReqLogError::AuthFailed),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
