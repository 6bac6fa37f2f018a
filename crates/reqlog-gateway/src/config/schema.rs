use serde::Deserialize;
use reqlog_core::error::{Result, ReqLogError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub admin: AdminSection,
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ReqLogError::UnsupportedVersion);
        }

        self.log.validate()?;
        self.admin.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Request log file.
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Optional raw query trace file.
    #[serde(default)]
    pub query_trace_path: Option<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            query_trace_path: None,
        }
    }
}

impl LogSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(ReqLogError::BadRequest("log.path must not be empty".into()));
        }
        if let Some(p) = &self.query_trace_path {
            if p.trim().is_empty() {
                return Err(ReqLogError::BadRequest(
                    "log.query_trace_path must not be empty when set".into(),
                ));
            }
            if p == &self.path {
                return Err(ReqLogError::BadRequest(
                    "log.query_trace_path must differ from log.path".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminSection {
    /// Bearer token required to clear the log. Clearing is disabled when unset.
    #[serde(default)]
    pub token: Option<String>,

    /// Newest records returned by the view endpoint.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            token: None,
            max_records: default_max_records(),
        }
    }
}

impl AdminSection {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.token, Some(t) if t.trim().is_empty()) {
            return Err(ReqLogError::BadRequest(
                "admin.token must not be empty when set".into(),
            ));
        }
        if !(1..=100_000).contains(&self.max_records) {
            return Err(ReqLogError::BadRequest(
                "admin.max_records must be between 1 and 100000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_log_path() -> String {
    "request-logs.log".into()
}
fn default_max_records() -> usize {
    1000
}
