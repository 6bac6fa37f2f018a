//! Logger config loader (strict parsing).

pub mod schema;

use std::fs;

use reqlog_core::error::{Result, ReqLogError};

pub use schema::{AdminSection, LogSection, LoggerConfig, ServerSection};

/// Default config file name, overridable with `REQLOG_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "reqlog.yaml";

pub fn load_from_file(path: &str) -> Result<LoggerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ReqLogError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<LoggerConfig> {
    let cfg: LoggerConfig = serde_yaml::from_str(s)
        .map_err(|e| ReqLogError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
