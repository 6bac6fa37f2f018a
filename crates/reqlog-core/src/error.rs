//! Shared error type across reqlog crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Log file could not be created, read or written.
    IoFailure,
    /// Log file does not exist yet.
    NotFound,
    /// Invalid input / malformed config.
    BadRequest,
    /// Admin credentials missing or wrong.
    AuthFailed,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::IoFailure => "IO_FAILURE",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ReqLogError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum ReqLogError {
    #[error("io failure: {0}")]
    Io(String),
    #[error("log file not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ReqLogError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ReqLogError::Io(_) => ClientCode::IoFailure,
            ReqLogError::NotFound => ClientCode::NotFound,
            ReqLogError::BadRequest(_) => ClientCode::BadRequest,
            ReqLogError::AuthFailed => ClientCode::AuthFailed,
            ReqLogError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ReqLogError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<std::io::Error> for ReqLogError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReqLogError::NotFound
        } else {
            ReqLogError::Io(e.to_string())
        }
    }
}
