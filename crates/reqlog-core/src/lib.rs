//! reqlog core: request log wire format, append-only store, recorder and statistics.
//!
//! This crate defines the line format shared by the writer and the viewer, the
//! file-backed log store, the per-request recorder state machine, and the
//! aggregator that turns a parsed log into display statistics. It carries no
//! HTTP or async runtime dependencies so it can be driven from any host.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Logging sits on the request path, so every fallible operation surfaces as
//! `ReqLogError`/`Result` and malformed log lines decode to `None`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod record;
pub mod recorder;
pub mod stats;
pub mod store;

/// Shared result type.
pub use error::{Result, ReqLogError};
