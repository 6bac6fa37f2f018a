//! reqlog gateway library entry.
//!
//! This crate wires the core recorder into an axum stack: YAML config, shared
//! state, the recording middleware, and the admin endpoints that render and
//! clear the log. It is consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod config;
pub mod ops;
pub mod router;
pub mod transport;
