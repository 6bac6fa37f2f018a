//! HTTP-side adapters between the host router and the core recorder.

pub mod middleware;
