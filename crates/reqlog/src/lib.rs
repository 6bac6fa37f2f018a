//! Top-level facade crate for reqlog.
//!
//! Re-exports the core log protocol and the gateway library so users can depend on a single crate.

pub mod core {
    pub use reqlog_core::*;
}

pub mod gateway {
    pub use reqlog_gateway::*;
}
