//! HTTP `TableHost` for an OpenRefine-compatible server.
//!
//! Blocking client (no Tokio runtime required). One client drives one
//! project. Row filters are kept client-side and sent as list facets with
//! every request that depends on them.

mod client;
mod wire;

pub use client::{RefineClient, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS};
pub use wire::ColumnInfo;
