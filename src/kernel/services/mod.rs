//! Services layer (ports + adapters).
//!
//! - `ports`: contracts between the history core and its host.
//! - `adapters`: file system, watcher, persistence and in-memory implementations.
//! - `host`: listener registries the core attaches to.

pub mod adapters;
pub mod host;
pub mod ports;

pub use host::{Host, ListenerId};
