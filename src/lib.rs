//! localhist: local per-path version history for project directories.
//!
//! - models: data model (VcsPath, Entry, ChangeSet, LocalVcs)
//! - kernel: event dispatch, the scope state machine, the updater and the service
//! - kernel::services: ports (Gateway, config, listeners) and adapters (file
//!   system, journal store, watcher)

pub mod kernel;
pub mod models;
