//! Headless history core (scope state, batching, synchronization).

pub mod core;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod scope;
pub mod service;
pub mod services;
pub mod updater;

pub use self::core::{HistoryCore, SharedCore};
pub use dispatcher::{ActionHandle, EventDispatcher};
pub use error::HistoryError;
pub use event::{CommandEvent, FileProperty, FsEvent};
pub use listener::FileListener;
pub use scope::{ActionToken, Boundary, ScopeError, ScopeState, REFRESH_LABEL};
pub use service::{LocalHistoryService, REVERT_LABEL};
pub use updater::{FileContent, Updater, UpdaterError, UpdaterPhase};
