//! Service ports: traits + data contracts.

pub mod config;
pub mod gateway;
pub mod listener;

pub use config::{HistoryConfig, DEFAULT_IGNORED_NAMES, DEFAULT_MAX_CONTENT_LENGTH};
pub use gateway::{DirEntryInfo, Gateway, UnsavedDocument};
pub use listener::{CommandListener, FsListener, RefreshListener};
