//! Service adapters: OS specific implementations and in-memory stand-ins.

pub mod file_filter;
#[cfg(feature = "cli")]
pub mod file_watcher;
pub mod local_gateway;
pub mod memory_gateway;
pub mod settings;
pub mod store;

pub use file_filter::FileFilter;
#[cfg(feature = "cli")]
pub use file_watcher::FileWatcherService;
pub use local_gateway::LocalGateway;
pub use memory_gateway::MemoryGateway;
pub use settings::{
    ensure_settings_file, ensure_settings_file_at, get_settings_path, load_settings,
    load_settings_from,
};
pub use store::{
    default_journal_path, ensure_log_dir, get_log_dir, JournalStore, StoreError,
};
