//! Listener surfaces the host delivers notifications to.

use crate::kernel::event::{CommandEvent, FsEvent};
use crate::kernel::scope::ScopeError;

pub trait CommandListener: Send + Sync {
    fn command_started(&self, event: &CommandEvent) -> Result<(), ScopeError>;
    fn command_finished(&self, event: &CommandEvent) -> Result<(), ScopeError>;
}

pub trait RefreshListener: Send + Sync {
    fn before_refresh_start(&self, asynchronous: bool) -> Result<(), ScopeError>;
    fn after_refresh_finish(&self, asynchronous: bool) -> Result<(), ScopeError>;
}

pub trait FsListener: Send + Sync {
    fn file_event(&self, event: &FsEvent);
}
