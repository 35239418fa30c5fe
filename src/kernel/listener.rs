//! File listener: the same batching bound to virtual-file-system callbacks,
//! with paired `start_action`/`finish_action` instead of handles.

use super::core::SharedCore;
use super::event::{CommandEvent, FsEvent};
use super::scope::{ActionToken, ScopeError};
use super::services::ports::{CommandListener, FsListener, RefreshListener};
use crate::models::VcsPath;

#[derive(Clone)]
pub struct FileListener {
    core: SharedCore,
}

impl FileListener {
    pub fn new(core: SharedCore) -> Self {
        Self { core }
    }

    pub fn start_action(&self, label: impl Into<String>) -> ActionToken {
        self.core.lock().start_action(Some(label.into()))
    }

    /// Finishes the most recently started action.
    pub fn finish_action(&self) -> Result<(), ScopeError> {
        self.core.lock().finish_latest_action()
    }

    pub fn command_started(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        self.core.lock().command_started(event)
    }

    pub fn command_finished(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        self.core.lock().command_finished(event)
    }

    pub fn before_refresh_start(&self, asynchronous: bool) {
        self.core.lock().before_refresh_start(asynchronous);
    }

    pub fn after_refresh_finish(&self, asynchronous: bool) -> Result<(), ScopeError> {
        self.core.lock().after_refresh_finish(asynchronous)
    }

    pub fn file_created(&self, path: &VcsPath) {
        self.file_event(&FsEvent::created(path.clone()));
    }

    pub fn contents_changed(&self, path: &VcsPath) {
        self.file_event(&FsEvent::contents_changed(path.clone()));
    }

    pub fn file_deleted(&self, path: &VcsPath) {
        self.file_event(&FsEvent::deleted(path.clone()));
    }

    pub fn file_event(&self, event: &FsEvent) {
        self.core.lock().file_event(event);
    }
}

impl CommandListener for FileListener {
    fn command_started(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        FileListener::command_started(self, event)
    }

    fn command_finished(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        FileListener::command_finished(self, event)
    }
}

impl RefreshListener for FileListener {
    fn before_refresh_start(&self, asynchronous: bool) -> Result<(), ScopeError> {
        FileListener::before_refresh_start(self, asynchronous);
        Ok(())
    }

    fn after_refresh_finish(&self, asynchronous: bool) -> Result<(), ScopeError> {
        FileListener::after_refresh_finish(self, asynchronous)
    }
}

impl FsListener for FileListener {
    fn file_event(&self, event: &FsEvent) {
        FileListener::file_event(self, event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/listener.rs"]
mod tests;
