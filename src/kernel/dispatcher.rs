//! Event dispatcher: the host-facing adapter with handle-style actions.

use super::core::SharedCore;
use super::event::{CommandEvent, FsEvent};
use super::scope::{ActionToken, ScopeError};
use super::services::ports::{CommandListener, FsListener, RefreshListener};
use super::updater::Updater;

#[derive(Clone)]
pub struct EventDispatcher {
    core: SharedCore,
}

impl EventDispatcher {
    pub fn new(core: SharedCore) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &SharedCore {
        &self.core
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

    /// Opens a labelled action; the span closes when the handle is finished.
    pub fn start_action(&self, label: impl Into<String>) -> ActionHandle {
        let label = label.into();
        let token = self.core.lock().start_action(Some(label.clone()));
        ActionHandle {
            core: self.core.clone(),
            token,
            label,
            finished: false,
        }
    }

    pub fn file_event(&self, event: &FsEvent) {
        self.core.lock().file_event(event);
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.core.clone())
    }
}

/// An open action. `finish` consumes the handle, so an action cannot be
/// finished twice; a handle dropped unfinished closes its action.
#[must_use = "an action stays open until the handle is finished"]
pub struct ActionHandle {
    core: SharedCore,
    token: ActionToken,
    label: String,
    finished: bool,
}

impl ActionHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn token(&self) -> ActionToken {
        self.token
    }

    pub fn finish(mut self) -> Result<(), ScopeError> {
        self.finished = true;
        // Release the lock before `self` drops.
        #[allow(clippy::let_and_return)]
        let result = self.core.lock().finish_action(self.token);
        result
    }
}

impl Drop for ActionHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!(label = %self.label, "action dropped without finish");
        if let Err(err) = self.core.lock().finish_action(self.token) {
            tracing::warn!(label = %self.label, error = %err, "dropped action was not open");
        }
    }
}

impl CommandListener for EventDispatcher {
    fn command_started(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        EventDispatcher::command_started(self, event)
    }

    fn command_finished(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        EventDispatcher::command_finished(self, event)
    }
}

impl RefreshListener for EventDispatcher {
    fn before_refresh_start(&self, asynchronous: bool) -> Result<(), ScopeError> {
        EventDispatcher::before_refresh_start(self, asynchronous);
        Ok(())
    }

    fn after_refresh_finish(&self, asynchronous: bool) -> Result<(), ScopeError> {
        EventDispatcher::after_refresh_finish(self, asynchronous)
    }
}

impl FsListener for EventDispatcher {
    fn file_event(&self, event: &FsEvent) {
        EventDispatcher::file_event(self, event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/dispatcher.rs"]
mod tests;
