use std::sync::Arc;

use crate::kernel::event::{CommandEvent, FsEvent};

use super::ports::{CommandListener, FsListener, RefreshListener};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registries of the embedding host. Notifications are delivered
/// synchronously, in registration order, on the caller's thread.
#[derive(Default)]
pub struct Host {
    next_id: u64,
    command: Vec<(ListenerId, Arc<dyn CommandListener>)>,
    refresh: Vec<(ListenerId, Arc<dyn RefreshListener>)>,
    fs: Vec<(ListenerId, Arc<dyn FsListener>)>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub fn add_command_listener(&mut self, listener: Arc<dyn CommandListener>) -> ListenerId {
        let id = self.allocate_id();
        self.command.push((id, listener));
        id
    }

    pub fn remove_command_listener(&mut self, id: ListenerId) -> bool {
        remove(&mut self.command, id)
    }

    pub fn add_refresh_listener(&mut self, listener: Arc<dyn RefreshListener>) -> ListenerId {
        let id = self.allocate_id();
        self.refresh.push((id, listener));
        id
    }

    pub fn remove_refresh_listener(&mut self, id: ListenerId) -> bool {
        remove(&mut self.refresh, id)
    }

    pub fn add_fs_listener(&mut self, listener: Arc<dyn FsListener>) -> ListenerId {
        let id = self.allocate_id();
        self.fs.push((id, listener));
        id
    }

    pub fn remove_fs_listener(&mut self, id: ListenerId) -> bool {
        remove(&mut self.fs, id)
    }

    pub fn listener_count(&self) -> usize {
        self.command.len() + self.refresh.len() + self.fs.len()
    }

    pub fn fire_command_started(&self, event: &CommandEvent) {
        for (_, listener) in &self.command {
            if let Err(err) = listener.command_started(event) {
                tracing::warn!(command = ?event.name, error = %err, "command start rejected");
            }
        }
    }

    pub fn fire_command_finished(&self, event: &CommandEvent) {
        for (_, listener) in &self.command {
            if let Err(err) = listener.command_finished(event) {
                tracing::warn!(command = ?event.name, error = %err, "command finish rejected");
            }
        }
    }

    pub fn fire_before_refresh_start(&self, asynchronous: bool) {
        for (_, listener) in &self.refresh {
            if let Err(err) = listener.before_refresh_start(asynchronous) {
                tracing::warn!(error = %err, "refresh start rejected");
            }
        }
    }

    pub fn fire_after_refresh_finish(&self, asynchronous: bool) {
        for (_, listener) in &self.refresh {
            if let Err(err) = listener.after_refresh_finish(asynchronous) {
                tracing::warn!(error = %err, "refresh finish rejected");
            }
        }
    }

    pub fn fire_file_event(&self, event: &FsEvent) {
        for (_, listener) in &self.fs {
            listener.file_event(event);
        }
    }

    /// Delivers a batch of file events inside one refresh.
    pub fn refresh(&self, asynchronous: bool, events: &[FsEvent]) {
        self.fire_before_refresh_start(asynchronous);
        for event in events {
            self.fire_file_event(event);
        }
        self.fire_after_refresh_finish(asynchronous);
    }
}

fn remove<T: ?Sized>(listeners: &mut Vec<(ListenerId, Arc<T>)>, id: ListenerId) -> bool {
    let before = listeners.len();
    listeners.retain(|(listener_id, _)| *listener_id != id);
    listeners.len() != before
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/services/host.rs"]
mod tests;
