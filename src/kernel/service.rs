//! Local history service: wires the core to the host and runs the startup
//! synchronization.

use super::core::{HistoryCore, SharedCore};
use super::dispatcher::{ActionHandle, EventDispatcher};
use super::error::HistoryError;
use super::event::FsEvent;
use super::listener::FileListener;
use super::services::host::{Host, ListenerId};
use super::services::ports::{Gateway, HistoryConfig};
use crate::models::{
    ChangeSet, ChangeSetId, ChangeSetInfo, Clock, Content, Entry, LocalVcs, RecorderError,
    Revision, VcsPath,
};
use std::sync::Arc;

pub const REVERT_LABEL: &str = "Revert";

struct Registrations {
    command: ListenerId,
    refresh: ListenerId,
    fs: ListenerId,
}

pub struct LocalHistoryService {
    core: SharedCore,
    gateway: Arc<dyn Gateway>,
    dispatcher: EventDispatcher,
    listener: FileListener,
    registrations: Option<Registrations>,
}

impl LocalHistoryService {
    /// Replays `journal`, attaches to the host and brings the recorder up to
    /// date with the content roots.
    pub fn startup(
        host: &mut Host,
        config: &HistoryConfig,
        gateway: Arc<dyn Gateway>,
        journal: Vec<ChangeSet>,
    ) -> Result<Self, HistoryError> {
        let clock_gateway = Arc::clone(&gateway);
        let clock: Clock = Arc::new(move || clock_gateway.now());
        let vcs = LocalVcs::from_journal(config.case_sensitivity(), clock, journal)?;
        let core =
            HistoryCore::new(vcs, Arc::clone(&gateway), config.max_content_length).into_shared();

        let dispatcher = EventDispatcher::new(core.clone());
        let listener = FileListener::new(core.clone());
        let registrations = Registrations {
            command: host.add_command_listener(Arc::new(dispatcher.clone())),
            refresh: host.add_refresh_listener(Arc::new(dispatcher.clone())),
            fs: host.add_fs_listener(Arc::new(listener.clone())),
        };

        let mut service = Self {
            core,
            gateway,
            dispatcher,
            listener,
            registrations: Some(registrations),
        };
        match service.synchronize() {
            Ok(processed) => {
                tracing::info!(processed, "local history started");
                Ok(service)
            }
            Err(err) => {
                service.shutdown(host);
                Err(err)
            }
        }
    }

    /// Runs one updater cycle over the content roots. Files that cannot be
    /// read are skipped. Returns the number of files processed.
    pub fn synchronize(&self) -> Result<usize, HistoryError> {
        let mut updater = self.dispatcher.updater();
        let needed = updater.query_needed_files()?;
        let mut processed = 0;
        for path in needed {
            match updater.load(&path) {
                Ok(file) => {
                    updater.process_file(file)?;
                    processed += 1;
                }
                Err(err) => tracing::warn!(path = %path, error = %err, "skipping file during sync"),
            }
        }
        updater.updating_done()?;
        Ok(processed)
    }

    /// Detaches every listener added at startup. Safe to call repeatedly.
    pub fn shutdown(&mut self, host: &mut Host) {
        let Some(registrations) = self.registrations.take() else {
            return;
        };
        host.remove_command_listener(registrations.command);
        host.remove_refresh_listener(registrations.refresh);
        host.remove_fs_listener(registrations.fs);
        tracing::info!("local history stopped");
    }

    pub fn is_running(&self) -> bool {
        self.registrations.is_some()
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn file_listener(&self) -> &FileListener {
        &self.listener
    }

    pub fn core(&self) -> &SharedCore {
        &self.core
    }

    pub fn start_action(&self, label: impl Into<String>) -> ActionHandle {
        self.dispatcher.start_action(label)
    }

    pub fn has_entry(&self, path: &VcsPath) -> bool {
        self.core.lock().vcs().has_entry(path)
    }

    pub fn entry(&self, path: &VcsPath) -> Option<Arc<Entry>> {
        self.core.lock().vcs().entry(path)
    }

    /// Most recent first.
    pub fn revisions_for(&self, path: &VcsPath) -> Vec<Revision> {
        self.core.lock().vcs().revisions_for(path)
    }

    pub fn change_sets(&self) -> Vec<ChangeSetInfo> {
        self.core.lock().vcs().change_sets()
    }

    pub fn journal(&self) -> Vec<ChangeSet> {
        self.core.lock().vcs().journal().to_vec()
    }

    /// Writes the content `path` had after `change_set` back to disk, as one
    /// action labelled `Revert`.
    pub fn revert(&self, path: &VcsPath, change_set: ChangeSetId) -> Result<(), HistoryError> {
        let revision = self
            .revisions_for(path)
            .into_iter()
            .find(|revision| revision.change_set == change_set)
            .ok_or_else(|| HistoryError::RevisionNotFound {
                path: path.clone(),
                change_set,
            })?;
        let bytes = match revision.entry.as_ref() {
            Entry::File {
                content: Content::Stored(bytes),
                ..
            } => bytes.clone(),
            Entry::File { .. } => return Err(HistoryError::ContentUnavailable(path.clone())),
            Entry::Directory { .. } => {
                return Err(RecorderError::NotAFile(path.clone()).into());
            }
        };

        self.gateway
            .ensure_files_are_writable(std::slice::from_ref(path))
            .map_err(HistoryError::io(path))?;

        let action = self.start_action(REVERT_LABEL);
        let written = self
            .gateway
            .write_physical_content(path, &bytes)
            .map_err(HistoryError::io(path));
        if written.is_ok() {
            self.dispatcher
                .file_event(&FsEvent::contents_changed(path.clone()));
        }
        action.finish()?;
        written
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/service.rs"]
mod tests;
