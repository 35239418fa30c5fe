//! The batching core shared by the dispatcher and the file listener.
//!
//! Scope notifications go through `ScopeState`, which answers with a
//! `Boundary`; crossing a boundary flushes unsaved documents and opens,
//! seals or closes the recorder's change-set. File events are applied to
//! the recorder inside their own nested change-set, so outside any scope
//! each event becomes one revision and inside a scope it folds into the
//! scope's span.

use super::error::HistoryError;
use super::event::{CommandEvent, FileProperty, FsEvent};
use super::scope::{ActionToken, Boundary, ScopeError, ScopeState};
use crate::kernel::services::ports::Gateway;
use crate::models::{Content, LocalVcs, Timestamp, VcsPath};
use parking_lot::Mutex;
use std::sync::Arc;

pub type SharedCore = Arc<Mutex<HistoryCore>>;

pub struct HistoryCore {
    vcs: LocalVcs,
    gateway: Arc<dyn Gateway>,
    scope: ScopeState,
    max_content_length: u64,
}

impl HistoryCore {
    pub fn new(vcs: LocalVcs, gateway: Arc<dyn Gateway>, max_content_length: u64) -> Self {
        Self {
            vcs,
            gateway,
            scope: ScopeState::new(),
            max_content_length,
        }
    }

    pub fn into_shared(self) -> SharedCore {
        Arc::new(Mutex::new(self))
    }

    pub fn vcs(&self) -> &LocalVcs {
        &self.vcs
    }

    pub(crate) fn vcs_mut(&mut self) -> &mut LocalVcs {
        &mut self.vcs
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn scope(&self) -> &ScopeState {
        &self.scope
    }

    // ==================== scopes ====================

    pub fn command_started(&mut self, event: &CommandEvent) -> Result<(), ScopeError> {
        let boundary = self.scope.command_started(event.name.clone())?;
        self.cross(boundary);
        Ok(())
    }

    pub fn command_finished(&mut self, event: &CommandEvent) -> Result<(), ScopeError> {
        let boundary = self.scope.command_finished(event.name.clone())?;
        self.cross(boundary);
        Ok(())
    }

    pub fn before_refresh_start(&mut self, asynchronous: bool) {
        tracing::trace!(asynchronous, "refresh started");
        let boundary = self.scope.refresh_started();
        self.cross(boundary);
    }

    pub fn after_refresh_finish(&mut self, asynchronous: bool) -> Result<(), ScopeError> {
        tracing::trace!(asynchronous, "refresh finished");
        let boundary = self.scope.refresh_finished()?;
        self.cross(boundary);
        Ok(())
    }

    pub fn start_action(&mut self, label: Option<String>) -> ActionToken {
        let (token, boundary) = self.scope.action_started(label);
        self.cross(boundary);
        token
    }

    pub fn finish_action(&mut self, token: ActionToken) -> Result<(), ScopeError> {
        let boundary = self.scope.action_finished(token)?;
        self.cross(boundary);
        Ok(())
    }

    pub fn finish_latest_action(&mut self) -> Result<(), ScopeError> {
        let token = self
            .scope
            .latest_action()
            .ok_or(ScopeError::ActionNotStarted)?;
        self.finish_action(token)
    }

    fn cross(&mut self, boundary: Boundary) {
        match boundary {
            Boundary::Open { seal_open } => {
                if seal_open {
                    self.register_unsaved_documents();
                    self.vcs.seal_change_set(None);
                }
                self.vcs.begin_change_set();
                self.register_unsaved_documents();
            }
            Boundary::Close { label } => {
                self.register_unsaved_documents();
                if let Err(err) = self.vcs.end_change_set(label) {
                    tracing::warn!(error = %err, "scope closed without an open change-set");
                }
            }
            Boundary::Split { label } => {
                self.register_unsaved_documents();
                self.vcs.seal_change_set(label);
                if let Err(err) = self.vcs.end_change_set(None) {
                    tracing::warn!(error = %err, "scope closed without an open change-set");
                }
            }
            Boundary::Ignore => {}
        }
    }

    /// Records pending editor text of tracked files. The gateway drains its
    /// table, so a second call without new edits records nothing.
    pub fn register_unsaved_documents(&mut self) {
        for document in self.gateway.take_unsaved_documents() {
            let path = document.path;
            if !self.gateway.is_tracked(&path, false) {
                continue;
            }
            if !self.vcs.has_entry(&path) || self.vcs.is_directory(&path) {
                continue;
            }
            let timestamp = self.gateway.now();
            if let Err(err) =
                self.vcs
                    .change_file_content(&path, Content::from(document.text), timestamp)
            {
                tracing::warn!(path = %path, error = %err, "unsaved document not recorded");
            }
        }
    }

    // ==================== file events ====================

    pub fn file_event(&mut self, event: &FsEvent) {
        self.vcs.begin_change_set();
        let result = match event {
            FsEvent::Created { path } => self.created(path),
            FsEvent::ContentsChanged { path } => self.contents_changed(path),
            FsEvent::Deleted { path, .. } => self.deleted(path),
            FsEvent::PropertyChanged {
                path,
                property: FileProperty::Name,
                old_value,
            } => {
                let from = match path.parent() {
                    Some(parent) => parent.join(old_value),
                    None => VcsPath::new(old_value),
                };
                self.relocate(&from, path)
            }
            FsEvent::PropertyChanged {
                property: FileProperty::Other(_),
                ..
            } => Ok(()),
            FsEvent::Moved {
                path, old_parent, ..
            } => self.relocate(&old_parent.join(path.name()), path),
        };
        if let Err(err) = result {
            tracing::warn!(path = %event.path(), error = %err, "file event not recorded");
        }
        if let Err(err) = self.vcs.end_change_set(None) {
            tracing::warn!(error = %err, "file event change-set was not open");
        }
    }

    fn created(&mut self, path: &VcsPath) -> Result<(), HistoryError> {
        let is_dir = self.gateway.is_directory(path);
        if !self.gateway.is_tracked(path, is_dir) {
            return Ok(());
        }
        self.ensure_parent(path)?;
        self.create_tree(path, is_dir)
    }

    fn contents_changed(&mut self, path: &VcsPath) -> Result<(), HistoryError> {
        if self.gateway.is_directory(path) || !self.gateway.is_tracked(path, false) {
            return Ok(());
        }
        self.ensure_parent(path)?;
        self.record_physical_file(path)
    }

    fn deleted(&mut self, path: &VcsPath) -> Result<(), HistoryError> {
        if !self.vcs.has_entry(path) {
            return Ok(());
        }
        if !self.gateway.is_tracked(path, self.vcs.is_directory(path)) {
            return Ok(());
        }
        self.vcs.delete(path)?;
        Ok(())
    }

    /// History follows the entry only when both ends are tracked; otherwise
    /// the move degrades to a delete and/or a create. A source still present
    /// on disk was not moved away and keeps its entry.
    fn relocate(&mut self, from: &VcsPath, to: &VcsPath) -> Result<(), HistoryError> {
        let is_dir = self.gateway.is_directory(to);
        let source = self.vcs.has_entry(from)
            && self.gateway.is_tracked(from, is_dir)
            && (self.same_path(from, to) || !self.gateway.exists(from));
        let target = self.gateway.is_tracked(to, is_dir);

        match (source, target) {
            (true, true) if self.same_path(from, to) || !self.vcs.has_entry(to) => {
                self.transplant(from, to)
            }
            (true, true) => {
                // Replaced an existing entry, e.g. an atomic save.
                self.ensure_parent(to)?;
                self.create_tree(to, is_dir)?;
                self.vcs.delete(from)?;
                Ok(())
            }
            (true, false) => {
                self.vcs.delete(from)?;
                Ok(())
            }
            (false, true) => {
                self.ensure_parent(to)?;
                self.create_tree(to, is_dir)
            }
            (false, false) => Ok(()),
        }
    }

    fn transplant(&mut self, from: &VcsPath, to: &VcsPath) -> Result<(), HistoryError> {
        let empty = VcsPath::new("");
        let old_parent = from.parent().unwrap_or_else(|| empty.clone());
        let new_parent = to.parent().unwrap_or(empty);

        let mut current = from.clone();
        if !self.same_path(&old_parent, &new_parent) {
            if !self.vcs.is_directory(&new_parent) {
                self.vcs.create_directory(&new_parent)?;
            }
            self.vcs.move_to(&current, &new_parent)?;
            current = new_parent.join(from.name());
        }
        if current.name() != to.name() {
            self.vcs.rename(&current, to.name())?;
        }
        Ok(())
    }

    fn create_tree(&mut self, path: &VcsPath, is_dir: bool) -> Result<(), HistoryError> {
        if !is_dir {
            return self.record_physical_file(path);
        }
        if self.vcs.has_entry(path) && !self.vcs.is_directory(path) {
            self.vcs.delete(path)?;
        }
        self.vcs.create_directory(path)?;

        let children = self.gateway.list_dir(path).map_err(HistoryError::io(path))?;
        for child in children {
            if !self.gateway.is_tracked(&child.path, child.is_dir) {
                continue;
            }
            if let Err(err) = self.create_tree(&child.path, child.is_dir) {
                tracing::warn!(path = %child.path, error = %err, "skipping entry");
            }
        }
        Ok(())
    }

    fn record_physical_file(&mut self, path: &VcsPath) -> Result<(), HistoryError> {
        let (content, timestamp) = self.read_physical(path)?;
        self.record_file(path, content, timestamp)
    }

    /// Creates or updates a file entry, replacing a directory in the way.
    pub(crate) fn record_file(
        &mut self,
        path: &VcsPath,
        content: Content,
        timestamp: Timestamp,
    ) -> Result<(), HistoryError> {
        if self.vcs.is_directory(path) {
            self.vcs.delete(path)?;
        }
        if self.vcs.has_entry(path) {
            self.vcs.change_file_content(path, content, timestamp)?;
        } else {
            self.ensure_parent(path)?;
            self.vcs.create_file(path, content, timestamp)?;
        }
        Ok(())
    }

    /// On-disk content, reduced to its length above the size limit.
    pub fn read_physical(&self, path: &VcsPath) -> Result<(Content, Timestamp), HistoryError> {
        let length = self
            .gateway
            .physical_length(path)
            .map_err(HistoryError::io(path))?;
        let content = if length > self.max_content_length {
            Content::Unavailable { length }
        } else {
            Content::Stored(
                self.gateway
                    .physical_content(path)
                    .map_err(HistoryError::io(path))?,
            )
        };
        let timestamp = self
            .gateway
            .physical_timestamp(path)
            .map_err(HistoryError::io(path))?;
        Ok((content, timestamp))
    }

    fn ensure_parent(&mut self, path: &VcsPath) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.is_empty() && !self.vcs.is_directory(&parent) {
                self.vcs.create_directory(&parent)?;
            }
        }
        Ok(())
    }

    fn same_path(&self, a: &VcsPath, b: &VcsPath) -> bool {
        let case = self.vcs.case_sensitivity();
        a.is_ancestor_of(b, case) && b.is_ancestor_of(a, case)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/core.rs"]
mod tests;
