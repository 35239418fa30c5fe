//! Bulk synchronization of content roots with the recorder.
//!
//! Three phases, strictly ordered: `query_needed_files` (read-only, may be
//! repeated), `process_file` for any subset of the returned files, and
//! `updating_done`. Deletions of vanished entries and creation of new
//! directories are buffered by the query and applied with the first
//! processed file, or at `updating_done` when nothing was processed. The
//! whole batch is one change-set.

use super::core::{HistoryCore, SharedCore};
use super::error::HistoryError;
use crate::models::{CaseSensitivity, Content, Timestamp, VcsPath};
use rustc_hash::FxHashSet;

/// Freshly read file handed to `process_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: VcsPath,
    pub content: Content,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdaterError {
    #[error("{operation} called out of order")]
    OutOfOrder { operation: &'static str },
    #[error("{0} was not requested by the last query")]
    NotRequested(VcsPath),
    #[error("{0} was already processed")]
    AlreadyProcessed(VcsPath),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdaterPhase {
    Ready,
    Queried,
    Processing,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SyncPlan {
    pub needed: Vec<VcsPath>,
    pub obsolete: Vec<VcsPath>,
    pub new_dirs: Vec<VcsPath>,
}

pub struct Updater {
    core: SharedCore,
    phase: UpdaterPhase,
    plan: SyncPlan,
    requested: FxHashSet<VcsPath>,
    processed: FxHashSet<VcsPath>,
}

impl Updater {
    pub(crate) fn new(core: SharedCore) -> Self {
        Self {
            core,
            phase: UpdaterPhase::Ready,
            plan: SyncPlan::default(),
            requested: FxHashSet::default(),
            processed: FxHashSet::default(),
        }
    }

    pub fn phase(&self) -> UpdaterPhase {
        self.phase
    }

    /// Files that are new or whose on-disk timestamp differs from the
    /// recorded one. Touches nothing.
    pub fn query_needed_files(&mut self) -> Result<Vec<VcsPath>, UpdaterError> {
        if !matches!(self.phase, UpdaterPhase::Ready | UpdaterPhase::Queried) {
            return Err(UpdaterError::OutOfOrder {
                operation: "query_needed_files",
            });
        }
        let plan = plan_sync(&self.core.lock());
        tracing::debug!(
            needed = plan.needed.len(),
            obsolete = plan.obsolete.len(),
            new_dirs = plan.new_dirs.len(),
            "sync planned"
        );
        self.requested = plan.needed.iter().cloned().collect();
        self.plan = plan;
        self.phase = UpdaterPhase::Queried;
        Ok(self.plan.needed.clone())
    }

    /// Reads a requested file through the gateway.
    pub fn load(&self, path: &VcsPath) -> Result<FileContent, HistoryError> {
        let (content, timestamp) = self.core.lock().read_physical(path)?;
        Ok(FileContent {
            path: path.clone(),
            content,
            timestamp,
        })
    }

    pub fn process_file(&mut self, file: FileContent) -> Result<(), UpdaterError> {
        if !matches!(
            self.phase,
            UpdaterPhase::Queried | UpdaterPhase::Processing
        ) {
            return Err(UpdaterError::OutOfOrder {
                operation: "process_file",
            });
        }
        if !self.requested.contains(&file.path) {
            return Err(UpdaterError::NotRequested(file.path));
        }
        if self.processed.contains(&file.path) {
            return Err(UpdaterError::AlreadyProcessed(file.path));
        }

        let mut core = self.core.lock();
        if self.phase == UpdaterPhase::Queried {
            core.vcs_mut().begin_change_set();
            apply_structure(&mut core, &self.plan);
            self.phase = UpdaterPhase::Processing;
        }
        if let Err(err) = core.record_file(&file.path, file.content, file.timestamp) {
            tracing::warn!(path = %file.path, error = %err, "synced file not recorded");
        }
        drop(core);

        self.processed.insert(file.path);
        Ok(())
    }

    pub fn updating_done(&mut self) -> Result<(), UpdaterError> {
        let mut core = self.core.lock();
        match self.phase {
            UpdaterPhase::Queried => {
                core.vcs_mut().begin_change_set();
                apply_structure(&mut core, &self.plan);
            }
            UpdaterPhase::Processing => {}
            UpdaterPhase::Ready | UpdaterPhase::Done => {
                return Err(UpdaterError::OutOfOrder {
                    operation: "updating_done",
                });
            }
        }
        if let Err(err) = core.vcs_mut().end_change_set(None) {
            tracing::warn!(error = %err, "sync change-set was not open");
        }
        self.phase = UpdaterPhase::Done;
        tracing::info!(processed = self.processed.len(), "sync finished");
        Ok(())
    }
}

fn apply_structure(core: &mut HistoryCore, plan: &SyncPlan) {
    for path in &plan.obsolete {
        if !core.vcs().has_entry(path) {
            continue;
        }
        if let Err(err) = core.vcs_mut().delete(path) {
            tracing::warn!(path = %path, error = %err, "obsolete entry not deleted");
        }
    }
    for path in &plan.new_dirs {
        if let Err(err) = core.vcs_mut().create_directory(path) {
            tracing::warn!(path = %path, error = %err, "directory not created");
        }
    }
}

fn path_key(path: &VcsPath, case: CaseSensitivity) -> String {
    case.name_key(path.as_str())
}

pub(crate) fn plan_sync(core: &HistoryCore) -> SyncPlan {
    let gateway = core.gateway();
    let vcs = core.vcs();
    let case = vcs.case_sensitivity();
    let mut plan = SyncPlan::default();
    let mut present: FxHashSet<String> = FxHashSet::default();

    for root in gateway.content_roots() {
        if !gateway.is_directory(&root) {
            if vcs.has_entry(&root) {
                plan.obsolete.push(root);
            }
            continue;
        }
        present.insert(path_key(&root, case));
        if !vcs.is_directory(&root) {
            if vcs.has_entry(&root) {
                plan.obsolete.push(root.clone());
            }
            plan.new_dirs.push(root.clone());
        }

        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let children = match gateway.list_dir(&dir) {
                Ok(children) => children,
                Err(err) => {
                    tracing::warn!(path = %dir, error = %err, "cannot list directory");
                    continue;
                }
            };
            for child in children {
                if !gateway.is_allowed(&child.path, child.is_dir) {
                    continue;
                }
                present.insert(path_key(&child.path, case));
                if child.is_dir {
                    if !vcs.is_directory(&child.path) {
                        if vcs.has_entry(&child.path) {
                            plan.obsolete.push(child.path.clone());
                        }
                        plan.new_dirs.push(child.path.clone());
                    }
                    stack.push(child.path);
                    continue;
                }
                if vcs.is_directory(&child.path) {
                    plan.obsolete.push(child.path.clone());
                    plan.needed.push(child.path);
                    continue;
                }
                let physical = gateway.physical_timestamp(&child.path).ok();
                if physical.is_none() || vcs.file_timestamp(&child.path) != physical {
                    plan.needed.push(child.path);
                }
            }
        }

        for (path, _) in vcs.descendants(&root) {
            if present.contains(&path_key(&path, case)) {
                continue;
            }
            if plan
                .obsolete
                .iter()
                .any(|obsolete| obsolete.is_ancestor_of(&path, case))
            {
                continue;
            }
            plan.obsolete.push(path);
        }
    }

    for list in [&mut plan.needed, &mut plan.obsolete, &mut plan.new_dirs] {
        list.sort();
        list.dedup();
    }
    plan
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/updater.rs"]
mod tests;
