use super::scope::ScopeError;
use super::services::adapters::StoreError;
use super::updater::UpdaterError;
use crate::models::{ChangeSetId, RecorderError, VcsPath};
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Updater(#[from] UpdaterError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid exclude pattern: {0}")]
    Filter(#[from] globset::Error),
    #[error("{path}: {source}")]
    Io {
        path: VcsPath,
        #[source]
        source: io::Error,
    },
    #[error("{path} has no revision in change-set {change_set}")]
    RevisionNotFound {
        path: VcsPath,
        change_set: ChangeSetId,
    },
    #[error("{0} was too large to keep its content")]
    ContentUnavailable(VcsPath),
}

impl HistoryError {
    pub fn io(path: &VcsPath) -> impl Fn(io::Error) -> HistoryError + '_ {
        move |source| HistoryError::Io {
            path: path.clone(),
            source,
        }
    }
}
