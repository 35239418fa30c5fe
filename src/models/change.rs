//! Journal records: every mutation of the versioned tree is a `Change`, and
//! changes are grouped into closed `ChangeSet`s.

use super::entry::{Content, Timestamp};
use super::path::VcsPath;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSetId(pub u64);

impl std::fmt::Display for ChangeSetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    CreateFile {
        path: VcsPath,
        content: Content,
        timestamp: Timestamp,
    },
    CreateDirectory {
        path: VcsPath,
    },
    ChangeContent {
        path: VcsPath,
        content: Content,
        timestamp: Timestamp,
    },
    Delete {
        path: VcsPath,
    },
    Rename {
        path: VcsPath,
        new_name: String,
    },
    Move {
        path: VcsPath,
        new_parent: VcsPath,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub id: ChangeSetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub timestamp: Timestamp,
    pub changes: Vec<Change>,
}
