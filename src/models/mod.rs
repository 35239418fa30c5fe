//! Data model: paths, entries, the change journal and the versioned tree.

pub mod change;
pub mod entry;
pub mod local_vcs;
pub mod path;

pub use change::{Change, ChangeSet, ChangeSetId};
pub use entry::{Content, Entry, Timestamp};
pub use local_vcs::{system_clock, ChangeSetInfo, Clock, LocalVcs, RecorderError, Revision};
pub use path::{CaseSensitivity, VcsPath};
