//! Boundary between the history core and its host: file contents, content
//! roots, the exclusion filter and unsaved editor documents.

use crate::models::{Timestamp, VcsPath};
use std::io;

/// Editor buffer whose text has not been written to disk yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedDocument {
    pub path: VcsPath,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub path: VcsPath,
    pub is_dir: bool,
}

pub trait Gateway: Send + Sync {
    fn now(&self) -> Timestamp;

    fn content_roots(&self) -> Vec<VcsPath>;

    fn is_under_content_root(&self, path: &VcsPath) -> bool;

    /// File filter; `false` means the path must leave no trace in history.
    fn is_allowed(&self, path: &VcsPath, is_dir: bool) -> bool;

    /// Drains the unsaved documents collected since the last call.
    fn take_unsaved_documents(&self) -> Vec<UnsavedDocument>;

    /// Bytes currently on disk, bypassing any in-memory buffer.
    fn physical_content(&self, path: &VcsPath) -> io::Result<Vec<u8>>;

    fn physical_length(&self, path: &VcsPath) -> io::Result<u64>;

    fn physical_timestamp(&self, path: &VcsPath) -> io::Result<Timestamp>;

    fn exists(&self, path: &VcsPath) -> bool;

    fn is_directory(&self, path: &VcsPath) -> bool;

    fn list_dir(&self, path: &VcsPath) -> io::Result<Vec<DirEntryInfo>>;

    fn ensure_files_are_writable(&self, paths: &[VcsPath]) -> io::Result<()>;

    fn write_physical_content(&self, path: &VcsPath, content: &[u8]) -> io::Result<()>;

    fn is_tracked(&self, path: &VcsPath, is_dir: bool) -> bool {
        self.is_under_content_root(path) && self.is_allowed(path, is_dir)
    }
}
