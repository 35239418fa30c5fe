//! Gateway on the local file system.

use super::file_filter::FileFilter;
use crate::kernel::services::ports::{DirEntryInfo, Gateway, UnsavedDocument};
use crate::models::{Timestamp, VcsPath};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::time::SystemTime;

pub struct LocalGateway {
    filter: FileFilter,
    unsaved: Mutex<FxHashMap<VcsPath, String>>,
}

impl LocalGateway {
    pub fn new(filter: FileFilter) -> Self {
        Self {
            filter,
            unsaved: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Called by the embedding editor whenever a buffer diverges from disk.
    pub fn set_unsaved_document(&self, path: &VcsPath, text: impl Into<String>) {
        self.unsaved.lock().insert(path.clone(), text.into());
    }

    /// Called when a buffer is saved or reverted.
    pub fn clear_unsaved_document(&self, path: &VcsPath) {
        self.unsaved.lock().remove(path);
    }
}

pub fn system_time_millis(time: SystemTime) -> Timestamp {
    DateTime::<Utc>::from(time).timestamp_millis()
}

impl Gateway for LocalGateway {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }

    fn content_roots(&self) -> Vec<VcsPath> {
        self.filter.roots().to_vec()
    }

    fn is_under_content_root(&self, path: &VcsPath) -> bool {
        self.filter.is_under_content_root(path)
    }

    fn is_allowed(&self, path: &VcsPath, is_dir: bool) -> bool {
        self.filter.is_allowed(path, is_dir)
    }

    fn take_unsaved_documents(&self) -> Vec<UnsavedDocument> {
        let mut unsaved = self.unsaved.lock();
        unsaved
            .drain()
            .map(|(path, text)| UnsavedDocument { path, text })
            .collect()
    }

    fn physical_content(&self, path: &VcsPath) -> io::Result<Vec<u8>> {
        fs::read(path.to_path_buf())
    }

    fn physical_length(&self, path: &VcsPath) -> io::Result<u64> {
        Ok(fs::metadata(path.to_path_buf())?.len())
    }

    fn physical_timestamp(&self, path: &VcsPath) -> io::Result<Timestamp> {
        let modified = fs::metadata(path.to_path_buf())?.modified()?;
        Ok(system_time_millis(modified))
    }

    fn exists(&self, path: &VcsPath) -> bool {
        path.to_path_buf().exists()
    }

    fn is_directory(&self, path: &VcsPath) -> bool {
        path.to_path_buf().is_dir()
    }

    fn list_dir(&self, path: &VcsPath) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path.to_path_buf())? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                continue;
            }
            entries.push(DirEntryInfo {
                path: path.join(&entry.file_name().to_string_lossy()),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn ensure_files_are_writable(&self, paths: &[VcsPath]) -> io::Result<()> {
        for path in paths {
            let metadata = match fs::metadata(path.to_path_buf()) {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            if metadata.permissions().readonly() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{path} is read-only"),
                ));
            }
        }
        Ok(())
    }

    fn write_physical_content(&self, path: &VcsPath, content: &[u8]) -> io::Result<()> {
        let target = path.to_path_buf();
        if let Some(parent) = target.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(target, content)
    }
}
