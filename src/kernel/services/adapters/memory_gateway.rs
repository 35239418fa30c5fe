//! In-memory gateway for hosts that keep their own file model, and for tests.

use super::file_filter::FileFilter;
use crate::kernel::services::ports::{DirEntryInfo, Gateway, UnsavedDocument};
use crate::models::{Timestamp, VcsPath};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use std::io;

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    timestamp: Timestamp,
    writable: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<VcsPath, MemoryFile>,
    dirs: BTreeSet<VcsPath>,
    unsaved: BTreeMap<VcsPath, String>,
    unreadable: FxHashSet<VcsPath>,
    now: Timestamp,
}

pub struct MemoryGateway {
    filter: FileFilter,
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new(filter: FileFilter) -> Self {
        let mut state = MemoryState::default();
        for root in filter.roots() {
            insert_dir_chain(&mut state.dirs, root);
        }
        Self {
            filter,
            state: Mutex::new(state),
        }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn set_now(&self, now: Timestamp) {
        self.state.lock().now = now;
    }

    pub fn advance(&self, millis: Timestamp) -> Timestamp {
        let mut state = self.state.lock();
        state.now += millis;
        state.now
    }

    /// Writes a file, creating parent directories. Stamped with the current time.
    pub fn write_file(&self, path: &VcsPath, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            insert_dir_chain(&mut state.dirs, &parent);
        }
        let timestamp = state.now;
        let writable = state.files.get(path).map_or(true, |f| f.writable);
        state.files.insert(
            path.clone(),
            MemoryFile {
                content: content.into(),
                timestamp,
                writable,
            },
        );
    }

    pub fn create_dir(&self, path: &VcsPath) {
        insert_dir_chain(&mut self.state.lock().dirs, path);
    }

    /// Removes a file or a directory with everything below it.
    pub fn remove(&self, path: &VcsPath) {
        let mut state = self.state.lock();
        let case = self.filter.case_sensitivity();
        state.files.retain(|p, _| !path.is_ancestor_of(p, case));
        state.dirs.retain(|p| !path.is_ancestor_of(p, case));
    }

    /// Moves a file or directory subtree to `to`.
    pub fn rename(&self, from: &VcsPath, to: &VcsPath) {
        let mut state = self.state.lock();
        let case = self.filter.case_sensitivity();
        let relocate = |p: &VcsPath| -> VcsPath {
            let rest: Vec<&str> = p.components().skip(from.components().count()).collect();
            rest.iter().fold(to.clone(), |acc, name| acc.join(name))
        };

        let moved_files: Vec<(VcsPath, MemoryFile)> = state
            .files
            .iter()
            .filter(|(p, _)| from.is_ancestor_of(p, case))
            .map(|(p, f)| (relocate(p), f.clone()))
            .collect();
        let moved_dirs: Vec<VcsPath> = state
            .dirs
            .iter()
            .filter(|p| from.is_ancestor_of(p, case))
            .map(relocate)
            .collect();

        state.files.retain(|p, _| !from.is_ancestor_of(p, case));
        state.dirs.retain(|p| !from.is_ancestor_of(p, case));
        if let Some(parent) = to.parent() {
            insert_dir_chain(&mut state.dirs, &parent);
        }
        state.files.extend(moved_files);
        state.dirs.extend(moved_dirs);
    }

    pub fn set_unsaved_document(&self, path: &VcsPath, text: impl Into<String>) {
        self.state.lock().unsaved.insert(path.clone(), text.into());
    }

    pub fn has_unsaved_documents(&self) -> bool {
        !self.state.lock().unsaved.is_empty()
    }

    pub fn set_unreadable(&self, path: &VcsPath, unreadable: bool) {
        let mut state = self.state.lock();
        if unreadable {
            state.unreadable.insert(path.clone());
        } else {
            state.unreadable.remove(path);
        }
    }

    pub fn set_writable(&self, path: &VcsPath, writable: bool) {
        if let Some(file) = self.state.lock().files.get_mut(path) {
            file.writable = writable;
        }
    }

    pub fn read_file(&self, path: &VcsPath) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).map(|f| f.content.clone())
    }
}

fn insert_dir_chain(dirs: &mut BTreeSet<VcsPath>, path: &VcsPath) {
    let mut current = Some(path.clone());
    while let Some(dir) = current {
        if dir.is_empty() || !dirs.insert(dir.clone()) {
            break;
        }
        current = dir.parent();
    }
}

fn not_found(path: &VcsPath) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path} not found"))
}

impl Gateway for MemoryGateway {
    fn now(&self) -> Timestamp {
        self.state.lock().now
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
        std::mem::take(&mut self.state.lock().unsaved)
            .into_iter()
            .map(|(path, text)| UnsavedDocument { path, text })
            .collect()
    }

    fn physical_content(&self, path: &VcsPath) -> io::Result<Vec<u8>> {
        let state = self.state.lock();
        if state.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{path} is unreadable"),
            ));
        }
        state
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| not_found(path))
    }

    fn physical_length(&self, path: &VcsPath) -> io::Result<u64> {
        self.state
            .lock()
            .files
            .get(path)
            .map(|f| f.content.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    fn physical_timestamp(&self, path: &VcsPath) -> io::Result<Timestamp> {
        self.state
            .lock()
            .files
            .get(path)
            .map(|f| f.timestamp)
            .ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &VcsPath) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_directory(&self, path: &VcsPath) -> bool {
        self.state.lock().dirs.contains(path)
    }

    fn list_dir(&self, path: &VcsPath) -> io::Result<Vec<DirEntryInfo>> {
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        let is_child = |p: &VcsPath| p.parent().as_ref() == Some(path);
        let mut entries: Vec<DirEntryInfo> = state
            .dirs
            .iter()
            .filter(|p| is_child(p))
            .map(|p| DirEntryInfo {
                path: p.clone(),
                is_dir: true,
            })
            .chain(state.files.keys().filter(|p| is_child(p)).map(|p| DirEntryInfo {
                path: p.clone(),
                is_dir: false,
            }))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn ensure_files_are_writable(&self, paths: &[VcsPath]) -> io::Result<()> {
        let state = self.state.lock();
        for path in paths {
            if state.files.get(path).is_some_and(|f| !f.writable) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{path} is read-only"),
                ));
            }
        }
        Ok(())
    }

    fn write_physical_content(&self, path: &VcsPath, content: &[u8]) -> io::Result<()> {
        self.ensure_files_are_writable(std::slice::from_ref(path))?;
        self.write_file(path, content.to_vec());
        Ok(())
    }
}
