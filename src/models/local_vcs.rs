//! Versioned tree (change recorder).
//!
//! Entries live in a slotmap arena under a virtual root. Mutations are
//! journaled as `Change`s and grouped into change-sets; closing a change-set
//! appends one `Revision` to every entry whose state (or subtree) changed.

use super::change::{Change, ChangeSet, ChangeSetId};
use super::entry::{Content, Entry, Timestamp};
use super::path::{CaseSensitivity, VcsPath};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

new_key_type! { struct EntryId; }

pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("entry not found: {0}")]
    EntryNotFound(VcsPath),
    #[error("entry already exists: {0}")]
    EntryExists(VcsPath),
    #[error("parent directory not found: {0}")]
    ParentNotFound(VcsPath),
    #[error("not a directory: {0}")]
    NotADirectory(VcsPath),
    #[error("not a file: {0}")]
    NotAFile(VcsPath),
    #[error("cannot move {0} into its own subtree")]
    MoveIntoDescendant(VcsPath),
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),
    #[error("no change-set is open")]
    ChangeSetNotOpen,
}

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    pub change_set: ChangeSetId,
    pub label: Option<String>,
    pub timestamp: Timestamp,
    pub entry: Arc<Entry>,
}

impl Revision {
    pub fn cause_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn content(&self) -> Option<&Content> {
        self.entry.content()
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    File {
        content: Content,
        timestamp: Timestamp,
    },
    Dir {
        children: BTreeMap<String, EntryId>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<EntryId>,
    kind: NodeKind,
    snapshot: Option<Arc<Entry>>,
    revisions: Vec<Revision>,
}

impl Node {
    fn new(name: String, parent: Option<EntryId>, kind: NodeKind) -> Self {
        Self {
            name,
            parent,
            kind,
            snapshot: None,
            revisions: Vec::new(),
        }
    }

    fn children(&self) -> Option<&BTreeMap<String, EntryId>> {
        match &self.kind {
            NodeKind::Dir { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut BTreeMap<String, EntryId>> {
        match &mut self.kind {
            NodeKind::Dir { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

#[derive(Default)]
struct PendingChangeSet {
    changes: Vec<Change>,
    touched: Vec<EntryId>,
    seen: FxHashSet<EntryId>,
}

/// Change-set summary for listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSetInfo {
    pub id: ChangeSetId,
    pub label: Option<String>,
    pub timestamp: Timestamp,
    pub change_count: usize,
}

pub struct LocalVcs {
    arena: SlotMap<EntryId, Node>,
    root: EntryId,
    case: CaseSensitivity,
    clock: Clock,
    journal: Vec<ChangeSet>,
    pending: Option<PendingChangeSet>,
    depth: usize,
    next_id: u64,
}

impl fmt::Debug for LocalVcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalVcs")
            .field("entries", &self.arena.len())
            .field("change_sets", &self.journal.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl LocalVcs {
    pub fn new(case: CaseSensitivity) -> Self {
        Self::with_clock(case, system_clock())
    }

    pub fn with_clock(case: CaseSensitivity, clock: Clock) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(
            String::new(),
            None,
            NodeKind::Dir {
                children: BTreeMap::new(),
            },
        ));
        Self {
            arena,
            root,
            case,
            clock,
            journal: Vec::new(),
            pending: None,
            depth: 0,
            next_id: 1,
        }
    }

    /// Rebuilds a recorder by replaying a saved journal.
    pub fn from_journal(case: CaseSensitivity, clock: Clock, journal: Vec<ChangeSet>) -> Result<Self> {
        let mut vcs = Self::with_clock(case, clock);
        for change_set in journal {
            let mut pending = PendingChangeSet::default();
            for change in change_set.changes {
                let touched = vcs.apply(&change)?;
                if !touched.is_empty() {
                    for id in touched {
                        vcs.touch_chain(&mut pending, id);
                    }
                    pending.changes.push(change);
                }
            }
            vcs.close(
                pending,
                change_set.label,
                change_set.timestamp,
                Some(change_set.id),
            );
        }
        Ok(vcs)
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }

    // ==================== change-sets ====================

    pub fn begin_change_set(&mut self) {
        self.depth += 1;
        if self.depth == 1 {
            self.pending = Some(PendingChangeSet::default());
        }
    }

    /// Closes one nesting level. Only the outermost end records, using the
    /// label given to it. Returns the id when a change-set was recorded.
    pub fn end_change_set(&mut self, label: Option<String>) -> Result<Option<ChangeSetId>> {
        if self.depth == 0 {
            return Err(RecorderError::ChangeSetNotOpen);
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(None);
        }
        let pending = self.pending.take().unwrap_or_default();
        let timestamp = self.now();
        Ok(self.close(pending, label, timestamp, None))
    }

    /// Records whatever is pending under `label` and keeps a fresh
    /// change-set open at the same depth.
    pub fn seal_change_set(&mut self, label: Option<String>) -> Option<ChangeSetId> {
        if self.depth == 0 {
            return None;
        }
        let pending = self.pending.replace(PendingChangeSet::default())?;
        let timestamp = self.now();
        self.close(pending, label, timestamp, None)
    }

    pub fn is_change_set_open(&self) -> bool {
        self.depth > 0
    }

    pub fn change_set_depth(&self) -> usize {
        self.depth
    }

    // ==================== mutations ====================

    pub fn create_file(
        &mut self,
        path: &VcsPath,
        content: Content,
        timestamp: Timestamp,
    ) -> Result<()> {
        self.record(Change::CreateFile {
            path: path.clone(),
            content,
            timestamp,
        })
    }

    /// Creates the directory and any missing ancestors.
    pub fn create_directory(&mut self, path: &VcsPath) -> Result<()> {
        self.record(Change::CreateDirectory { path: path.clone() })
    }

    pub fn change_file_content(
        &mut self,
        path: &VcsPath,
        content: Content,
        timestamp: Timestamp,
    ) -> Result<()> {
        self.record(Change::ChangeContent {
            path: path.clone(),
            content,
            timestamp,
        })
    }

    pub fn delete(&mut self, path: &VcsPath) -> Result<()> {
        self.record(Change::Delete { path: path.clone() })
    }

    pub fn rename(&mut self, path: &VcsPath, new_name: &str) -> Result<()> {
        self.record(Change::Rename {
            path: path.clone(),
            new_name: new_name.to_string(),
        })
    }

    pub fn move_to(&mut self, path: &VcsPath, new_parent: &VcsPath) -> Result<()> {
        self.record(Change::Move {
            path: path.clone(),
            new_parent: new_parent.clone(),
        })
    }

    fn record(&mut self, change: Change) -> Result<()> {
        let implicit = self.depth == 0;
        if implicit {
            self.begin_change_set();
        }

        let applied = self.apply(&change);
        if let Ok(touched) = &applied {
            if !touched.is_empty() {
                let mut pending = self.pending.take().unwrap_or_default();
                for &id in touched {
                    self.touch_chain(&mut pending, id);
                }
                pending.changes.push(change);
                self.pending = Some(pending);
            }
        }

        if implicit {
            self.end_change_set(None)?;
        }
        applied.map(|_| ())
    }

    /// Applies one change to the tree. Returns the entries whose chains must
    /// be revisioned (the root touches nothing); empty when the change had no
    /// effect.
    fn apply(&mut self, change: &Change) -> Result<Vec<EntryId>> {
        match change {
            Change::CreateFile {
                path,
                content,
                timestamp,
            } => {
                let parent = self.resolve_parent(path)?;
                let name = valid_name(path.name())?;
                let key = self.case.name_key(name);
                if self.children_of(parent, path)?.contains_key(&key) {
                    return Err(RecorderError::EntryExists(path.clone()));
                }
                let id = self.arena.insert(Node::new(
                    name.to_string(),
                    Some(parent),
                    NodeKind::File {
                        content: content.clone(),
                        timestamp: *timestamp,
                    },
                ));
                self.attach(parent, key, id);
                Ok(vec![id])
            }
            Change::CreateDirectory { path } => {
                let mut current = self.root;
                let mut created = None;
                let mut walked = VcsPath::new(if path.as_str().starts_with('/') { "/" } else { "" });
                for component in path.components() {
                    walked = walked.join(component);
                    let key = self.case.name_key(component);
                    let existing = self.children_of(current, &walked)?.get(&key).copied();
                    current = match existing {
                        Some(id) => id,
                        None => {
                            let id = self.arena.insert(Node::new(
                                component.to_string(),
                                Some(current),
                                NodeKind::Dir {
                                    children: BTreeMap::new(),
                                },
                            ));
                            self.attach(current, key, id);
                            created = Some(id);
                            id
                        }
                    };
                }
                if created.is_none() && self.arena[current].children().is_none() {
                    return Err(RecorderError::NotADirectory(path.clone()));
                }
                Ok(created.map(|_| vec![current]).unwrap_or_default())
            }
            Change::ChangeContent {
                path,
                content,
                timestamp,
            } => {
                let id = self.find(path).ok_or_else(|| RecorderError::EntryNotFound(path.clone()))?;
                let NodeKind::File {
                    content: current,
                    timestamp: current_ts,
                } = &mut self.arena[id].kind
                else {
                    return Err(RecorderError::NotAFile(path.clone()));
                };
                // Unavailable content only has a length, so a new timestamp
                // counts as a change there.
                let unchanged = *current == *content
                    && (current.bytes().is_some() || *current_ts == *timestamp);
                if unchanged {
                    *current_ts = *timestamp;
                    self.invalidate_chain(id);
                    return Ok(Vec::new());
                }
                *current = content.clone();
                *current_ts = *timestamp;
                self.invalidate_chain(id);
                Ok(vec![id])
            }
            Change::Delete { path } => {
                let id = self.find(path).ok_or_else(|| RecorderError::EntryNotFound(path.clone()))?;
                let Some(parent) = self.arena[id].parent else {
                    return Err(RecorderError::EntryNotFound(path.clone()));
                };
                let key = self.case.name_key(&self.arena[id].name);
                if let Some(children) = self.arena[parent].children_mut() {
                    children.remove(&key);
                }
                self.remove_subtree(id);
                self.invalidate_chain(parent);
                // A top-level delete touches no remaining entry but is still a change.
                Ok(vec![parent])
            }
            Change::Rename { path, new_name } => {
                let id = self.find(path).ok_or_else(|| RecorderError::EntryNotFound(path.clone()))?;
                let new_name = valid_name(new_name)?;
                let Some(parent) = self.arena[id].parent else {
                    return Err(RecorderError::EntryNotFound(path.clone()));
                };
                if self.arena[id].name == new_name {
                    return Ok(Vec::new());
                }
                let old_key = self.case.name_key(&self.arena[id].name);
                let new_key = self.case.name_key(new_name);
                let children = self
                    .arena[parent]
                    .children_mut()
                    .ok_or_else(|| RecorderError::NotADirectory(path.clone()))?;
                if old_key != new_key && children.contains_key(&new_key) {
                    let target = path.parent().map(|p| p.join(new_name));
                    return Err(RecorderError::EntryExists(
                        target.unwrap_or_else(|| VcsPath::new(new_name)),
                    ));
                }
                children.remove(&old_key);
                children.insert(new_key, id);
                self.arena[id].name = new_name.to_string();
                self.invalidate_chain(id);
                Ok(vec![id])
            }
            Change::Move { path, new_parent } => {
                let id = self.find(path).ok_or_else(|| RecorderError::EntryNotFound(path.clone()))?;
                let target = self
                    .find(new_parent)
                    .ok_or_else(|| RecorderError::ParentNotFound(new_parent.clone()))?;
                if self.arena[target].children().is_none() {
                    return Err(RecorderError::NotADirectory(new_parent.clone()));
                }
                if target == id || self.is_ancestor(id, target) {
                    return Err(RecorderError::MoveIntoDescendant(path.clone()));
                }
                let Some(old_parent) = self.arena[id].parent else {
                    return Err(RecorderError::EntryNotFound(path.clone()));
                };
                if old_parent == target {
                    return Ok(Vec::new());
                }
                let key = self.case.name_key(&self.arena[id].name);
                if self.children_of(target, new_parent)?.contains_key(&key) {
                    return Err(RecorderError::EntryExists(new_parent.join(&self.arena[id].name)));
                }
                if let Some(children) = self.arena[old_parent].children_mut() {
                    children.remove(&key);
                }
                self.invalidate_chain(old_parent);
                self.attach(target, key, id);
                self.arena[id].parent = Some(target);
                self.invalidate_chain(id);
                Ok(vec![id, old_parent])
            }
        }
    }

    fn resolve_parent(&self, path: &VcsPath) -> Result<EntryId> {
        match path.parent() {
            None => Ok(self.root),
            Some(parent) if parent.is_empty() => Ok(self.root),
            Some(parent) => {
                let id = self
                    .find(&parent)
                    .ok_or_else(|| RecorderError::ParentNotFound(parent.clone()))?;
                if self.arena[id].children().is_none() {
                    return Err(RecorderError::NotADirectory(parent));
                }
                Ok(id)
            }
        }
    }

    fn children_of(&self, id: EntryId, path: &VcsPath) -> Result<&BTreeMap<String, EntryId>> {
        self.arena
            .get(id)
            .and_then(Node::children)
            .ok_or_else(|| RecorderError::NotADirectory(path.clone()))
    }

    fn attach(&mut self, parent: EntryId, key: String, id: EntryId) {
        if let Some(children) = self.arena[parent].children_mut() {
            children.insert(key, id);
        }
        self.invalidate_chain(parent);
    }

    fn remove_subtree(&mut self, id: EntryId) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if let Some(node) = self.arena.remove(node_id) {
                if let Some(children) = node.children() {
                    stack.extend(children.values().copied());
                }
            }
        }
    }

    fn is_ancestor(&self, ancestor: EntryId, mut descendant: EntryId) -> bool {
        while let Some(node) = self.arena.get(descendant) {
            match node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => descendant = parent,
                None => break,
            }
        }
        false
    }

    fn invalidate_chain(&mut self, mut id: EntryId) {
        while let Some(node) = self.arena.get_mut(id) {
            node.snapshot = None;
            match node.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
    }

    fn touch_chain(&self, pending: &mut PendingChangeSet, mut id: EntryId) {
        while id != self.root {
            if pending.seen.insert(id) {
                pending.touched.push(id);
            }
            match self.arena.get(id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => break,
            }
        }
    }

    fn close(
        &mut self,
        pending: PendingChangeSet,
        label: Option<String>,
        timestamp: Timestamp,
        id: Option<ChangeSetId>,
    ) -> Option<ChangeSetId> {
        if pending.changes.is_empty() {
            return None;
        }
        let id = id.unwrap_or_else(|| {
            self.next_id += 1;
            ChangeSetId(self.next_id - 1)
        });
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }

        for entry_id in pending.touched {
            let Some(entry) = self.cache_snapshot(entry_id) else {
                continue;
            };
            self.arena[entry_id].revisions.push(Revision {
                change_set: id,
                label: label.clone(),
                timestamp,
                entry,
            });
        }

        tracing::debug!(change_set = id.0, label = ?label, changes = pending.changes.len(), "change-set recorded");
        self.journal.push(ChangeSet {
            id,
            label,
            timestamp,
            changes: pending.changes,
        });
        Some(id)
    }

    // ==================== snapshots ====================

    fn build_snapshot(&self, id: EntryId) -> Option<Arc<Entry>> {
        let node = self.arena.get(id)?;
        if let Some(snapshot) = &node.snapshot {
            return Some(Arc::clone(snapshot));
        }
        let entry = match &node.kind {
            NodeKind::File { content, timestamp } => Entry::File {
                name: node.name.clone(),
                content: content.clone(),
                timestamp: *timestamp,
            },
            NodeKind::Dir { children } => Entry::Directory {
                name: node.name.clone(),
                children: children
                    .values()
                    .filter_map(|child| self.build_snapshot(*child))
                    .collect(),
            },
        };
        Some(Arc::new(entry))
    }

    fn cache_snapshot(&mut self, id: EntryId) -> Option<Arc<Entry>> {
        let node = self.arena.get(id)?;
        if let Some(snapshot) = &node.snapshot {
            return Some(Arc::clone(snapshot));
        }
        let children: Vec<EntryId> = node
            .children()
            .map(|c| c.values().copied().collect())
            .unwrap_or_default();
        for child in children {
            self.cache_snapshot(child);
        }
        let snapshot = self.build_snapshot(id)?;
        self.arena[id].snapshot = Some(Arc::clone(&snapshot));
        Some(snapshot)
    }

    // ==================== queries ====================

    fn find(&self, path: &VcsPath) -> Option<EntryId> {
        let mut current = self.root;
        for component in path.components() {
            let key = self.case.name_key(component);
            current = *self.arena.get(current)?.children()?.get(&key)?;
        }
        Some(current)
    }

    pub fn has_entry(&self, path: &VcsPath) -> bool {
        !path.is_empty() && self.find(path).is_some()
    }

    pub fn entry(&self, path: &VcsPath) -> Option<Arc<Entry>> {
        if path.is_empty() {
            return None;
        }
        self.build_snapshot(self.find(path)?)
    }

    pub fn is_directory(&self, path: &VcsPath) -> bool {
        self.find(path)
            .and_then(|id| self.arena.get(id))
            .is_some_and(|n| n.children().is_some())
    }

    pub fn file_timestamp(&self, path: &VcsPath) -> Option<Timestamp> {
        match &self.arena.get(self.find(path)?)?.kind {
            NodeKind::File { timestamp, .. } => Some(*timestamp),
            NodeKind::Dir { .. } => None,
        }
    }

    /// Revisions of `path`, most recent first.
    pub fn revisions_for(&self, path: &VcsPath) -> Vec<Revision> {
        if path.is_empty() {
            return Vec::new();
        }
        self.find(path)
            .and_then(|id| self.arena.get(id))
            .map(|node| node.revisions.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Every entry strictly below `path`, parents before children.
    pub fn descendants(&self, path: &VcsPath) -> Vec<(VcsPath, bool)> {
        let mut result = Vec::new();
        let Some(start) = self.find(path) else {
            return result;
        };
        let mut stack = vec![(start, path.clone())];
        while let Some((id, current)) = stack.pop() {
            let Some(children) = self.arena.get(id).and_then(Node::children) else {
                continue;
            };
            for child in children.values().rev() {
                let node = &self.arena[*child];
                let child_path = current.join(&node.name);
                let is_dir = node.children().is_some();
                result.push((child_path.clone(), is_dir));
                if is_dir {
                    stack.push((*child, child_path));
                }
            }
        }
        result
    }

    pub fn journal(&self) -> &[ChangeSet] {
        &self.journal
    }

    pub fn change_set(&self, id: ChangeSetId) -> Option<&ChangeSet> {
        self.journal.iter().find(|cs| cs.id == id)
    }

    /// Change-sets, most recent first.
    pub fn change_sets(&self) -> Vec<ChangeSetInfo> {
        self.journal
            .iter()
            .rev()
            .map(|cs| ChangeSetInfo {
                id: cs.id,
                label: cs.label.clone(),
                timestamp: cs.timestamp,
                change_count: cs.changes.len(),
            })
            .collect()
    }
}

fn valid_name(name: &str) -> Result<&str> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(RecorderError::InvalidName(name.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
#[path = "../../tests/unit/models/local_vcs.rs"]
mod tests;
