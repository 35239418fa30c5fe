//! Notifications delivered to the history core.

use crate::models::VcsPath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProperty {
    Name,
    Other(String),
}

/// File-system notification. `path` is always where the file lives after
/// the event; the old location is recovered from the extra fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created {
        path: VcsPath,
    },
    ContentsChanged {
        path: VcsPath,
    },
    Deleted {
        path: VcsPath,
        parent: VcsPath,
    },
    PropertyChanged {
        path: VcsPath,
        property: FileProperty,
        old_value: String,
    },
    Moved {
        path: VcsPath,
        old_parent: VcsPath,
        new_parent: VcsPath,
    },
}

impl FsEvent {
    pub fn created(path: impl Into<VcsPath>) -> Self {
        FsEvent::Created { path: path.into() }
    }

    pub fn contents_changed(path: impl Into<VcsPath>) -> Self {
        FsEvent::ContentsChanged { path: path.into() }
    }

    pub fn deleted(path: impl Into<VcsPath>) -> Self {
        let path = path.into();
        let parent = path.parent().unwrap_or_else(|| VcsPath::new(""));
        FsEvent::Deleted { path, parent }
    }

    /// Events for `from` ending up at `to`: a name change when both share a
    /// parent, a move when only the parent differs, and a move followed by a
    /// name change when both differ.
    pub fn relocated(from: &VcsPath, to: &VcsPath) -> Vec<Self> {
        let old_parent = from.parent().unwrap_or_else(|| VcsPath::new(""));
        let new_parent = to.parent().unwrap_or_else(|| VcsPath::new(""));
        let renamed = FsEvent::PropertyChanged {
            path: to.clone(),
            property: FileProperty::Name,
            old_value: from.name().to_string(),
        };
        if old_parent == new_parent {
            return vec![renamed];
        }
        let moved = FsEvent::Moved {
            path: new_parent.join(from.name()),
            old_parent,
            new_parent,
        };
        if from.name() == to.name() {
            vec![moved]
        } else {
            vec![moved, renamed]
        }
    }

    pub fn path(&self) -> &VcsPath {
        match self {
            FsEvent::Created { path }
            | FsEvent::ContentsChanged { path }
            | FsEvent::Deleted { path, .. }
            | FsEvent::PropertyChanged { path, .. }
            | FsEvent::Moved { path, .. } => path,
        }
    }
}

/// Host command notification; `name` becomes the change-set label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEvent {
    pub name: Option<String>,
}

impl CommandEvent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn unnamed() -> Self {
        Self::default()
    }
}
