//! Immutable entry snapshots stored in revisions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Stored(Vec<u8>),
    /// Too large to keep; only the length is known.
    Unavailable { length: u64 },
}

impl Content {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Stored(bytes) => Some(bytes),
            Content::Unavailable { .. } => None,
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Content::Stored(bytes) => bytes.len() as u64,
            Content::Unavailable { length } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Stored(value.as_bytes().to_vec())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Stored(value.into_bytes())
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Stored(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    File {
        name: String,
        content: Content,
        timestamp: Timestamp,
    },
    Directory {
        name: String,
        children: Vec<Arc<Entry>>,
    },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File { name, .. } | Entry::Directory { name, .. } => name,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }

    pub fn content(&self) -> Option<&Content> {
        match self {
            Entry::File { content, .. } => Some(content),
            Entry::Directory { .. } => None,
        }
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Entry::File { timestamp, .. } => Some(*timestamp),
            Entry::Directory { .. } => None,
        }
    }

    pub fn children(&self) -> &[Arc<Entry>] {
        match self {
            Entry::Directory { children, .. } => children,
            Entry::File { .. } => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&Arc<Entry>> {
        self.children().iter().find(|c| c.name() == name)
    }
}
