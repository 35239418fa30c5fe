//! Slash-separated paths used as keys of the versioned tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }

    pub fn from_flag(case_sensitive: Option<bool>) -> Self {
        match case_sensitive {
            Some(true) => CaseSensitivity::Sensitive,
            Some(false) => CaseSensitivity::Insensitive,
            None => Self::platform_default(),
        }
    }

    /// Key under which a child name is stored in its parent.
    pub fn name_key(self, name: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => name.to_string(),
            CaseSensitivity::Insensitive => name.to_lowercase(),
        }
    }

    pub fn names_equal(self, a: &str, b: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Normalized path: `/` separators, no empty or `.` components, no trailing
/// separator. A leading `/` is kept. A backslash is an ordinary name
/// character; only `from_fs` translates Windows separators.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VcsPath(String);

impl VcsPath {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        let absolute = raw.starts_with('/');
        let mut parts: Vec<&str> = Vec::new();
        for part in raw.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }

        let mut normalized = String::with_capacity(raw.len());
        if absolute {
            normalized.push('/');
        }
        normalized.push_str(&parts.join("/"));
        Self(normalized)
    }

    pub fn from_fs(path: &Path) -> Self {
        let raw = path.to_string_lossy();
        if cfg!(windows) {
            Self::new(raw.replace('\\', "/"))
        } else {
            Self::new(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.components().next().is_none()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    pub fn name(&self) -> &str {
        self.components().last().unwrap_or("")
    }

    pub fn parent(&self) -> Option<VcsPath> {
        let idx = self.0.rfind('/')?;
        let parent = &self.0[..idx];
        if parent.is_empty() {
            if self.0.starts_with('/') && self.0.len() > 1 {
                return Some(VcsPath("/".to_string()));
            }
            return None;
        }
        Some(VcsPath(parent.to_string()))
    }

    pub fn join(&self, name: &str) -> VcsPath {
        if self.0.is_empty() {
            return VcsPath::new(name);
        }
        VcsPath::new(format!("{}/{}", self.0, name))
    }

    /// True when `self` equals `other` or contains it.
    pub fn is_ancestor_of(&self, other: &VcsPath, case: CaseSensitivity) -> bool {
        let mut mine = self.components();
        let mut theirs = other.components();
        if self.0.starts_with('/') != other.0.starts_with('/') {
            return false;
        }
        loop {
            match (mine.next(), theirs.next()) {
                (None, _) => return true,
                (Some(_), None) => return false,
                (Some(a), Some(b)) => {
                    if !case.names_equal(a, b) {
                        return false;
                    }
                }
            }
        }
    }

    pub fn to_path_buf(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.0)
    }
}

impl fmt::Display for VcsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VcsPath {
    fn from(value: String) -> Self {
        VcsPath::new(value)
    }
}

impl From<&str> for VcsPath {
    fn from(value: &str) -> Self {
        VcsPath::new(value)
    }
}

impl From<VcsPath> for String {
    fn from(value: VcsPath) -> Self {
        value.0
    }
}

impl AsRef<str> for VcsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/path.rs"]
mod tests;
