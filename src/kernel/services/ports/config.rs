use crate::models::CaseSensitivity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files above this size keep only their length in history.
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 2 * 1024 * 1024;

pub const DEFAULT_IGNORED_NAMES: &[&str] = &[
    ".DS_Store",
    ".Spotlight-V100",
    ".Trashes",
    ".fseventsd",
    ".TemporaryItems",
    "Thumbs.db",
    "desktop.ini",
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub content_roots: Vec<PathBuf>,
    /// Glob patterns matched against full paths.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

fn default_ignored_names() -> Vec<String> {
    DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_max_content_length() -> u64 {
    DEFAULT_MAX_CONTENT_LENGTH
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            content_roots: Vec::new(),
            exclude: Vec::new(),
            ignored_names: default_ignored_names(),
            case_sensitive: None,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            store_path: None,
        }
    }
}

impl HistoryConfig {
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        CaseSensitivity::from_flag(self.case_sensitive)
    }
}
