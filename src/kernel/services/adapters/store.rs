//! Journal storage.
//!
//! Each set of content roots gets one JSON journal in the data directory:
//! - macOS: ~/Library/Application Support/localhist/journals/<hash>.json
//! - Linux: ~/.local/share/localhist/journals/<hash>.json
//! - Windows: %APPDATA%\localhist\journals\<hash>.json

use crate::models::ChangeSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "localhist";
const JOURNAL_DIR: &str = "journals";
const LOG_DIR: &str = "logs";
const JOURNAL_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("journal io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed journal: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported journal version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct JournalFileRef<'a> {
    version: u32,
    change_sets: &'a [ChangeSet],
}

#[derive(Deserialize)]
struct JournalFile {
    version: u32,
    #[serde(default)]
    change_sets: Vec<ChangeSet>,
}

pub fn get_app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

pub fn get_journal_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(JOURNAL_DIR))
}

/// Order-independent digest of the content roots. Stable across builds, so
/// a journal is found again after a toolchain upgrade.
fn hash_roots(roots: &[PathBuf]) -> String {
    let mut sorted: Vec<String> = roots
        .iter()
        .map(|root| root.to_string_lossy().into_owned())
        .collect();
    sorted.sort();
    let mut hasher = Sha256::new();
    for root in &sorted {
        hasher.update(root.as_bytes());
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Default journal location for a set of content roots.
pub fn default_journal_path(roots: &[PathBuf]) -> Option<PathBuf> {
    get_journal_dir().map(|dir| dir.join(format!("{}.json", hash_roots(roots))))
}

pub fn ensure_log_dir() -> io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine log directory")
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty journal.
    pub fn load(&self) -> Result<Vec<ChangeSet>, StoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let file: JournalFile = serde_json::from_str(&data)?;
        if file.version != JOURNAL_VERSION {
            return Err(StoreError::UnsupportedVersion(file.version));
        }
        tracing::debug!(
            path = %self.path.display(),
            change_sets = file.change_sets.len(),
            "journal loaded"
        );
        Ok(file.change_sets)
    }

    /// Writes to a sibling temp file first, then renames over the journal.
    pub fn save(&self, change_sets: &[ChangeSet]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec(&JournalFileRef {
            version: JOURNAL_VERSION,
            change_sets,
        })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            change_sets = change_sets.len(),
            "journal saved"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/store.rs"]
mod tests;
