use crate::kernel::services::ports::HistoryConfig;
use std::io;
use std::path::{Path, PathBuf};

const SETTINGS_DIR: &str = "localhist";
const SETTINGS_FILE: &str = "localhist.json";

pub fn get_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

pub fn ensure_settings_file() -> io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine settings directory")
    })?;
    ensure_settings_file_at(&path)?;
    Ok(path)
}

/// Writes default settings to `path` unless a file is already there.
pub fn ensure_settings_file_at(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content = serde_json::to_string_pretty(&HistoryConfig::default())
            .unwrap_or_else(|_| "{}".to_string());
        std::fs::write(path, content)?;
    }
    Ok(())
}

pub fn load_settings() -> Option<HistoryConfig> {
    let path = get_settings_path()?;
    match load_settings_from(&path) {
        Ok(config) => Some(config),
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings");
            }
            None
        }
    }
}

pub fn load_settings_from(path: &Path) -> io::Result<HistoryConfig> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
