//! Platform-specific directory utilities
//!
//! `BATTLE_DATA_DIR` and `BATTLE_LOG_DIR` override the platform defaults.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "battle";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Log directory
///
/// - Linux: `~/.cache/battle/logs` (or `$XDG_CACHE_HOME/battle/logs`)
/// - macOS: `~/Library/Caches/battle/logs`
/// - Fallback: `/tmp/battle/logs`
pub fn log_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("BATTLE_LOG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base_dir = project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/battle"));

    Ok(base_dir.join("logs"))
}

/// Save data directory, one subdirectory per session
///
/// - Linux: `~/.local/share/battle` (or `$XDG_DATA_HOME/battle`)
/// - macOS: `~/Library/Application Support/battle`
/// - Fallback: `./save_data`
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("BATTLE_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data")))
}

/// Session directories under `root`, newest first.
pub fn list_sessions(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut sessions: Vec<(String, PathBuf, std::time::SystemTime)> = Vec::new();

    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir()
            && let Some(session_id) = path.file_name().and_then(|n| n.to_str())
        {
            let modified = entry.metadata()?.modified()?;
            sessions.push((session_id.to_string(), path.clone(), modified));
        }
    }

    sessions.sort_by(|a, b| b.2.cmp(&a.2));

    Ok(sessions
        .into_iter()
        .map(|(id, path, _)| (id, path))
        .collect())
}
