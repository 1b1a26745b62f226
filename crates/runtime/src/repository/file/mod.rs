//! File-backed repositories.
//!
//! Every write goes to a temporary sibling first and is renamed into place,
//! so a crash never leaves a half-written snapshot or checkpoint behind.

mod checkpoint;
mod state;

use std::fs;
use std::path::Path;

pub use checkpoint::FileCheckpointRepository;
pub use state::FileStateRepository;

use super::Result;

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// The `{key}` parts of every `{prefix}{key}{suffix}` file in `dir`.
fn file_keys(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(key) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(prefix))
            .and_then(|rest| rest.strip_suffix(suffix))
        {
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}
