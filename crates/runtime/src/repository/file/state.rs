use std::fs;
use std::path::{Path, PathBuf};

use super::{file_keys, write_atomic};
use crate::repository::{BattleSnapshot, RepositoryError, Result, StateRepository};
use crate::types::Sequence;

/// File-based implementation of StateRepository.
///
/// Snapshots are stored as `snapshot_{sequence}.bin` in bincode format. The
/// tracker holds maps with non-string keys and nested enums, which bincode
/// encodes compactly where JSON could not.
pub struct FileStateRepository {
    base_dir: PathBuf,
}

impl FileStateRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, sequence: Sequence) -> PathBuf {
        self.base_dir.join(format!("snapshot_{}.bin", sequence))
    }

    /// Decode a snapshot file written by any `FileStateRepository`.
    pub fn read_file(path: impl AsRef<Path>) -> Result<BattleSnapshot> {
        let bytes = fs::read(path.as_ref())?;
        bincode::deserialize(&bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

impl StateRepository for FileStateRepository {
    fn save(&self, sequence: Sequence, snapshot: &BattleSnapshot) -> Result<()> {
        let path = self.snapshot_path(sequence);
        let bytes = bincode::serialize(snapshot)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        write_atomic(&path, &bytes)?;

        tracing::debug!(
            target: "runtime::repository",
            sequence,
            path = %path.display(),
            "saved snapshot"
        );
        Ok(())
    }

    fn load(&self, sequence: Sequence) -> Result<Option<BattleSnapshot>> {
        let path = self.snapshot_path(sequence);
        if !path.exists() {
            return Ok(None);
        }

        let snapshot = Self::read_file(&path)?;
        tracing::debug!(
            target: "runtime::repository",
            sequence,
            path = %path.display(),
            "loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    fn exists(&self, sequence: Sequence) -> bool {
        self.snapshot_path(sequence).exists()
    }

    fn delete(&self, sequence: Sequence) -> Result<()> {
        let path = self.snapshot_path(sequence);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(target: "runtime::repository", sequence, "deleted snapshot");
        }
        Ok(())
    }

    fn list_sequences(&self) -> Result<Vec<Sequence>> {
        let mut sequences: Vec<Sequence> = file_keys(&self.base_dir, "snapshot_", ".bin")?
            .iter()
            .filter_map(|key| key.parse().ok())
            .collect();
        sequences.sort_unstable();
        Ok(sequences)
    }
}
