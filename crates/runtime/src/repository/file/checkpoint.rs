use std::fs;
use std::path::{Path, PathBuf};

use super::{file_keys, write_atomic};
use crate::repository::{Checkpoint, CheckpointRepository, RepositoryError, Result};

/// Pretty-printed JSON, one `checkpoint_{session}.json` per session, so a
/// save directory can be inspected by hand.
pub struct FileCheckpointRepository {
    dir: PathBuf,
}

impl FileCheckpointRepository {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("checkpoint_{session_id}.json"))
    }
}

impl CheckpointRepository for FileCheckpointRepository {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.path_for(&checkpoint.session_id);
        let json = serde_json::to_vec_pretty(checkpoint)
            .map_err(|err| RepositoryError::Json(err.to_string()))?;
        write_atomic(&path, &json)?;

        tracing::debug!(
            target: "runtime::repository",
            session = %checkpoint.session_id,
            sequence = checkpoint.sequence,
            pending = checkpoint.pending_battles,
            "checkpoint written"
        );
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let checkpoint = serde_json::from_slice(&fs::read(&path)?)
            .map_err(|err| RepositoryError::Json(err.to_string()))?;
        Ok(Some(checkpoint))
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.path_for(session_id);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(target: "runtime::repository", session = session_id, "checkpoint deleted");
        }
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions = file_keys(&self.dir, "checkpoint_", ".json")?;
        sessions.sort();
        Ok(sessions)
    }
}
