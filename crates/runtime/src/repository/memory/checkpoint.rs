use std::collections::HashMap;
use std::sync::RwLock;

use crate::repository::{Checkpoint, CheckpointRepository, RepositoryError, Result};

#[derive(Default)]
pub struct InMemoryCheckpointRepo {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointRepository for InMemoryCheckpointRepo {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.checkpoints
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .insert(checkpoint.session_id.clone(), checkpoint.clone());
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .checkpoints
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .get(session_id)
            .cloned())
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        self.checkpoints
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .remove(session_id);
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions: Vec<String> = self
            .checkpoints
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .keys()
            .cloned()
            .collect();
        sessions.sort();
        Ok(sessions)
    }
}
