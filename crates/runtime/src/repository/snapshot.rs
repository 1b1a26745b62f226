//! Coordinated snapshot persistence.

use std::path::Path;

use super::{
    BattleSnapshot, Checkpoint, CheckpointRepository, FileCheckpointRepository,
    FileStateRepository, RepositoryError, Result, StateRepository,
};
use crate::utils::hash_snapshot;

/// Saves snapshots with a two-phase commit.
///
/// 1. The snapshot is written to the state repository.
/// 2. The checkpoint naming it is written to the checkpoint repository.
///
/// If a checkpoint exists, the snapshot it references exists too.
pub struct SnapshotService {
    state_repo: Box<dyn StateRepository>,
    checkpoint_repo: Box<dyn CheckpointRepository>,
}

impl SnapshotService {
    pub fn new(
        state_repo: Box<dyn StateRepository>,
        checkpoint_repo: Box<dyn CheckpointRepository>,
    ) -> Self {
        Self {
            state_repo,
            checkpoint_repo,
        }
    }

    /// `base_dir/snapshots` holds bincode snapshots, `base_dir/checkpoints`
    /// the JSON checkpoints.
    pub fn new_file_based(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_dir.as_ref();
        Ok(Self {
            state_repo: Box::new(FileStateRepository::new(base_path.join("snapshots"))?),
            checkpoint_repo: Box::new(FileCheckpointRepository::new(
                base_path.join("checkpoints"),
            )?),
        })
    }

    /// Persist `snapshot` and point the session's checkpoint at it.
    pub fn save_snapshot(
        &self,
        session_id: impl Into<String>,
        snapshot: &BattleSnapshot,
        label: Option<String>,
    ) -> Result<Checkpoint> {
        let state_hash = hash_snapshot(snapshot)?;

        self.state_repo.save(snapshot.sequence, snapshot)?;

        let mut checkpoint = Checkpoint::for_snapshot(session_id, snapshot, state_hash);
        checkpoint.label = label;
        self.checkpoint_repo.save(&checkpoint)?;

        tracing::info!(
            target: "runtime::repository",
            session = %checkpoint.session_id,
            sequence = snapshot.sequence,
            battles = snapshot.tracker.battle_ids().len(),
            "saved snapshot"
        );
        Ok(checkpoint)
    }

    /// Load the snapshot a session's checkpoint points at, verifying its hash.
    pub fn load_snapshot(&self, session_id: &str) -> Result<Option<(BattleSnapshot, Checkpoint)>> {
        let Some(checkpoint) = self.checkpoint_repo.load(session_id)? else {
            return Ok(None);
        };

        if !checkpoint.has_state() {
            tracing::warn!(
                target: "runtime::repository",
                session = session_id,
                sequence = checkpoint.sequence,
                "checkpoint has no persisted snapshot"
            );
            return Ok(None);
        }

        let Some(snapshot) = self.state_repo.load(checkpoint.sequence)? else {
            return Err(RepositoryError::MissingSnapshot {
                session: session_id.to_string(),
                sequence: checkpoint.sequence,
            });
        };

        let actual = hash_snapshot(&snapshot)?;
        if actual != checkpoint.state_ref.state_hash {
            return Err(RepositoryError::HashMismatch {
                sequence: checkpoint.sequence,
                expected: checkpoint.state_ref.state_hash.clone(),
                actual,
            });
        }

        Ok(Some((snapshot, checkpoint)))
    }

    pub fn get_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        self.checkpoint_repo.load(session_id)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>> {
        self.checkpoint_repo.list_sessions()
    }

    /// Delete a session's checkpoint and the snapshot it references.
    pub fn delete_snapshot(&self, session_id: &str) -> Result<()> {
        if let Some(checkpoint) = self.checkpoint_repo.load(session_id)? {
            if checkpoint.has_state() {
                self.state_repo.delete(checkpoint.sequence)?;
            }
            self.checkpoint_repo.delete(session_id)?;

            tracing::info!(
                target: "runtime::repository",
                session = session_id,
                sequence = checkpoint.sequence,
                "deleted snapshot"
            );
        }
        Ok(())
    }

    pub fn state_repo(&self) -> &dyn StateRepository {
        &*self.state_repo
    }

    pub fn checkpoint_repo(&self) -> &dyn CheckpointRepository {
        &*self.checkpoint_repo
    }
}
