//! Repository contracts for saving and loading mutable runtime state.

use super::{BattleSnapshot, Checkpoint, Result};
use crate::types::Sequence;

/// Persistence for battle snapshots, indexed by sequence number.
pub trait StateRepository: Send + Sync {
    fn save(&self, sequence: Sequence, snapshot: &BattleSnapshot) -> Result<()>;

    fn load(&self, sequence: Sequence) -> Result<Option<BattleSnapshot>>;

    fn exists(&self, sequence: Sequence) -> bool;

    fn delete(&self, sequence: Sequence) -> Result<()>;

    /// All stored sequence numbers, ascending.
    fn list_sequences(&self) -> Result<Vec<Sequence>> {
        Ok(vec![])
    }

    /// Delete every snapshot in `[start, end]`, returning how many existed.
    fn delete_range(&self, start: Sequence, end: Sequence) -> Result<usize> {
        let mut deleted = 0;
        for sequence in start..=end {
            if self.exists(sequence) {
                self.delete(sequence)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// Persistence for checkpoints, one per session.
pub trait CheckpointRepository: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    fn load(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    fn delete(&self, session_id: &str) -> Result<()>;

    fn list_sessions(&self) -> Result<Vec<String>>;
}
