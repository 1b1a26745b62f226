//! Checkpoint metadata.
//!
//! A checkpoint is the commit point of a save: it names the snapshot a
//! session resumes from and the hash that snapshot must still have.

use serde::{Deserialize, Serialize};

use super::BattleSnapshot;
use crate::types::{Sequence, SessionId, StateHash, Timestamp};

/// Pointer to the latest saved snapshot of a session, plus enough of its
/// shape to list sessions without decoding the snapshot itself.
///
/// ```text
/// checkpoints/checkpoint_{session}.json   <- this structure
/// snapshots/snapshot_{sequence}.bin       <- full BattleSnapshot
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: SessionId,
    pub timestamp: Timestamp,
    /// "before the air raid on Normandy"
    pub label: Option<String>,
    pub sequence: Sequence,
    pub state_ref: StateReference,
    /// Engagements still registered when the snapshot was taken.
    #[serde(default)]
    pub pending_battles: usize,
    /// Some engagement was suspended on a participant's answer.
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReference {
    /// Hex sha256 of the snapshot's bincode encoding
    pub state_hash: StateHash,
    /// `false` for a checkpoint written ahead of its snapshot file
    pub is_persisted: bool,
}

impl Checkpoint {
    pub fn new(session_id: impl Into<SessionId>, sequence: Sequence, state_ref: StateReference) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: current_timestamp(),
            label: None,
            sequence,
            state_ref,
            pending_battles: 0,
            suspended: false,
        }
    }

    /// Checkpoint for a snapshot that has been written under `state_hash`.
    pub fn for_snapshot(
        session_id: impl Into<SessionId>,
        snapshot: &BattleSnapshot,
        state_hash: StateHash,
    ) -> Self {
        Self {
            pending_battles: snapshot.tracker.battle_ids().len(),
            suspended: snapshot.has_pending_decision(),
            ..Self::new(session_id, snapshot.sequence, StateReference::persisted(state_hash))
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn has_state(&self) -> bool {
        self.state_ref.is_persisted
    }
}

impl StateReference {
    pub fn persisted(state_hash: StateHash) -> Self {
        Self {
            state_hash,
            is_persisted: true,
        }
    }

    pub fn pending(state_hash: StateHash) -> Self {
        Self {
            state_hash,
            is_persisted: false,
        }
    }
}

fn current_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
