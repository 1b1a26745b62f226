use battle_core::{BattleTracker, WorldState};
use serde::{Deserialize, Serialize};

use crate::types::Sequence;

/// Everything needed to resume fighting: the world and every registered
/// engagement with its execution stack, stored dice and pending decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub sequence: Sequence,
    pub world: WorldState,
    pub tracker: BattleTracker,
}

impl BattleSnapshot {
    pub fn new(sequence: Sequence, world: WorldState, tracker: BattleTracker) -> Self {
        Self {
            sequence,
            world,
            tracker,
        }
    }

    /// True if some engagement is suspended on a participant's answer.
    pub fn has_pending_decision(&self) -> bool {
        self.tracker
            .battles()
            .any(|battle| battle.state().pending_decision().is_some())
    }
}
