//! Event types for the non-engine topics.

use battle_core::{BattleId, BattleKind, BattleRecord, DecisionKind, PlayerId, TerritoryId};
use serde::{Deserialize, Serialize};

/// Traffic between the driver and decision providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionEvent {
    /// An engagement suspended and its request was routed to `player`.
    Requested {
        battle: BattleId,
        kind: DecisionKind,
        player: PlayerId,
    },

    /// The provider's answer was accepted by the engagement.
    Answered { battle: BattleId, kind: DecisionKind },

    /// A confirmation did not complete. The engagement continues.
    ConfirmationFailed {
        battle: BattleId,
        player: PlayerId,
        error: String,
    },
}

/// Lifecycle of engagements in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerEvent {
    Declared {
        battle: BattleId,
        site: TerritoryId,
        kind: BattleKind,
    },

    Concluded { record: BattleRecord },

    /// Fatal error; the engagement was deregistered without a record.
    Aborted { battle: BattleId, error: String },

    Voided { battle: BattleId },
}
