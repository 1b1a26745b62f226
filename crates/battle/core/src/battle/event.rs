use crate::combat::{CasualtyDetails, DiceRoll};
use crate::state::{BattleId, PlayerId, TerritoryId, UnitId};

use super::{BattleKind, BattleOutcome, Side, StepName};

/// Sounds a host may play; purely cosmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SoundClip {
    AirBattle,
    BombingRaid,
    Retreat,
    Victory,
    Defeat,
    Stalemate,
}

/// Fire-and-forget notification emitted while an engagement runs.
///
/// The engine only appends to a buffer; hosts drain it after each `fight`
/// call and forward the events wherever they like.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    BattleShown {
        battle: BattleId,
        site: TerritoryId,
        kind: BattleKind,
        attackers: Vec<UnitId>,
        defenders: Vec<UnitId>,
    },
    StepsListed {
        battle: BattleId,
        steps: Vec<StepName>,
    },
    StepEntered {
        battle: BattleId,
        step: StepName,
    },
    History {
        battle: BattleId,
        player: Option<PlayerId>,
        text: String,
    },
    Casualties {
        battle: BattleId,
        step: StepName,
        hit_player: PlayerId,
        dice: DiceRoll,
        details: CasualtyDetails,
    },
    UnitsRemoved {
        battle: BattleId,
        side: Side,
        units: Vec<UnitId>,
    },
    Retreated {
        battle: BattleId,
        side: Side,
        units: Vec<UnitId>,
        /// `None` when grounded in place.
        to: Option<TerritoryId>,
    },
    Sound {
        battle: BattleId,
        clip: SoundClip,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    pub fn battle(&self) -> BattleId {
        match self {
            Self::BattleShown { battle, .. }
            | Self::StepsListed { battle, .. }
            | Self::StepEntered { battle, .. }
            | Self::History { battle, .. }
            | Self::Casualties { battle, .. }
            | Self::UnitsRemoved { battle, .. }
            | Self::Retreated { battle, .. }
            | Self::Sound { battle, .. } => *battle,
            Self::BattleEnded { outcome } => outcome.battle,
        }
    }

    /// History text, if this event is a history entry.
    pub fn history_text(&self) -> Option<&str> {
        match self {
            Self::History { text, .. } => Some(text),
            _ => None,
        }
    }
}
