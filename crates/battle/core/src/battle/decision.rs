//! Questions an engagement puts to participants, and their answers.
//!
//! An engagement never blocks on a participant. The step that needs input
//! suspends with a [`DecisionRequest`]; the host routes it to whoever decides
//! for `player()`, then hands the [`Decision`] back through
//! [`super::BattleTracker::provide_decision`] and fights again.

use crate::combat::{CasualtyDetails, DiceRoll};
use crate::state::{BattleId, PlayerId, TerritoryId, UnitId};

use super::{Side, StepName};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecisionKind {
    Interceptors,
    Casualties,
    ConfirmCasualties,
    Retreat,
    BomberTarget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecisionRequest {
    /// Which eligible planes take off against the attacker.
    SelectInterceptors {
        battle: BattleId,
        player: PlayerId,
        site: TerritoryId,
        candidates: Vec<UnitId>,
        /// Air base capacity; `None` when unlimited.
        max: Option<u32>,
    },
    /// How the hit player absorbs `hits`.
    SelectCasualties {
        battle: BattleId,
        player: PlayerId,
        hits: u32,
        candidates: Vec<UnitId>,
        default: CasualtyDetails,
        dice: DiceRoll,
    },
    /// Both sides must acknowledge a casualty notification.
    ConfirmCasualties {
        battle: BattleId,
        hit_player: PlayerId,
        firing_player: PlayerId,
        step: StepName,
        dice: DiceRoll,
        details: CasualtyDetails,
    },
    Retreat {
        battle: BattleId,
        player: PlayerId,
        side: Side,
        units: Vec<UnitId>,
        /// Territories the side may withdraw to.
        candidates: Vec<TerritoryId>,
        message: String,
    },
    BomberTarget {
        battle: BattleId,
        player: PlayerId,
        bomber: UnitId,
        targets: Vec<UnitId>,
    },
}

impl DecisionRequest {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::SelectInterceptors { .. } => DecisionKind::Interceptors,
            Self::SelectCasualties { .. } => DecisionKind::Casualties,
            Self::ConfirmCasualties { .. } => DecisionKind::ConfirmCasualties,
            Self::Retreat { .. } => DecisionKind::Retreat,
            Self::BomberTarget { .. } => DecisionKind::BomberTarget,
        }
    }

    pub fn battle(&self) -> BattleId {
        match self {
            Self::SelectInterceptors { battle, .. }
            | Self::SelectCasualties { battle, .. }
            | Self::ConfirmCasualties { battle, .. }
            | Self::Retreat { battle, .. }
            | Self::BomberTarget { battle, .. } => *battle,
        }
    }

    /// Participant the request is addressed to. For a confirmation this is
    /// the hit player; the firing player confirms alongside.
    pub fn player(&self) -> PlayerId {
        match self {
            Self::SelectInterceptors { player, .. }
            | Self::SelectCasualties { player, .. }
            | Self::Retreat { player, .. }
            | Self::BomberTarget { player, .. } => *player,
            Self::ConfirmCasualties { hit_player, .. } => *hit_player,
        }
    }

    /// The answer an unattended participant gives.
    pub fn default_decision(&self) -> Decision {
        match self {
            Self::SelectInterceptors {
                candidates, max, ..
            } => {
                let take = max.map_or(candidates.len(), |max| candidates.len().min(max as usize));
                Decision::Interceptors(candidates[..take].to_vec())
            }
            Self::SelectCasualties { default, .. } => Decision::Casualties(default.clone()),
            Self::ConfirmCasualties { .. } => Decision::Acknowledged,
            Self::Retreat { .. } => Decision::Retreat(None),
            Self::BomberTarget { targets, bomber, .. } => {
                Decision::BomberTarget(targets.first().copied().unwrap_or(*bomber))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decision {
    Interceptors(Vec<UnitId>),
    Casualties(CasualtyDetails),
    Acknowledged,
    /// `None` stays and fights.
    Retreat(Option<TerritoryId>),
    BomberTarget(UnitId),
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Interceptors(_) => DecisionKind::Interceptors,
            Self::Casualties(_) => DecisionKind::Casualties,
            Self::Acknowledged => DecisionKind::ConfirmCasualties,
            Self::Retreat(_) => DecisionKind::Retreat,
            Self::BomberTarget(_) => DecisionKind::BomberTarget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interceptors_respect_capacity() {
        let request = DecisionRequest::SelectInterceptors {
            battle: BattleId(1),
            player: PlayerId(2),
            site: TerritoryId(3),
            candidates: vec![UnitId(1), UnitId(2), UnitId(3)],
            max: Some(2),
        };
        assert_eq!(
            request.default_decision(),
            Decision::Interceptors(vec![UnitId(1), UnitId(2)])
        );
        assert_eq!(request.kind(), request.default_decision().kind());
    }

    #[test]
    fn default_retreat_stays() {
        let request = DecisionRequest::Retreat {
            battle: BattleId(1),
            player: PlayerId(1),
            side: Side::Attacker,
            units: vec![UnitId(4)],
            candidates: vec![TerritoryId(9)],
            message: String::new(),
        };
        assert_eq!(request.default_decision(), Decision::Retreat(None));
    }
}
