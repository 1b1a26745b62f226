use crate::state::{BattleId, PlayerId, TerritoryId};

/// What kind of encounter an engagement resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleKind {
    /// Ground or sea combat.
    Normal,
    /// Escort fighters against defending planes, ahead of a normal battle.
    AirBattle,
    /// Interceptors against a strategic bombing force.
    AirRaid,
    /// Surviving bombers strike their chosen targets.
    BombingRaid,
}

impl BattleKind {
    /// Air kinds fire with air strength and launch interceptors on round one.
    #[inline]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::AirBattle | Self::AirRaid)
    }

    #[inline]
    pub const fn is_raid(self) -> bool {
        matches!(self, Self::AirRaid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    #[inline]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// Terminal outcome of an engagement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WhoWon {
    #[default]
    NotFinished,
    Attacker,
    Defender,
    Draw,
    NoEngagement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleResultDescription {
    #[strum(serialize = "won without conquering")]
    WonWithoutConquering,
    #[strum(serialize = "won with enemy left")]
    WonWithEnemyLeft,
    #[strum(serialize = "stalemate")]
    Stalemate,
    #[strum(serialize = "lost")]
    Lost,
    #[strum(serialize = "bombed")]
    Bombed,
    #[strum(serialize = "no battle")]
    NoBattle,
}

/// How an engagement ended, as reported to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleOutcome {
    pub battle: BattleId,
    pub who_won: WhoWon,
    pub description: BattleResultDescription,
    pub rounds: u32,
    pub attacker_lost_value: u32,
    pub defender_lost_value: u32,
}

/// Ledger entry kept by the tracker for every concluded engagement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleRecord {
    pub battle: BattleId,
    pub site: TerritoryId,
    pub kind: BattleKind,
    pub attacker: PlayerId,
    pub defender: Option<PlayerId>,
    pub outcome: BattleOutcome,
}

/// Path of an attacking force: where it came from and where it strikes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub start: TerritoryId,
    pub end: TerritoryId,
}

impl Route {
    pub const fn new(start: TerritoryId, end: TerritoryId) -> Self {
        Self { start, end }
    }
}

/// Names shown to players for each phase of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepName {
    #[strum(serialize = "Defender Launches Interceptors")]
    InterceptorsLaunch,
    #[strum(serialize = "Attackers Fire")]
    AttackersFire,
    #[strum(serialize = "Defenders Fire")]
    DefendersFire,
    #[strum(serialize = "Attackers Withdraw?")]
    AttackersWithdraw,
    #[strum(serialize = "Defenders Withdraw?")]
    DefendersWithdraw,
    #[strum(serialize = "Bombing Raid")]
    BombingRaid,
}

impl StepName {
    pub const fn fire(side: Side) -> Self {
        match side {
            Side::Attacker => Self::AttackersFire,
            Side::Defender => Self::DefendersFire,
        }
    }

    pub const fn withdraw(side: Side) -> Self {
        match side {
            Side::Attacker => Self::AttackersWithdraw,
            Side::Defender => Self::DefendersWithdraw,
        }
    }
}
