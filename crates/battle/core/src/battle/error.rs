//! Engagement and tracker errors.
//!
//! Any error raised while an engagement is being fought aborts it: the
//! engagement is deregistered and the error comes back fatal, either as an
//! integrity violation or wrapped in [`BattleError::Aborted`]. Errors raised
//! before fighting starts (unknown or blocked battle, misplaced decisions)
//! are caller mistakes that leave engine state untouched.

use crate::env::OracleError;
use crate::error::{EngineError, ErrorContext, ErrorSeverity};
use crate::state::{BattleId, StateError, TerritoryId, UnitId};

use super::{DecisionKind, Side};

/// Broken invariant or illegal participant answer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegrityViolation {
    #[error("interceptor {0} was not offered")]
    InterceptorNotEligible(UnitId),

    #[error("interceptor {0} selected twice")]
    InterceptorListedTwice(UnitId),

    #[error("{selected} interceptors exceed air base capacity {cap}")]
    InterceptorCapExceeded { selected: u32, cap: u32 },

    #[error("casualty {0} is not in the roster that was fired upon")]
    CasualtyNotInRoster(UnitId),

    #[error("casualty {0} selected twice")]
    CasualtyListedTwice(UnitId),

    #[error("unit {0} cannot absorb a hit without dying")]
    CasualtyCannotAbsorb(UnitId),

    #[error("casualties consume {consumed} hits but only {hits} were rolled")]
    CasualtiesExceedHits { consumed: u32, hits: u32 },

    #[error("casualties consume {consumed} hits, at least {required} must be allocated")]
    CasualtiesUnderAllocated { consumed: u32, required: u32 },

    #[error("retreat to {0} was not offered")]
    RetreatNotOffered(TerritoryId),

    #[error("bombing target {0} was not offered")]
    TargetNotOffered(UnitId),

    #[error("queued decision is a {provided}, step expected {expected}")]
    DecisionMismatch {
        expected: DecisionKind,
        provided: DecisionKind,
    },

    #[error("no dice stored for {0:?} casualty selection")]
    MissingDice(Side),

    #[error("no participant on the {0:?} side")]
    UnknownParticipant(Side),

    #[error("execution stack still holds {remaining} steps at round rollover")]
    StackNotEmpty { remaining: usize },

    #[error("execution stack drained without reaching an outcome")]
    Stalled,
}

/// Errors raised by the dependency graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackerError {
    #[error("battle {0} is not registered")]
    UnknownBattle(BattleId),

    #[error("battle {0} cannot depend on itself")]
    SelfDependency(BattleId),

    #[error("dependency {dependent} -> {depends_on} would close a cycle")]
    Cycle {
        dependent: BattleId,
        depends_on: BattleId,
    },
}

impl EngineError for TrackerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBattle(_) => "TRACKER_UNKNOWN_BATTLE",
            Self::SelfDependency(_) => "TRACKER_SELF_DEPENDENCY",
            Self::Cycle { .. } => "TRACKER_CYCLE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("battle {0} is not registered")]
    UnknownBattle(BattleId),

    #[error("battle {battle} is blocked by {blockers:?}")]
    Blocked {
        battle: BattleId,
        blockers: Vec<BattleId>,
    },

    #[error("no strategic bombers in the bombing attack on {0}")]
    NoBombers(TerritoryId),

    #[error("battle {0} is not waiting for a decision")]
    NoPendingDecision(BattleId),

    #[error("battle {battle} is waiting for a {expected} decision, got {provided}")]
    UnexpectedDecision {
        battle: BattleId,
        expected: DecisionKind,
        provided: DecisionKind,
    },

    #[error("integrity violation: {violation}")]
    Integrity {
        violation: IntegrityViolation,
        context: ErrorContext,
    },

    /// A non-fatal error that struck mid-fight; the engagement is gone.
    #[error("battle {battle} aborted: {cause}")]
    Aborted {
        battle: BattleId,
        #[source]
        cause: Box<BattleError>,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl BattleError {
    pub fn integrity(violation: IntegrityViolation, context: ErrorContext) -> Self {
        Self::Integrity { violation, context }
    }

    /// Marks `err` as having aborted `battle`. Fatal errors pass through.
    pub fn aborting(battle: BattleId, err: BattleError) -> Self {
        if err.severity().is_fatal() {
            err
        } else {
            Self::Aborted {
                battle,
                cause: Box::new(err),
            }
        }
    }

    /// The error underneath any abort wrapper.
    pub fn root_cause(&self) -> &BattleError {
        match self {
            Self::Aborted { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn violation(&self) -> Option<&IntegrityViolation> {
        match self {
            Self::Integrity { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

impl EngineError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Integrity { .. } | Self::Aborted { .. } => ErrorSeverity::Fatal,
            Self::Oracle(err) => err.severity(),
            Self::State(err) => err.severity(),
            Self::Tracker(err) => err.severity(),
            Self::UnknownBattle(_)
            | Self::Blocked { .. }
            | Self::NoBombers(_)
            | Self::NoPendingDecision(_)
            | Self::UnexpectedDecision { .. } => ErrorSeverity::Validation,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Integrity { context, .. } => Some(context),
            Self::Aborted { cause, .. } => cause.context(),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBattle(_) => "BATTLE_UNKNOWN",
            Self::Blocked { .. } => "BATTLE_BLOCKED",
            Self::NoBombers(_) => "BATTLE_NO_BOMBERS",
            Self::NoPendingDecision(_) => "BATTLE_NO_PENDING_DECISION",
            Self::UnexpectedDecision { .. } => "BATTLE_UNEXPECTED_DECISION",
            Self::Integrity { .. } => "BATTLE_INTEGRITY_VIOLATION",
            Self::Aborted { .. } => "BATTLE_ABORTED",
            Self::Oracle(err) => err.error_code(),
            Self::State(err) => err.error_code(),
            Self::Tracker(err) => err.error_code(),
        }
    }
}
