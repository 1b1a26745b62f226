//! Deterministic combat resolution shared by the runtime and offline tools.
//!
//! `battle-core` owns the rules for resolving a single engagement (interception,
//! fire, casualties, retreat) as a resumable [`battle::ExecutionStack`] of steps,
//! plus the [`battle::BattleTracker`] dependency graph that coordinates
//! engagements blocking one another. Everything here is synchronous and pure:
//! remote decisions surface as [`battle::DecisionRequest`] values and the engine
//! suspends until the caller supplies a [`battle::Decision`].
pub mod battle;
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod state;

pub use battle::{
    BattleContext, BattleError, BattleEvent, BattleKind, BattleOutcome, BattleRecord,
    BattleResultDescription, BattleTracker, Decision, DecisionKind, DecisionRequest, Engagement,
    ExecutionStack, FightStatus, IntegrityViolation, Route, Side, SoundClip, Step, StepName,
    TrackerError, WhoWon,
};
pub use combat::{CasualtyDetails, DiceRoll, Die, Role};
pub use config::BattleConfig;
pub use env::{
    BattleEnv, ConfigOracle, Env, MapOracle, OracleError, PcgRng, RngOracle, UnitCapabilities,
    UnitOracle, UnitTypeDef,
};
pub use error::{EngineError, ErrorContext, ErrorSeverity};
pub use state::{
    BattleId, PlayerId, StateError, TerritoryId, TerritoryState, Unit, UnitFlags, UnitId,
    UnitTypeId, WorldState,
};
