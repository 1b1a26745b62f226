//! Engagement resolution.
//!
//! An [`Engagement`] is a resumable state machine driven by an
//! [`ExecutionStack`] of [`Step`]s. Steps that need a participant's choice
//! suspend the stack with a [`DecisionRequest`]; the caller answers with a
//! [`Decision`] and fights again. The [`BattleTracker`] owns every pending
//! engagement and the dependency edges between them.
mod context;
mod decision;
pub mod eligibility;
mod engagement;
mod error;
mod event;
pub mod stack;
mod step;
mod tracker;
mod types;

pub use context::BattleContext;
pub use decision::{Decision, DecisionKind, DecisionRequest};
pub use engagement::{Engagement, EngagementState, FightStatus};
pub use error::{BattleError, IntegrityViolation, TrackerError};
pub use event::{BattleEvent, SoundClip};
pub use stack::{Executable, ExecutionStack, StackStatus, StepControl};
pub use step::Step;
pub use tracker::BattleTracker;
pub use types::{
    BattleKind, BattleOutcome, BattleRecord, BattleResultDescription, Route, Side, StepName,
    WhoWon,
};
