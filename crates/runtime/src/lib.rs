//! Async orchestration for the battle engine.
//!
//! This crate wires the decision provider abstraction, oracle access,
//! repositories and the battle worker into one runtime API. Consumers embed
//! [`Runtime`] to declare attacks and fight them, subscribe to events, and
//! query the world through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`driver`] routes suspended engagements to decision providers
//! - [`events`] provides the topic-based event bus
//! - [`oracle`] and [`repository`] provide data adapters reused by tools
//! - [`scenario`] loads RON scenario files
pub mod api;
pub mod driver;
pub mod events;
pub mod oracle;
pub mod repository;
pub mod runtime;
pub mod scenario;
pub mod types;
pub mod utils;

mod workers;

pub use api::{
    BattleSummary, DecisionProvider, DefaultDecisionProvider, ProviderKind, ProviderRegistry,
    Result, RuntimeError, RuntimeHandle, ScriptedDecisionProvider,
};
pub use driver::BattleDriver;
pub use events::{DecisionEvent, Event, EventBus, Topic, TrackerEvent};
pub use oracle::{ConfigOracleImpl, MapOracleImpl, OracleManager, UnitOracleImpl};
pub use repository::{
    BattleSnapshot, Checkpoint, CheckpointRepository, FileCheckpointRepository,
    FileStateRepository, InMemoryCheckpointRepo, InMemoryStateRepo, RepositoryError,
    SnapshotService, StateReference, StateRepository,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use scenario::{PlannedAttack, Scenario, ScenarioSetup};
