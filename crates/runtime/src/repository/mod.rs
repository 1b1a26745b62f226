//! Repository layer for dynamic runtime data.
//!
//! Repositories hold what changes while battles are fought:
//! - Battle snapshots (world plus tracker, including suspended engagements)
//! - Checkpoints pointing at the latest snapshot of a session
//!
//! Static rules (unit types, map, config) come from oracles, not repositories.

mod error;
mod file;
mod memory;
mod snapshot;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::{FileCheckpointRepository, FileStateRepository};
pub use memory::{InMemoryCheckpointRepo, InMemoryStateRepo};
pub use snapshot::SnapshotService;
pub use traits::{CheckpointRepository, StateRepository};
pub use types::{BattleSnapshot, Checkpoint, StateReference};
