//! Live board state consumed and mutated by engagements.
//!
//! Static unit attributes live behind [`crate::env::UnitOracle`]; this module
//! only tracks what changes during play: unit placement, damage, flags, and
//! territory ownership.
mod error;
mod ids;
mod unit;
mod world;

pub use error::StateError;
pub use ids::{BattleId, PlayerId, TerritoryId, UnitId, UnitTypeId};
pub use unit::{Unit, UnitFlags};
pub use world::{TerritoryState, WorldState};
