mod checkpoint;
mod snapshot;

pub use checkpoint::{Checkpoint, StateReference};
pub use snapshot::BattleSnapshot;
