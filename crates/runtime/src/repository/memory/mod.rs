mod checkpoint;
mod state;

pub use checkpoint::InMemoryCheckpointRepo;
pub use state::InMemoryStateRepo;
