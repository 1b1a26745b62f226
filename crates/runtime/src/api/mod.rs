//! Public runtime API surface.
//!
//! Gathers the types consumers of the runtime crate touch directly so the
//! worker and repositories can stay internal concerns.

pub mod errors;
pub mod handle;
pub mod providers;
pub mod registry;

pub use errors::{ProviderKind, Result, RuntimeError};
pub use handle::{BattleSummary, RuntimeHandle};
pub use providers::{DecisionProvider, DefaultDecisionProvider, ScriptedDecisionProvider};
pub use registry::ProviderRegistry;
