//! Topic-based event bus for runtime events.
//!
//! Engine notifications are republished on [`Topic::Battle`]; the driver's
//! decision traffic and the tracker's bookkeeping go to their own topics so a
//! display can follow the fight without seeing the handshake.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DecisionEvent, TrackerEvent};
