use crate::env::BattleEnv;
use crate::state::WorldState;

use super::{BattleEvent, BattleTracker};

/// Everything outside the engagement that a fight reads or writes.
///
/// `tracker` is the dependency graph the engagement belongs to; while an
/// engagement fights it is checked out of the graph, so steps may register
/// follow-on battles and notify dependents without aliasing themselves.
pub struct BattleContext<'a, 'e> {
    pub world: &'a mut WorldState,
    pub env: BattleEnv<'e>,
    pub tracker: &'a mut BattleTracker,
    /// Notification sink; callers drain it after each call.
    pub events: &'a mut Vec<BattleEvent>,
}

impl<'a, 'e> BattleContext<'a, 'e> {
    pub fn new(
        world: &'a mut WorldState,
        env: BattleEnv<'e>,
        tracker: &'a mut BattleTracker,
        events: &'a mut Vec<BattleEvent>,
    ) -> Self {
        Self {
            world,
            env,
            tracker,
            events,
        }
    }

    #[inline]
    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }
}
