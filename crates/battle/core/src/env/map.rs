use std::collections::{BTreeSet, VecDeque};

use crate::state::TerritoryId;

/// Static map geometry: adjacency and names.
pub trait MapOracle: Send + Sync {
    /// Territories directly adjacent to `territory`.
    fn neighbors(&self, territory: TerritoryId) -> Vec<TerritoryId>;

    fn territory_name(&self, territory: TerritoryId) -> Option<&str>;

    /// Every territory reachable in at most `distance` steps, excluding the
    /// origin, in breadth-first order.
    fn neighbors_within(&self, territory: TerritoryId, distance: u32) -> Vec<TerritoryId> {
        let mut seen = BTreeSet::from([territory]);
        let mut frontier = VecDeque::from([(territory, 0u32)]);
        let mut found = Vec::new();
        while let Some((current, depth)) = frontier.pop_front() {
            if depth == distance {
                continue;
            }
            for next in self.neighbors(current) {
                if seen.insert(next) {
                    found.push(next);
                    frontier.push_back((next, depth + 1));
                }
            }
        }
        found
    }

    /// Display name, falling back to the id.
    fn display_name(&self, territory: TerritoryId) -> String {
        self.territory_name(territory)
            .map(str::to_owned)
            .unwrap_or_else(|| territory.to_string())
    }
}
