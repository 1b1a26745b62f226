//! Static board geometry served through [`battle_core::MapOracle`].
use std::collections::{BTreeMap, BTreeSet};

use battle_core::{MapOracle, TerritoryId};

/// MapOracle implementation with an undirected adjacency list.
#[derive(Default)]
pub struct MapOracleImpl {
    adjacency: BTreeMap<TerritoryId, BTreeSet<TerritoryId>>,
    names: BTreeMap<TerritoryId, String>,
}

impl MapOracleImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_territory(&mut self, territory: TerritoryId, name: impl Into<String>) {
        self.adjacency.entry(territory).or_default();
        self.names.insert(territory, name.into());
    }

    /// Connects `a` and `b` in both directions.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if a == b {
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn contains(&self, territory: TerritoryId) -> bool {
        self.adjacency.contains_key(&territory)
    }

    pub fn territories(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.adjacency.keys().copied()
    }
}

impl MapOracle for MapOracleImpl {
    fn neighbors(&self, territory: TerritoryId) -> Vec<TerritoryId> {
        self.adjacency
            .get(&territory)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn territory_name(&self, territory: TerritoryId) -> Option<&str> {
        self.names.get(&territory).map(String::as_str)
    }
}
