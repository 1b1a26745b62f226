//! Scenario files: a board, the forces on it, and the attacks to resolve.
//!
//! Scenarios are RON documents. Newtype ids may be written bare (`1` rather
//! than `TerritoryId(1)`) and optional values without `Some(..)`.
//!
//! ```ron
//! (
//!     name: "Channel crossing",
//!     config: (game_seed: 7, confirm_casualties: false),
//!     unit_types: [(id: "infantry", attack: 1, defense: 2, cost: 3)],
//!     territories: [
//!         (id: 1, name: "Kent", owner: 1, neighbors: [2]),
//!         (id: 2, name: "Normandy", owner: 2),
//!     ],
//!     teams: [(player: 1, team: 1), (player: 2, team: 2)],
//!     placements: [(territory: 1, owner: 1, unit_type: "infantry", count: 3)],
//!     attacks: [(attacker: 1, from: 1, to: 2, units: [(unit_type: "infantry", count: 3)])],
//! )
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use battle_core::{
    BattleConfig, PlayerId, Route, TerritoryId, UnitId, UnitOracle, UnitTypeDef, UnitTypeId,
    WorldState,
};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use crate::api::{Result, RuntimeError};
use crate::oracle::{ConfigOracleImpl, MapOracleImpl, OracleManager, UnitOracleImpl};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritorySpec {
    pub id: TerritoryId,
    pub name: String,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Adjacency is symmetric; listing an edge on either end is enough.
    #[serde(default)]
    pub neighbors: Vec<TerritoryId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSpec {
    pub player: PlayerId,
    pub team: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub territory: TerritoryId,
    pub owner: PlayerId,
    pub unit_type: UnitTypeId,
    #[serde(default = "one")]
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCount {
    pub unit_type: UnitTypeId,
    #[serde(default = "one")]
    pub count: u32,
}

/// Units of `attacker` that leave `from` and strike `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub attacker: PlayerId,
    pub from: TerritoryId,
    pub to: TerritoryId,
    pub units: Vec<UnitCount>,
    #[serde(default)]
    pub bombing: bool,
}

fn one() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: BattleConfig,
    pub unit_types: Vec<UnitTypeDef>,
    pub territories: Vec<TerritorySpec>,
    #[serde(default)]
    pub teams: Vec<TeamSpec>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub attacks: Vec<AttackSpec>,
}

/// An attack whose units have been picked and moved to the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedAttack {
    pub route: Route,
    pub attacker: PlayerId,
    pub units: Vec<UnitId>,
    pub bombing: bool,
}

/// Everything a runtime needs to start resolving a scenario.
pub struct ScenarioSetup {
    pub world: WorldState,
    pub oracles: OracleManager,
    pub attacks: Vec<PlannedAttack>,
}

impl Scenario {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::InvalidConfig(format!("Failed to read scenario file: {}", e))
        })?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        ron::Options::default()
            .with_default_extension(Extensions::UNWRAP_NEWTYPES | Extensions::IMPLICIT_SOME)
            .from_str(content)
            .map_err(|e| RuntimeError::InvalidConfig(format!("Failed to parse scenario RON: {}", e)))
    }

    /// Builds the oracles and the initial world, then moves each attack's
    /// units into its target territory.
    pub fn build(&self) -> Result<ScenarioSetup> {
        tracing::info!(
            scenario = %self.name,
            territories = self.territories.len(),
            placements = self.placements.len(),
            attacks = self.attacks.len(),
            "building scenario"
        );

        let units = UnitOracleImpl::new(self.unit_types.iter().cloned());
        let mut map = MapOracleImpl::new();
        let mut world = WorldState::new();

        for territory in &self.territories {
            map.add_territory(territory.id, territory.name.clone());
            world.add_territory(territory.id, territory.owner);
        }
        for territory in &self.territories {
            for neighbor in &territory.neighbors {
                if !map.contains(*neighbor) {
                    return Err(invalid(format!(
                        "territory {} lists unknown neighbor {}",
                        territory.name, neighbor
                    )));
                }
                map.connect(territory.id, *neighbor);
            }
        }
        for team in &self.teams {
            world.set_team(team.player, team.team);
        }

        for placement in &self.placements {
            if units.definition(&placement.unit_type).is_none() {
                return Err(invalid(format!("unit type '{}' is not defined", placement.unit_type)));
            }
            for _ in 0..placement.count {
                world
                    .spawn_unit(placement.territory, placement.unit_type.clone(), placement.owner)
                    .map_err(|e| invalid(format!("placement failed: {}", e)))?;
            }
        }

        let mut committed = BTreeSet::new();
        let mut attacks = Vec::with_capacity(self.attacks.len());
        for attack in &self.attacks {
            let picked = pick_units(&world, attack, &mut committed)?;
            world
                .move_units(attack.from, attack.to, &picked)
                .map_err(|e| invalid(format!("attack on {} failed: {}", attack.to, e)))?;
            attacks.push(PlannedAttack {
                route: Route::new(attack.from, attack.to),
                attacker: attack.attacker,
                units: picked,
                bombing: attack.bombing,
            });
        }

        let oracles = OracleManager::new(
            Arc::new(units),
            Arc::new(map),
            Arc::new(ConfigOracleImpl::new(self.config.clone())),
        );
        Ok(ScenarioSetup {
            world,
            oracles,
            attacks,
        })
    }
}

/// Picks the attacking units at `from`, skipping units earlier attacks took.
fn pick_units(
    world: &WorldState,
    attack: &AttackSpec,
    committed: &mut BTreeSet<UnitId>,
) -> Result<Vec<UnitId>> {
    let mut picked = Vec::new();
    for wanted in &attack.units {
        let available: Vec<UnitId> = world
            .units_at(attack.from)
            .filter(|unit| {
                unit.owner == attack.attacker
                    && unit.unit_type == wanted.unit_type
                    && !committed.contains(&unit.id)
            })
            .map(|unit| unit.id)
            .take(wanted.count as usize)
            .collect();
        if available.len() < wanted.count as usize {
            return Err(invalid(format!(
                "{} has {} '{}' of {} available, attack needs {}",
                attack.from,
                available.len(),
                wanted.unit_type,
                attack.attacker,
                wanted.count
            )));
        }
        committed.extend(available.iter().copied());
        picked.extend(available);
    }
    Ok(picked)
}

fn invalid(message: String) -> RuntimeError {
    RuntimeError::InvalidConfig(message)
}
