#![allow(dead_code)]

use battle_core::{
    BattleConfig, PlayerId, Route, TerritoryId, UnitCapabilities, UnitId, UnitTypeDef, WorldState,
};
use battle_runtime::{ConfigOracleImpl, MapOracleImpl, OracleManager, UnitOracleImpl};
use std::sync::Arc;

pub const KENT: TerritoryId = TerritoryId(1);
pub const NORMANDY: TerritoryId = TerritoryId(2);
pub const PICARDY: TerritoryId = TerritoryId(3);
pub const RED: PlayerId = PlayerId(1);
pub const BLUE: PlayerId = PlayerId(2);

pub fn unit_types() -> UnitOracleImpl {
    UnitOracleImpl::new([
        UnitTypeDef::new("infantry").with_combat(1, 2).with_cost(3),
        UnitTypeDef::new("tank").with_combat(3, 3).with_cost(6),
        UnitTypeDef::new("bunker")
            .with_combat(1, 1)
            .with_cost(10)
            .with_hit_points(50),
        UnitTypeDef::new("fighter")
            .with_combat(3, 4)
            .with_air_combat(1, 1)
            .with_cost(10)
            .with_capabilities(UnitCapabilities::CAN_AIR_BATTLE | UnitCapabilities::CAN_INTERCEPT),
    ])
}

pub fn board() -> MapOracleImpl {
    let mut map = MapOracleImpl::new();
    map.add_territory(KENT, "Kent");
    map.add_territory(NORMANDY, "Normandy");
    map.add_territory(PICARDY, "Picardy");
    map.connect(KENT, NORMANDY);
    map.connect(NORMANDY, PICARDY);
    map
}

pub fn oracles(config: BattleConfig) -> OracleManager {
    OracleManager::new(
        Arc::new(unit_types()),
        Arc::new(board()),
        Arc::new(ConfigOracleImpl::new(config)),
    )
}

/// Rules with every handshake on, three land rounds at most.
pub fn interactive_rules() -> BattleConfig {
    BattleConfig {
        land_battle_rounds: 3,
        ..BattleConfig::new().with_seed(11)
    }
}

pub fn world() -> WorldState {
    let mut world = WorldState::new();
    world.add_territory(KENT, Some(RED));
    world.add_territory(NORMANDY, Some(BLUE));
    world.add_territory(PICARDY, Some(BLUE));
    world.set_team(RED, 1);
    world.set_team(BLUE, 2);
    world
}

/// Spawns `count` units at `at` and returns their ids.
pub fn spawn(
    world: &mut WorldState,
    at: TerritoryId,
    unit_type: &str,
    owner: PlayerId,
    count: usize,
) -> Vec<UnitId> {
    (0..count)
        .map(|_| {
            world
                .spawn_unit(at, unit_type, owner)
                .expect("territory exists")
        })
        .collect()
}

/// Two red tanks that crossed from Kent into a Normandy held by one
/// fifty-hit bunker: the fight cannot end before the round limit unless
/// both tanks die, so the attacker is asked to retreat at least once.
pub fn siege() -> (WorldState, Route, Vec<UnitId>) {
    let mut world = world();
    let tanks = spawn(&mut world, NORMANDY, "tank", RED, 2);
    spawn(&mut world, NORMANDY, "bunker", BLUE, 1);
    (world, Route::new(KENT, NORMANDY), tanks)
}
