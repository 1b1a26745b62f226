//! Which defending planes may take off against an air attack.

use crate::env::{BattleEnv, ConfigOracle, OracleError, UnitCapabilities, UnitOracle};
use crate::state::{PlayerId, TerritoryId, Unit, UnitFlags, UnitId, WorldState};

/// Planes defending against escorts ahead of a ground or sea battle.
pub fn is_air_battle_defender<U>(
    unit: &Unit,
    attacker: PlayerId,
    world: &WorldState,
    units: &U,
    config: &dyn ConfigOracle,
) -> Result<bool, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let def = units.require(&unit.unit_type)?;
    Ok(def.has(UnitCapabilities::CAN_AIR_BATTLE)
        && world.is_at_war(attacker, unit.owner)
        && !unit.has_flag(UnitFlags::WAS_IN_AIR_BATTLE)
        && (config.can_scramble_into_air_battles() || !unit.has_flag(UnitFlags::WAS_SCRAMBLED)))
}

/// Planes intercepting a strategic bombing force over `site`. Types that need
/// an air base only qualify while an enemy, working air base sits at `site`.
pub fn is_raid_interceptor<U>(
    unit: &Unit,
    attacker: PlayerId,
    site: TerritoryId,
    world: &WorldState,
    units: &U,
    config: &dyn ConfigOracle,
) -> Result<bool, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let def = units.require(&unit.unit_type)?;
    let can_intercept = def.has(UnitCapabilities::CAN_INTERCEPT)
        && world.is_at_war(attacker, unit.owner)
        && !unit.has_flag(UnitFlags::WAS_IN_AIR_BATTLE)
        && (config.can_scramble_into_air_battles() || !unit.has_flag(UnitFlags::WAS_SCRAMBLED));
    if !can_intercept {
        return Ok(false);
    }
    if !def.has(UnitCapabilities::REQUIRES_AIR_BASE) {
        return Ok(true);
    }
    has_working_air_base(site, attacker, world, units)
}

fn has_working_air_base<U>(
    site: TerritoryId,
    attacker: PlayerId,
    world: &WorldState,
    units: &U,
) -> Result<bool, OracleError>
where
    U: UnitOracle + ?Sized,
{
    for base in world.units_at(site) {
        if !world.is_at_war(attacker, base.owner)
            || base.has_flag(UnitFlags::DISABLED)
            || base.is_transported()
        {
            continue;
        }
        if units.require(&base.unit_type)?.has(UnitCapabilities::AIR_BASE) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Eligible defenders at `site`, in board order.
pub fn eligible_defenders<U>(
    raid: bool,
    site: TerritoryId,
    attacker: PlayerId,
    world: &WorldState,
    units: &U,
    config: &dyn ConfigOracle,
) -> Result<Vec<UnitId>, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let mut eligible = Vec::new();
    for unit in world.units_at(site) {
        let ok = if raid {
            is_raid_interceptor(unit, attacker, site, world, units, config)?
        } else {
            is_air_battle_defender(unit, attacker, world, units, config)?
        };
        if ok {
            eligible.push(unit.id);
        }
    }
    Ok(eligible)
}

/// How many of `candidates` may take off from `site`.
///
/// Unlimited (`None`) unless some candidate needs an air base; then the sum
/// of the working bases' capacities, where one unlimited base lifts the cap.
pub fn max_interception_count<U>(
    site: TerritoryId,
    candidates: &[&Unit],
    world: &WorldState,
    units: &U,
) -> Result<Option<u32>, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let mut needs_base = false;
    for unit in candidates {
        if units.require(&unit.unit_type)?.has(UnitCapabilities::REQUIRES_AIR_BASE) {
            needs_base = true;
            break;
        }
    }
    if !needs_base {
        return Ok(None);
    }

    let mut total = 0u32;
    for base in world.units_at(site) {
        if base.has_flag(UnitFlags::DISABLED) {
            continue;
        }
        let def = units.require(&base.unit_type)?;
        if !def.has(UnitCapabilities::AIR_BASE) {
            continue;
        }
        match def.max_intercept_count {
            None => return Ok(None),
            Some(capacity) => total = total.saturating_add(capacity),
        }
    }
    Ok(Some(total))
}

/// Whether any enemy plane could defend `site`, counting planes within
/// scramble range when scrambling into air battles is allowed.
pub fn territory_could_have_air_battle_defenders(
    site: TerritoryId,
    attacker: PlayerId,
    bombing: bool,
    world: &WorldState,
    env: &BattleEnv<'_>,
) -> Result<bool, OracleError> {
    let units = env.units()?;
    let config = env.config()?;

    let defends_from = |territory: TerritoryId| -> Result<bool, OracleError> {
        for unit in world.units_at(territory) {
            let ok = if bombing {
                is_raid_interceptor(unit, attacker, site, world, units, config)?
            } else {
                is_air_battle_defender(unit, attacker, world, units, config)?
            };
            if ok {
                return Ok(true);
            }
        }
        Ok(false)
    };

    if defends_from(site)? {
        return Ok(true);
    }
    if !config.can_scramble_into_air_battles() {
        return Ok(false);
    }
    let distance = units.max_scramble_distance();
    if distance == 0 {
        return Ok(false);
    }
    for territory in env.map()?.neighbors_within(site, distance) {
        if defends_from(territory)? {
            return Ok(true);
        }
    }
    Ok(false)
}
