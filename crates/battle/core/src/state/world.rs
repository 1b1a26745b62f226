use std::collections::{BTreeMap, BTreeSet};

use super::{PlayerId, StateError, TerritoryId, Unit, UnitFlags, UnitId, UnitTypeId};

/// Units and ownership of a single territory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerritoryState {
    pub owner: Option<PlayerId>,
    /// Units present, in arrival order.
    pub units: Vec<UnitId>,
}

/// Live board state: which units exist, where they are, and who is allied.
///
/// Engagements read rosters from here when they start or resume, and write
/// casualties, damage, and retreats back. Everything is kept in ordered maps so
/// iteration (and therefore dice seeding and casualty order) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    units: BTreeMap<UnitId, Unit>,
    territories: BTreeMap<TerritoryId, TerritoryState>,
    /// Players sharing a team are allied; players without a team stand alone.
    teams: BTreeMap<PlayerId, u32>,
    next_unit_id: u32,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_territory(&mut self, territory: TerritoryId, owner: Option<PlayerId>) {
        self.territories.entry(territory).or_default().owner = owner;
    }

    pub fn set_team(&mut self, player: PlayerId, team: u32) {
        self.teams.insert(player, team);
    }

    pub fn is_at_war(&self, a: PlayerId, b: PlayerId) -> bool {
        if a == b {
            return false;
        }
        match (self.teams.get(&a), self.teams.get(&b)) {
            (Some(x), Some(y)) => x != y,
            _ => true,
        }
    }

    pub fn territory(&self, territory: TerritoryId) -> Option<&TerritoryState> {
        self.territories.get(&territory)
    }

    pub fn territories(&self) -> impl Iterator<Item = (&TerritoryId, &TerritoryState)> {
        self.territories.iter()
    }

    pub fn territory_owner(&self, territory: TerritoryId) -> Option<PlayerId> {
        self.territories.get(&territory).and_then(|t| t.owner)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Places a new unit and returns its id.
    pub fn spawn_unit(
        &mut self,
        territory: TerritoryId,
        unit_type: impl Into<UnitTypeId>,
        owner: PlayerId,
    ) -> Result<UnitId, StateError> {
        let slot = self
            .territories
            .get_mut(&territory)
            .ok_or(StateError::UnknownTerritory(territory))?;
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        slot.units.push(id);
        self.units.insert(id, Unit::new(id, unit_type.into(), owner));
        Ok(id)
    }

    /// Loads `cargo` into `carrier`; cargo is removed whenever the carrier is.
    pub fn load(&mut self, carrier: UnitId, cargo: UnitId) -> Result<(), StateError> {
        if !self.units.contains_key(&carrier) {
            return Err(StateError::UnknownUnit(carrier));
        }
        let unit = self
            .units
            .get_mut(&cargo)
            .ok_or(StateError::UnknownUnit(cargo))?;
        unit.transported_by = Some(carrier);
        Ok(())
    }

    pub fn unit_ids_at(&self, territory: TerritoryId) -> &[UnitId] {
        self.territories
            .get(&territory)
            .map(|t| t.units.as_slice())
            .unwrap_or(&[])
    }

    pub fn units_at(&self, territory: TerritoryId) -> impl Iterator<Item = &Unit> {
        self.unit_ids_at(territory)
            .iter()
            .filter_map(|id| self.units.get(id))
    }

    pub fn contains(&self, territory: TerritoryId, unit: UnitId) -> bool {
        self.unit_ids_at(territory).contains(&unit)
    }

    pub fn location_of(&self, unit: UnitId) -> Option<TerritoryId> {
        self.territories
            .iter()
            .find(|(_, t)| t.units.contains(&unit))
            .map(|(id, _)| *id)
    }

    /// The units among `units` still at `territory`, followed by whatever
    /// they carry.
    pub fn with_cargo(&self, territory: TerritoryId, units: &[UnitId]) -> Vec<UnitId> {
        let here = self.unit_ids_at(territory);
        let mut found: Vec<UnitId> = units
            .iter()
            .copied()
            .filter(|id| here.contains(id))
            .collect();
        let roots: BTreeSet<UnitId> = found.iter().copied().collect();
        found.extend(here.iter().copied().filter(|id| {
            !roots.contains(id)
                && self
                    .units
                    .get(id)
                    .and_then(|u| u.transported_by)
                    .is_some_and(|carrier| roots.contains(&carrier))
        }));
        found
    }

    /// Removes units from the board along with everything they carry.
    ///
    /// Returns every unit actually removed (requested units first, then cargo);
    /// units that are already gone are skipped.
    pub fn remove_units(&mut self, territory: TerritoryId, units: &[UnitId]) -> Vec<UnitId> {
        let doomed = self.with_cargo(territory, units);
        let gone: BTreeSet<UnitId> = doomed.iter().copied().collect();
        if let Some(slot) = self.territories.get_mut(&territory) {
            slot.units.retain(|id| !gone.contains(id));
        }
        for id in &doomed {
            self.units.remove(id);
        }
        doomed
    }

    /// Moves units (and their cargo) between territories.
    pub fn move_units(
        &mut self,
        from: TerritoryId,
        to: TerritoryId,
        units: &[UnitId],
    ) -> Result<(), StateError> {
        if !self.territories.contains_key(&to) {
            return Err(StateError::UnknownTerritory(to));
        }
        let source = self
            .territories
            .get(&from)
            .ok_or(StateError::UnknownTerritory(from))?;
        let movers: Vec<UnitId> = source
            .units
            .iter()
            .copied()
            .filter(|id| {
                units.contains(id)
                    || self
                        .units
                        .get(id)
                        .and_then(|u| u.transported_by)
                        .is_some_and(|carrier| units.contains(&carrier))
            })
            .collect();
        if let Some(missing) = units.iter().find(|id| !movers.contains(*id)) {
            return Err(StateError::UnitNotInTerritory {
                unit: *missing,
                territory: from,
            });
        }
        if let Some(source) = self.territories.get_mut(&from) {
            source.units.retain(|id| !movers.contains(id));
        }
        if let Some(dest) = self.territories.get_mut(&to) {
            dest.units.extend(movers);
        }
        Ok(())
    }

    /// Records one absorbed hit on each unit.
    pub fn mark_damaged(&mut self, units: &[UnitId]) {
        for id in units {
            if let Some(unit) = self.units.get_mut(id) {
                unit.hits += 1;
            }
        }
    }

    pub fn add_bombing_damage(&mut self, unit: UnitId, amount: u32, cap: u32) -> u32 {
        let Some(target) = self.units.get_mut(&unit) else {
            return 0;
        };
        let before = target.bombing_damage;
        target.bombing_damage = (before + amount).min(cap.max(before));
        target.bombing_damage - before
    }

    pub fn set_flag(&mut self, units: &[UnitId], flag: UnitFlags) {
        for id in units {
            if let Some(unit) = self.units.get_mut(id) {
                unit.flags.insert(flag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: TerritoryId = TerritoryId(1);
    const AWAY: TerritoryId = TerritoryId(2);
    const RED: PlayerId = PlayerId(1);
    const BLUE: PlayerId = PlayerId(2);

    fn world() -> WorldState {
        let mut world = WorldState::new();
        world.add_territory(HOME, Some(RED));
        world.add_territory(AWAY, Some(BLUE));
        world
    }

    #[test]
    fn removing_a_carrier_removes_its_cargo() {
        let mut world = world();
        let carrier = world.spawn_unit(HOME, "carrier", RED).unwrap();
        let fighter = world.spawn_unit(HOME, "fighter", RED).unwrap();
        let other = world.spawn_unit(HOME, "infantry", RED).unwrap();
        world.load(carrier, fighter).unwrap();

        let removed = world.remove_units(HOME, &[carrier]);

        assert_eq!(removed, vec![carrier, fighter]);
        assert_eq!(world.unit_ids_at(HOME), &[other]);
        assert!(world.unit(fighter).is_none());
    }

    #[test]
    fn removing_absent_units_is_a_no_op() {
        let mut world = world();
        let unit = world.spawn_unit(HOME, "infantry", RED).unwrap();
        assert_eq!(world.remove_units(HOME, &[unit]), vec![unit]);
        assert!(world.remove_units(HOME, &[unit]).is_empty());
    }

    #[test]
    fn moving_units_carries_cargo() {
        let mut world = world();
        let transport = world.spawn_unit(HOME, "transport", RED).unwrap();
        let tank = world.spawn_unit(HOME, "tank", RED).unwrap();
        world.load(transport, tank).unwrap();

        world.move_units(HOME, AWAY, &[transport]).unwrap();

        assert_eq!(world.unit_ids_at(AWAY), &[transport, tank]);
        assert!(world.unit_ids_at(HOME).is_empty());
        assert_eq!(world.location_of(tank), Some(AWAY));
    }

    #[test]
    fn teams_define_alliances() {
        let mut world = world();
        assert!(world.is_at_war(RED, BLUE));
        world.set_team(RED, 1);
        world.set_team(BLUE, 1);
        assert!(!world.is_at_war(RED, BLUE));
        assert!(!world.is_at_war(RED, RED));
    }

    #[test]
    fn bombing_damage_is_capped() {
        let mut world = world();
        let factory = world.spawn_unit(AWAY, "factory", BLUE).unwrap();
        assert_eq!(world.add_bombing_damage(factory, 4, 6), 4);
        assert_eq!(world.add_bombing_damage(factory, 4, 6), 2);
        assert_eq!(world.unit(factory).unwrap().bombing_damage, 6);
    }
}
