//! Registry of pending engagements and the dependency graph between them.
//!
//! The tracker is the single owner of every engagement. Edges point from a
//! dependent to the engagement it waits for; a blocked engagement cannot be
//! fought, and an engagement's edges disappear the moment it concludes,
//! fails, or is voided.

use std::collections::{BTreeMap, BTreeSet};

use crate::env::{BattleEnv, UnitCapabilities};
use crate::state::{BattleId, PlayerId, TerritoryId, UnitId, WorldState};

use super::eligibility;
use super::{
    BattleContext, BattleError, BattleEvent, BattleKind, BattleRecord, Decision, Engagement,
    FightStatus, Route, TrackerError,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleTracker {
    battles: BTreeMap<BattleId, Engagement>,
    /// dependent -> engagements it waits for.
    dependencies: BTreeMap<BattleId, BTreeSet<BattleId>>,
    records: Vec<BattleRecord>,
    next_id: u64,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn battle(&self, id: BattleId) -> Option<&Engagement> {
        self.battles.get(&id)
    }

    pub fn battles(&self) -> impl Iterator<Item = &Engagement> {
        self.battles.values()
    }

    pub fn battle_ids(&self) -> Vec<BattleId> {
        self.battles.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    pub fn records(&self) -> &[BattleRecord] {
        &self.records
    }

    /// The pending engagement of `kind` at `site`, if any.
    pub fn pending(&self, site: TerritoryId, kind: BattleKind) -> Option<BattleId> {
        self.battles
            .values()
            .find(|battle| battle.site() == site && battle.kind() == kind && !battle.is_over())
            .map(Engagement::id)
    }

    /// Registers an engagement, or augments the pending one of the same kind
    /// at the same site. Returns the engagement the units joined.
    pub fn add_battle(
        &mut self,
        site: TerritoryId,
        kind: BattleKind,
        attacker: PlayerId,
        defender: Option<PlayerId>,
        route: Option<Route>,
        units: &[UnitId],
    ) -> BattleId {
        let id = match self.pending(site, kind) {
            Some(id) => id,
            None => {
                self.next_id += 1;
                let id = BattleId(self.next_id);
                self.battles
                    .insert(id, Engagement::new(id, site, kind, attacker, defender));
                id
            }
        };
        if let Some(battle) = self.battles.get_mut(&id) {
            battle.add_attacking_units(route, units);
        }
        id
    }

    /// Adds `bomber` to the site's bombing raid, aimed at `target`.
    pub fn add_bombing_raid(
        &mut self,
        site: TerritoryId,
        attacker: PlayerId,
        defender: Option<PlayerId>,
        bomber: UnitId,
        target: UnitId,
    ) -> BattleId {
        let id = self.add_battle(site, BattleKind::BombingRaid, attacker, defender, None, &[bomber]);
        if let Some(raid) = self.battles.get_mut(&id) {
            raid.set_bombing_target(bomber, target);
        }
        id
    }

    /// Makes `dependent` wait for `depends_on`.
    pub fn add_dependency(
        &mut self,
        dependent: BattleId,
        depends_on: BattleId,
    ) -> Result<(), TrackerError> {
        if dependent == depends_on {
            return Err(TrackerError::SelfDependency(dependent));
        }
        for id in [dependent, depends_on] {
            if !self.battles.contains_key(&id) {
                return Err(TrackerError::UnknownBattle(id));
            }
        }
        if self.depends_transitively(depends_on, dependent) {
            return Err(TrackerError::Cycle {
                dependent,
                depends_on,
            });
        }
        self.dependencies
            .entry(dependent)
            .or_default()
            .insert(depends_on);
        Ok(())
    }

    fn depends_transitively(&self, from: BattleId, target: BattleId) -> bool {
        let mut seen = BTreeSet::new();
        let mut frontier = vec![from];
        while let Some(current) = frontier.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = self.dependencies.get(&current) {
                frontier.extend(next.iter().copied());
            }
        }
        false
    }

    /// Engagements waiting for `battle`.
    pub fn get_blocked(&self, battle: BattleId) -> Vec<BattleId> {
        self.dependencies
            .iter()
            .filter(|(_, blockers)| blockers.contains(&battle))
            .map(|(dependent, _)| *dependent)
            .collect()
    }

    /// Engagements `battle` is waiting for.
    pub fn dependencies_of(&self, battle: BattleId) -> Vec<BattleId> {
        self.dependencies
            .get(&battle)
            .map(|blockers| blockers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_blocked(&self, battle: BattleId) -> bool {
        self.dependencies
            .get(&battle)
            .is_some_and(|blockers| !blockers.is_empty())
    }

    /// Pending engagements that nothing blocks, in id order.
    pub fn unblocked(&self) -> Vec<BattleId> {
        self.battles
            .keys()
            .copied()
            .filter(|id| !self.is_blocked(*id))
            .collect()
    }

    /// Deregisters an engagement and drops every edge touching it.
    pub fn remove_battle(&mut self, battle: BattleId) -> Option<Engagement> {
        self.forget(battle);
        self.battles.remove(&battle)
    }

    fn forget(&mut self, battle: BattleId) {
        self.dependencies.remove(&battle);
        for blockers in self.dependencies.values_mut() {
            blockers.remove(&battle);
        }
        self.dependencies.retain(|_, blockers| !blockers.is_empty());
    }

    /// Strips `units` from every engagement waiting for `blocker`.
    ///
    /// Safe to repeat: units already stripped are not stripped again.
    pub fn units_lost_in_preceding_battle(
        &mut self,
        blocker: BattleId,
        units: &[UnitId],
        withdrawn: bool,
        events: &mut Vec<BattleEvent>,
    ) {
        if units.is_empty() {
            return;
        }
        for dependent in self.get_blocked(blocker) {
            let Some(battle) = self.battles.get_mut(&dependent) else {
                continue;
            };
            let stripped = battle.units_lost_in_preceding_battle(units);
            if stripped.is_empty() {
                continue;
            }
            events.push(BattleEvent::History {
                battle: dependent,
                player: None,
                text: format!(
                    "{} units {} in preceding battle {blocker}",
                    stripped.len(),
                    if withdrawn { "withdrawn" } else { "lost" }
                ),
            });
        }
    }

    /// Registers the engagements an attack along `route` triggers.
    ///
    /// A bombing attack becomes an air raid when interceptors could meet it,
    /// otherwise a bombing raid straight away. Any other attack joins the
    /// normal battle at the destination, preceded by an air battle when
    /// escorts could meet defending planes. Returns the engagement the
    /// attacking force fights first.
    pub fn declare_attack(
        &mut self,
        route: Route,
        attacker: PlayerId,
        units: &[UnitId],
        bombing: bool,
        world: &WorldState,
        env: BattleEnv<'_>,
    ) -> Result<BattleId, BattleError> {
        let site = route.end;
        let defender = world
            .territory_owner(site)
            .filter(|owner| world.is_at_war(attacker, *owner));
        let oracle = env.units()?;

        if bombing {
            if eligibility::territory_could_have_air_battle_defenders(site, attacker, true, world, &env)? {
                return Ok(self.add_battle(
                    site,
                    BattleKind::AirRaid,
                    attacker,
                    defender,
                    Some(route),
                    units,
                ));
            }
            let mut raid = None;
            for id in units {
                let Some(unit) = world.unit(*id) else { continue };
                if !oracle
                    .require(&unit.unit_type)?
                    .has(UnitCapabilities::STRATEGIC_BOMBER)
                {
                    continue;
                }
                raid = Some(self.add_battle(
                    site,
                    BattleKind::BombingRaid,
                    attacker,
                    defender,
                    Some(route),
                    &[*id],
                ));
            }
            let raid = raid.ok_or(BattleError::NoBombers(site))?;
            if let Some(normal) = self.pending(site, BattleKind::Normal) {
                self.add_dependency(normal, raid)?;
            }
            return Ok(raid);
        }

        let normal = self.add_battle(site, BattleKind::Normal, attacker, defender, Some(route), units);
        let mut escorts = Vec::new();
        for id in units {
            if let Some(unit) = world.unit(*id)
                && oracle
                    .require(&unit.unit_type)?
                    .has(UnitCapabilities::CAN_AIR_BATTLE)
            {
                escorts.push(*id);
            }
        }
        if !escorts.is_empty()
            && eligibility::territory_could_have_air_battle_defenders(site, attacker, false, world, &env)?
        {
            let air = self.add_battle(
                site,
                BattleKind::AirBattle,
                attacker,
                defender,
                Some(route),
                &escorts,
            );
            self.add_dependency(normal, air)?;
            return Ok(air);
        }
        Ok(normal)
    }

    /// Accepts the answer to a battle's pending request.
    pub fn provide_decision(
        &mut self,
        battle: BattleId,
        decision: Decision,
    ) -> Result<(), BattleError> {
        self.battles
            .get_mut(&battle)
            .ok_or(BattleError::UnknownBattle(battle))?
            .provide_decision(decision)
    }

    /// Fights `battle` until it concludes or needs a decision.
    ///
    /// A concluded engagement is recorded and deregistered. An engagement that
    /// fails is aborted: it is deregistered without a record, its dependents
    /// are unblocked and the returned error is always fatal.
    pub fn fight(
        &mut self,
        battle: BattleId,
        world: &mut WorldState,
        env: BattleEnv<'_>,
        events: &mut Vec<BattleEvent>,
    ) -> Result<FightStatus, BattleError> {
        if !self.battles.contains_key(&battle) {
            return Err(BattleError::UnknownBattle(battle));
        }
        if self.is_blocked(battle) {
            return Err(BattleError::Blocked {
                battle,
                blockers: self.dependencies_of(battle),
            });
        }
        let Some(mut engagement) = self.battles.remove(&battle) else {
            return Err(BattleError::UnknownBattle(battle));
        };

        let result = {
            let mut ctx = BattleContext::new(world, env, self, events);
            engagement.fight(&mut ctx)
        };

        match result {
            Ok(FightStatus::Concluded(outcome)) => {
                self.forget(battle);
                self.records.push(BattleRecord {
                    battle,
                    site: engagement.site(),
                    kind: engagement.kind(),
                    attacker: engagement.state().attacker(),
                    defender: engagement.state().defender(),
                    outcome: outcome.clone(),
                });
                Ok(FightStatus::Concluded(outcome))
            }
            Ok(status) => {
                self.battles.insert(battle, engagement);
                Ok(status)
            }
            Err(err) => {
                self.forget(battle);
                Err(BattleError::aborting(battle, err))
            }
        }
    }

    /// Ends `battle` without fighting it. Follow-on engagements are still
    /// spawned, no record is kept, and dependents are unblocked.
    pub fn void_battle(
        &mut self,
        battle: BattleId,
        world: &mut WorldState,
        env: BattleEnv<'_>,
        events: &mut Vec<BattleEvent>,
    ) -> Result<(), BattleError> {
        let Some(mut engagement) = self.battles.remove(&battle) else {
            return Err(BattleError::UnknownBattle(battle));
        };
        let result = {
            let mut ctx = BattleContext::new(world, env, self, events);
            engagement.finish_headless(&mut ctx)
        };
        self.forget(battle);
        result
            .map(|_| ())
            .map_err(|err| BattleError::aborting(battle, err))
    }
}
