//! Step bodies.
//!
//! Every step that asks a participant follows the same shape: with an empty
//! inbox it announces itself and suspends before touching anything; once the
//! answer is in the inbox it validates it and applies its effects.

use std::collections::BTreeSet;

use crate::battle::eligibility;
use crate::battle::stack::{ExecutionStack, StepControl};
use crate::battle::{
    BattleError, BattleEvent, BattleKind, BattleOutcome, BattleResultDescription, Decision,
    DecisionKind, DecisionRequest, IntegrityViolation, Side, SoundClip, Step, StepName, WhoWon,
};
use crate::combat::{self, Role};
use crate::env::{
    ConfigOracle, DiceSeed, MapOracle, OracleError, RngOracle, UnitCapabilities, UnitOracle,
    UnitTypeDef,
};
use crate::state::{PlayerId, TerritoryId, Unit, UnitFlags, UnitId, WorldState};

use super::{FireRecord, StepScope};

type StepResult = Result<StepControl<DecisionRequest>, BattleError>;

const DONE: StepResult = Ok(StepControl::Done);

fn live<'w>(world: &'w WorldState, ids: &[UnitId]) -> Vec<&'w Unit> {
    ids.iter().filter_map(|id| world.unit(*id)).collect()
}

/// Units in `ids` whose type satisfies `pred`, in roster order.
fn matching(
    world: &WorldState,
    units: &dyn UnitOracle,
    ids: &[UnitId],
    pred: impl Fn(&UnitTypeDef) -> bool,
) -> Result<Vec<UnitId>, OracleError> {
    let mut found = Vec::new();
    for unit in live(world, ids) {
        if pred(units.require(&unit.unit_type)?) {
            found.push(unit.id);
        }
    }
    Ok(found)
}

fn throws_dice(
    world: &WorldState,
    units: &dyn UnitOracle,
    ids: &[UnitId],
    role: Role,
    air: bool,
) -> Result<bool, OracleError> {
    Ok(!matching(world, units, ids, |def| def.rolls(role, air) > 0)?.is_empty())
}

fn value_of(world: &WorldState, units: &dyn UnitOracle, ids: &[UnitId]) -> Result<u32, OracleError> {
    let mut total = 0;
    for unit in live(world, ids) {
        total += units.require(&unit.unit_type)?.cost;
    }
    Ok(total)
}

/// Enemy units at `site` that `bomber` may pick as its target.
fn bombing_targets(
    world: &WorldState,
    units: &dyn UnitOracle,
    site: TerritoryId,
    attacker: PlayerId,
    bomber: UnitId,
) -> Result<Vec<UnitId>, OracleError> {
    let bomber = match world.unit(bomber) {
        Some(unit) => Some(units.require(&unit.unit_type)?),
        None => None,
    };
    let mut targets = Vec::new();
    for unit in world.units_at(site) {
        if world.is_at_war(attacker, unit.owner)
            && !unit.is_transported()
            && units.require(&unit.unit_type)?.has(UnitCapabilities::CAN_BE_DAMAGED)
            && bomber.is_none_or(|def| def.can_bomb(&unit.unit_type))
        {
            targets.push(unit.id);
        }
    }
    Ok(targets)
}

/// "2 fighter, 1 bomber".
fn describe(world: &WorldState, ids: &[UnitId]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for unit in live(world, ids) {
        match counts
            .iter_mut()
            .find(|(name, _)| *name == unit.unit_type.as_str())
        {
            Some((_, count)) => *count += 1,
            None => counts.push((unit.unit_type.as_str(), 1)),
        }
    }
    if counts.is_empty() {
        return format!("{} units", ids.len());
    }
    counts
        .iter()
        .map(|(name, count)| format!("{count} {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

const fn role_of(side: Side) -> Role {
    match side {
        Side::Attacker => Role::Offense,
        Side::Defender => Role::Defense,
    }
}

impl<'s, 'a, 'e> StepScope<'s, 'a, 'e> {
    fn units(&self) -> Result<&'e dyn UnitOracle, OracleError> {
        self.ctx.env.units()
    }

    fn config(&self) -> Result<&'e dyn ConfigOracle, OracleError> {
        self.ctx.env.config()
    }

    fn emit(&mut self, event: BattleEvent) {
        self.ctx.emit(event);
    }

    fn history(&mut self, player: Option<PlayerId>, text: String) {
        let battle = self.battle.id;
        self.emit(BattleEvent::History {
            battle,
            player,
            text,
        });
    }

    fn sound(&mut self, clip: SoundClip) {
        let battle = self.battle.id;
        self.emit(BattleEvent::Sound { battle, clip });
    }

    fn enter(&mut self, step: StepName) {
        let battle = self.battle.id;
        self.emit(BattleEvent::StepEntered { battle, step });
    }

    fn site_name(&self) -> String {
        match self.ctx.env.map() {
            Ok(map) => map.display_name(self.battle.site),
            Err(_) => self.battle.site.to_string(),
        }
    }

    fn participant(&self, side: Side) -> Result<PlayerId, BattleError> {
        self.battle
            .player(side)
            .ok_or_else(|| self.battle.violation(IntegrityViolation::UnknownParticipant(side)))
    }

    fn mismatch(&self, expected: DecisionKind, provided: &Decision) -> BattleError {
        self.battle.violation(IntegrityViolation::DecisionMismatch {
            expected,
            provided: provided.kind(),
        })
    }

    fn should_fight(&self) -> Result<bool, BattleError> {
        let battle = &*self.battle;
        let world = &*self.ctx.world;
        let units = self.units()?;
        let engaged = match battle.kind {
            BattleKind::BombingRaid => return Ok(false),
            BattleKind::AirRaid => {
                !battle.defending.is_empty()
                    && !matching(world, units, &battle.attacking, |def| {
                        def.has(UnitCapabilities::STRATEGIC_BOMBER)
                    })?
                    .is_empty()
            }
            BattleKind::AirBattle | BattleKind::Normal => {
                !battle.defending.is_empty() && !battle.attacking.is_empty()
            }
        };
        if !engaged {
            return Ok(false);
        }
        let air = battle.kind.is_air();
        Ok(throws_dice(world, units, &battle.attacking, Role::Offense, air)?
            || throws_dice(world, units, &battle.defending, Role::Defense, air)?)
    }

    fn finished(&self) -> Result<bool, BattleError> {
        Ok(!self.should_fight()? || self.battle.max_rounds_reached())
    }

    fn can_retreat(&self, side: Side) -> Result<bool, BattleError> {
        if self.battle.max_rounds_reached() || !self.should_fight()? {
            return Ok(false);
        }
        let config = self.config()?;
        Ok(match (self.battle.kind, side) {
            (BattleKind::AirBattle | BattleKind::AirRaid, Side::Attacker) => {
                config.air_battle_attackers_can_retreat()
            }
            (BattleKind::AirBattle | BattleKind::AirRaid, Side::Defender) => {
                config.air_battle_defenders_can_retreat()
            }
            (BattleKind::Normal, Side::Attacker) => {
                config.attackers_can_retreat() && !self.battle.attacked_from.is_empty()
            }
            _ => false,
        })
    }

    fn step_names(&self, first_run: bool) -> Result<Vec<StepName>, BattleError> {
        if self.battle.kind == BattleKind::BombingRaid {
            return Ok(vec![StepName::BombingRaid]);
        }
        let mut names = Vec::new();
        if first_run && self.battle.kind.is_air() {
            names.push(StepName::InterceptorsLaunch);
        }
        names.push(StepName::AttackersFire);
        names.push(StepName::DefendersFire);
        for side in [Side::Attacker, Side::Defender] {
            if self.can_retreat(side)? {
                names.push(StepName::withdraw(side));
            }
        }
        Ok(names)
    }

    /// The steps of one round, in execution order.
    pub(crate) fn phases(&self, first_run: bool) -> Result<Vec<Step>, BattleError> {
        let mut steps = Vec::new();
        if self.battle.kind == BattleKind::BombingRaid {
            if first_run {
                steps.push(Step::Bombard);
            }
        } else if self.should_fight()? {
            if first_run && self.battle.kind.is_air() {
                steps.push(Step::LaunchInterceptors);
            }
            steps.extend([
                Step::Fire(Side::Attacker),
                Step::Fire(Side::Defender),
                Step::RemoveCasualties,
            ]);
        }
        steps.extend([
            Step::MakeBattle,
            Step::EndIfFinished,
            Step::Retreat(Side::Attacker),
            Step::Retreat(Side::Defender),
            Step::NextRound,
        ]);
        Ok(steps)
    }

    /// Fresh start: round limit, rosters from the board, canonical order.
    pub(crate) fn start(&mut self) -> Result<(), BattleError> {
        let config = self.config()?;
        let units = self.units()?;
        let battle = &mut *self.battle;
        let world = &*self.ctx.world;

        battle.max_rounds = match battle.kind {
            BattleKind::AirBattle | BattleKind::AirRaid => config.air_battle_rounds(),
            BattleKind::Normal => config.land_battle_rounds(),
            BattleKind::BombingRaid => 1,
        };
        battle.defending = match battle.kind {
            BattleKind::AirBattle | BattleKind::AirRaid => eligibility::eligible_defenders(
                battle.kind.is_raid(),
                battle.site,
                battle.attacker,
                world,
                units,
                config,
            )?,
            BattleKind::Normal => world
                .units_at(battle.site)
                .filter(|unit| world.is_at_war(battle.attacker, unit.owner))
                .map(|unit| unit.id)
                .collect(),
            BattleKind::BombingRaid => Vec::new(),
        };
        battle.attacking.retain(|id| !battle.excluded.contains(id));
        battle.defending.retain(|id| !battle.excluded.contains(id));
        if battle.defender.is_none() {
            battle.defender = battle
                .defending
                .first()
                .and_then(|id| world.unit(*id))
                .map(|unit| unit.owner);
        }
        combat::sort_roster(&mut battle.attacking, world, units)?;
        combat::sort_roster(&mut battle.defending, world, units)?;

        self.show_battle()
    }

    pub(crate) fn show_battle(&mut self) -> Result<(), BattleError> {
        let battle = self.battle.id;
        let steps = self.step_names(self.battle.round == 1)?;
        self.emit(BattleEvent::BattleShown {
            battle,
            site: self.battle.site,
            kind: self.battle.kind,
            attackers: self.battle.attacking.clone(),
            defenders: self.battle.defending.clone(),
        });
        self.emit(BattleEvent::StepsListed { battle, steps });
        Ok(())
    }

    pub(crate) fn launch_interceptors(&mut self) -> StepResult {
        if self.battle.inbox.is_none() {
            self.enter(StepName::InterceptorsLaunch);
        }
        let units = self.units()?;
        let config = self.config()?;
        let site = self.battle.site;
        let candidates = self.battle.defending.clone();

        // Air battles let the defender keep planes grounded when defenders
        // may withdraw; otherwise every eligible plane goes up.
        let (asks, grounds) = if self.battle.kind.is_raid() {
            (true, false)
        } else if config.air_battle_defenders_can_retreat() {
            (true, true)
        } else {
            (false, false)
        };
        let cap = if candidates.is_empty() {
            None
        } else {
            let world = &*self.ctx.world;
            eligibility::max_interception_count(site, &live(world, &candidates), world, units)?
        };

        let selected = match self.battle.defender {
            Some(player) if asks && !candidates.is_empty() => match self.battle.inbox.take() {
                None => {
                    return Ok(StepControl::Suspend(DecisionRequest::SelectInterceptors {
                        battle: self.battle.id,
                        player,
                        site,
                        candidates,
                        max: cap,
                    }));
                }
                Some(Decision::Interceptors(selected)) => {
                    self.check_interceptors(&selected, &candidates, cap)?;
                    selected
                }
                Some(other) => return Err(self.mismatch(DecisionKind::Interceptors, &other)),
            },
            _ => {
                let take = cap.map_or(candidates.len(), |cap| candidates.len().min(cap as usize));
                candidates[..take].to_vec()
            }
        };

        let chosen: BTreeSet<UnitId> = selected.into_iter().collect();
        let (launched, withheld): (Vec<UnitId>, Vec<UnitId>) =
            candidates.iter().copied().partition(|id| chosen.contains(id));
        self.battle.defending = launched;
        if grounds && !withheld.is_empty() {
            self.retreat(&withheld, Side::Defender, None)?;
        }

        let site_name = self.site_name();
        if !self.battle.attacking.is_empty() {
            let attacker = self.battle.attacker;
            let text = format!(
                "{attacker} attacks with {} units heading to {site_name}",
                self.battle.attacking.len()
            );
            self.history(Some(attacker), text);
        }
        if !self.battle.defending.is_empty() {
            let defender = self.battle.defender;
            let text = format!(
                "{} launches {} interceptors out of {site_name}",
                defender.map_or_else(|| "defender".to_owned(), |p| p.to_string()),
                self.battle.defending.len()
            );
            self.history(defender, text);
            self.battle.intercepted = true;
            self.sound(SoundClip::AirBattle);
        }
        DONE
    }

    fn check_interceptors(
        &self,
        selected: &[UnitId],
        candidates: &[UnitId],
        cap: Option<u32>,
    ) -> Result<(), BattleError> {
        let mut seen = BTreeSet::new();
        for id in selected {
            if !candidates.contains(id) {
                return Err(self
                    .battle
                    .violation(IntegrityViolation::InterceptorNotEligible(*id)));
            }
            if !seen.insert(*id) {
                return Err(self
                    .battle
                    .violation(IntegrityViolation::InterceptorListedTwice(*id)));
            }
        }
        if let Some(cap) = cap
            && selected.len() as u32 > cap
        {
            return Err(self.battle.violation(IntegrityViolation::InterceptorCapExceeded {
                selected: selected.len() as u32,
                cap,
            }));
        }
        Ok(())
    }

    pub(crate) fn fire(&mut self, side: Side, stack: &mut ExecutionStack<Step>) -> StepResult {
        let fire_enabled = !self.battle.kind.is_air() || self.battle.intercepted;
        if !fire_enabled
            || self.battle.roster(side).is_empty()
            || self.battle.roster(side.opponent()).is_empty()
        {
            return DONE;
        }
        self.enter(StepName::fire(side));
        stack.push_all([
            Step::RollDice(side),
            Step::SelectCasualties(side),
            Step::NotifyCasualties(side),
        ]);
        DONE
    }

    pub(crate) fn roll_dice(&mut self, side: Side) -> StepResult {
        let units = self.units()?;
        let config = self.config()?;
        let rng = self.ctx.env.rng()?;
        let player = self.participant(side)?;

        let battle = &mut *self.battle;
        let world = &*self.ctx.world;
        let seed = DiceSeed {
            game_seed: config.game_seed(),
            battle: battle.id,
            roll: battle.rolls,
        };
        let dice = combat::roll_dice(
            &live(world, battle.roster(side)),
            role_of(side),
            battle.kind.is_air(),
            player,
            &StepName::fire(side).to_string(),
            config.dice_sides(),
            seed,
            units,
            rng,
        )?;
        battle.rolls += 1;
        *battle.fire_slot(side) = Some(FireRecord {
            dice,
            details: None,
        });
        DONE
    }

    pub(crate) fn select_casualties(&mut self, side: Side) -> StepResult {
        let units = self.units()?;
        let config = self.config()?;
        let target = side.opponent();
        let Some(dice) = self.battle.fire_slot(side).as_ref().map(|record| record.dice.clone())
        else {
            return Err(self.battle.violation(IntegrityViolation::MissingDice(side)));
        };
        let hits = dice.hits();

        let world = &*self.ctx.world;
        let roster = live(world, self.battle.roster(target));
        let pending = self.battle.waiting_to_die(target).clone();
        let default = combat::select_casualties(hits, &roster, &pending, units)?;
        let ask = config.player_selects_casualties()
            && combat::needs_player_selection(hits, &roster, &pending, units)?;

        let details = match self.battle.player(target) {
            Some(player) if ask => match self.battle.inbox.take() {
                None => {
                    let candidates = roster
                        .iter()
                        .map(|unit| unit.id)
                        .filter(|id| !pending.contains(id))
                        .collect();
                    return Ok(StepControl::Suspend(DecisionRequest::SelectCasualties {
                        battle: self.battle.id,
                        player,
                        hits,
                        candidates,
                        default,
                        dice,
                    }));
                }
                Some(Decision::Casualties(chosen)) => {
                    if let Some(violation) =
                        combat::validate_casualties(&chosen, hits, &roster, &pending, units)?
                    {
                        return Err(self.battle.violation(violation));
                    }
                    chosen
                }
                Some(other) => return Err(self.mismatch(DecisionKind::Casualties, &other)),
            },
            _ => default,
        };

        self.battle
            .waiting_to_die_mut(target)
            .extend(details.killed.iter().copied());
        self.ctx.world.mark_damaged(&details.damaged);
        if let Some(record) = self.battle.fire_slot(side) {
            record.details = Some(details);
        }
        DONE
    }

    pub(crate) fn notify_casualties(&mut self, side: Side) -> StepResult {
        let target = side.opponent();
        let Some(FireRecord {
            dice,
            details: Some(details),
        }) = self.battle.fire_slot(side).clone()
        else {
            return Err(self.battle.violation(IntegrityViolation::MissingDice(side)));
        };
        let hit_player = self.participant(target)?;
        let firing_player = self.participant(side)?;
        let step = StepName::fire(side);

        if self.config()?.confirm_casualties() {
            match self.battle.inbox.take() {
                None => {
                    return Ok(StepControl::Suspend(DecisionRequest::ConfirmCasualties {
                        battle: self.battle.id,
                        hit_player,
                        firing_player,
                        step,
                        dice,
                        details,
                    }));
                }
                Some(Decision::Acknowledged) => {}
                Some(other) => {
                    return Err(self.mismatch(DecisionKind::ConfirmCasualties, &other));
                }
            }
        }

        let text = format!(
            "{firing_player} rolls {} hits, {hit_player} loses {} and has {} damaged",
            dice.hits(),
            details.killed.len(),
            details.damaged.len()
        );
        let battle = self.battle.id;
        self.emit(BattleEvent::Casualties {
            battle,
            step,
            hit_player,
            dice,
            details,
        });
        self.history(Some(firing_player), text);
        *self.battle.fire_slot(side) = None;
        DONE
    }

    /// Takes units (and their cargo) out of the engagement and off the board,
    /// booking their value as lost and stripping them from dependent
    /// engagements.
    fn remove_units(&mut self, side: Side, ids: &[UnitId]) -> Result<(), BattleError> {
        if ids.is_empty() {
            return Ok(());
        }
        let units = self.units()?;
        let doomed = self.ctx.world.with_cargo(self.battle.site, ids);
        let value = value_of(self.ctx.world, units, &doomed)?;
        self.battle.forget_units(ids);
        let removed = self.ctx.world.remove_units(self.battle.site, ids);
        self.battle.forget_units(&removed);
        self.battle.add_lost_value(side, value);
        let battle = self.battle.id;
        self.ctx
            .tracker
            .units_lost_in_preceding_battle(battle, &removed, false, self.ctx.events);
        self.emit(BattleEvent::UnitsRemoved {
            battle,
            side,
            units: removed,
        });
        Ok(())
    }

    pub(crate) fn remove_casualties(&mut self) -> StepResult {
        if self.battle.kind.is_air() && !self.battle.intercepted {
            return DONE;
        }
        for side in [Side::Attacker, Side::Defender] {
            let waiting = self.battle.waiting_to_die(side);
            let doomed: Vec<UnitId> = self
                .battle
                .roster(side)
                .iter()
                .copied()
                .filter(|id| waiting.contains(id))
                .collect();
            self.remove_units(side, &doomed)?;
            self.battle.waiting_to_die_mut(side).clear();
        }

        // Suicide units go after ordinary casualties so nobody is removed twice.
        let units = self.units()?;
        let raid = self.battle.kind.is_raid();
        let attackers = matching(self.ctx.world, units, &self.battle.attacking, |def| {
            def.has(UnitCapabilities::SUICIDE)
                && !(raid && def.has(UnitCapabilities::STRATEGIC_BOMBER))
        })?;
        self.remove_units(Side::Attacker, &attackers)?;
        let defenders = matching(self.ctx.world, units, &self.battle.defending, |def| {
            def.has(UnitCapabilities::SUICIDE)
        })?;
        self.remove_units(Side::Defender, &defenders)?;
        DONE
    }

    pub(crate) fn make_battle(&mut self, stack: &mut ExecutionStack<Step>) -> StepResult {
        if !self.finished()? || !self.battle.kind.is_raid() {
            return DONE;
        }
        let bombers = self.record_air_battle_participants()?;
        if bombers.is_empty() {
            return DONE;
        }
        let mut steps: Vec<Step> = bombers.into_iter().map(Step::SpawnBombingRaid).collect();
        steps.push(Step::LinkBombingRaid);
        stack.push_all(steps);
        DONE
    }

    /// Flags everyone in a finished raid so they sit out later air battles;
    /// returns the surviving bombers.
    fn record_air_battle_participants(&mut self) -> Result<Vec<UnitId>, BattleError> {
        let units = self.units()?;
        self.ctx
            .world
            .set_flag(&self.battle.attacking, UnitFlags::WAS_IN_AIR_BATTLE);
        self.ctx
            .world
            .set_flag(&self.battle.defending, UnitFlags::WAS_IN_AIR_BATTLE);
        Ok(matching(self.ctx.world, units, &self.battle.attacking, |def| {
            def.has(UnitCapabilities::STRATEGIC_BOMBER)
        })?)
    }

    pub(crate) fn spawn_bombing_raid(&mut self, bomber: UnitId) -> StepResult {
        let site = self.battle.site;
        if !self.ctx.world.contains(site, bomber) {
            return DONE;
        }
        let units = self.units()?;
        let config = self.config()?;
        let targets = bombing_targets(self.ctx.world, units, site, self.battle.attacker, bomber)?;
        let Some(&first) = targets.first() else {
            return DONE;
        };

        let target = if targets.len() > 1 && config.damage_from_bombing_done_to_units() {
            match self.battle.inbox.take() {
                None => {
                    return Ok(StepControl::Suspend(DecisionRequest::BomberTarget {
                        battle: self.battle.id,
                        player: self.battle.attacker,
                        bomber,
                        targets,
                    }));
                }
                Some(Decision::BomberTarget(target)) if targets.contains(&target) => target,
                Some(Decision::BomberTarget(target)) => {
                    return Err(self
                        .battle
                        .violation(IntegrityViolation::TargetNotOffered(target)));
                }
                Some(other) => return Err(self.mismatch(DecisionKind::BomberTarget, &other)),
            }
        } else {
            first
        };
        self.register_bombing_raid(bomber, target);
        DONE
    }

    fn register_bombing_raid(&mut self, bomber: UnitId, target: UnitId) {
        let battle = &*self.battle;
        let raid = self.ctx.tracker.add_bombing_raid(
            battle.site,
            battle.attacker,
            battle.defender,
            bomber,
            target,
        );
        if !self.battle.spawned.contains(&raid) {
            self.battle.spawned.push(raid);
        }
        let text = format!("{bomber} heads for {target}");
        self.history(Some(self.battle.attacker), text);
    }

    /// Pending battles at the site wait for the bombing raid.
    pub(crate) fn link_bombing_raid(&mut self) -> StepResult {
        let site = self.battle.site;
        let tracker = &mut *self.ctx.tracker;
        let Some(raid) = tracker.pending(site, BattleKind::BombingRaid) else {
            return DONE;
        };
        for kind in [BattleKind::Normal, BattleKind::AirBattle] {
            if let Some(dependent) = tracker.pending(site, kind) {
                tracker.add_dependency(dependent, raid)?;
            }
        }
        DONE
    }

    /// One die per bomber, dealt as damage to its target up to the target's cap.
    pub(crate) fn bombard(&mut self) -> StepResult {
        self.enter(StepName::BombingRaid);
        let units = self.units()?;
        let config = self.config()?;
        let rng = self.ctx.env.rng()?;
        let site = self.battle.site;
        let attacker = self.battle.attacker;

        let bombers = matching(self.ctx.world, units, &self.battle.attacking, |def| {
            def.has(UnitCapabilities::STRATEGIC_BOMBER)
        })?;
        let seed = DiceSeed {
            game_seed: config.game_seed(),
            battle: self.battle.id,
            roll: self.battle.rolls,
        };
        self.battle.rolls += 1;

        let mut struck = false;
        for (index, bomber) in bombers.into_iter().enumerate() {
            let fallback = bombing_targets(self.ctx.world, units, site, attacker, bomber)?;
            let target = self
                .battle
                .bombing_targets
                .get(&bomber)
                .copied()
                .filter(|target| fallback.contains(target))
                .or_else(|| fallback.first().copied());
            let Some(target) = target else { continue };
            let Some(cap) = self
                .ctx
                .world
                .unit(target)
                .map(|unit| units.require(&unit.unit_type).map(|def| def.max_bombing_damage))
                .transpose()?
            else {
                continue;
            };
            let value = rng.roll_die(seed.for_die(attacker, index as u32), config.dice_sides());
            let dealt = self.ctx.world.add_bombing_damage(target, value, cap);
            self.history(
                Some(attacker),
                format!("{bomber} rolls {value} and bombs {target} for {dealt} damage"),
            );
            struck = true;
        }
        if struck {
            self.sound(SoundClip::BombingRaid);
        }
        DONE
    }

    pub(crate) fn end_if_finished(&mut self) -> StepResult {
        if self.finished()? {
            self.conclude()?;
        }
        DONE
    }

    fn conclude(&mut self) -> Result<(), BattleError> {
        use BattleResultDescription as Desc;

        let units = self.units()?;
        let battle = &*self.battle;
        let (who_won, description, summary, clip) = if battle.attacking.is_empty() {
            (WhoWon::Defender, Desc::Lost, "the attackers have all died", SoundClip::Defeat)
        } else {
            match battle.kind {
                BattleKind::BombingRaid => (
                    WhoWon::Attacker,
                    Desc::Bombed,
                    "the bombers have struck their targets",
                    SoundClip::Victory,
                ),
                BattleKind::AirRaid => {
                    let bombers = matching(self.ctx.world, units, &battle.attacking, |def| {
                        def.has(UnitCapabilities::STRATEGIC_BOMBER)
                    })?;
                    if bombers.is_empty() {
                        (WhoWon::Draw, Desc::Stalemate, "the bombers have all died", SoundClip::Defeat)
                    } else if battle.defending.is_empty() {
                        (
                            WhoWon::Attacker,
                            Desc::WonWithoutConquering,
                            "the remaining bombers go on to their targets",
                            SoundClip::Victory,
                        )
                    } else {
                        (
                            WhoWon::Attacker,
                            Desc::WonWithEnemyLeft,
                            "the remaining bombers go on to their targets",
                            SoundClip::Victory,
                        )
                    }
                }
                BattleKind::AirBattle | BattleKind::Normal => {
                    if battle.defending.is_empty() {
                        (
                            WhoWon::Attacker,
                            Desc::WonWithoutConquering,
                            "the defenders have all died",
                            SoundClip::Victory,
                        )
                    } else {
                        (
                            WhoWon::Draw,
                            Desc::Stalemate,
                            "neither side is eliminated",
                            SoundClip::Stalemate,
                        )
                    }
                }
            }
        };
        let title = match battle.kind {
            BattleKind::AirBattle | BattleKind::AirRaid => "Air battle",
            BattleKind::BombingRaid => "Bombing raid",
            BattleKind::Normal => "Battle",
        };
        let outcome = BattleOutcome {
            battle: battle.id,
            who_won,
            description,
            rounds: battle.round,
            attacker_lost_value: battle.attacker_lost_value,
            defender_lost_value: battle.defender_lost_value,
        };

        self.history(None, format!("{title} is over, {summary}"));
        self.sound(clip);
        self.emit(BattleEvent::BattleEnded {
            outcome: outcome.clone(),
        });
        self.battle.outcome = Some(outcome);
        self.battle.is_over = true;
        Ok(())
    }

    pub(crate) fn retreat_query(&mut self, side: Side) -> StepResult {
        if self.battle.is_over || !self.can_retreat(side)? {
            return DONE;
        }
        let units = self.battle.roster(side).to_vec();
        if units.is_empty() {
            return DONE;
        }
        let candidates = if self.battle.kind.is_air() {
            vec![self.battle.site]
        } else {
            self.battle.attacked_from.clone()
        };
        if candidates.is_empty() {
            return DONE;
        }
        let player = self.participant(side)?;
        let step = StepName::withdraw(side);

        let to = match self.battle.inbox.take() {
            None => {
                self.enter(step);
                return Ok(StepControl::Suspend(DecisionRequest::Retreat {
                    battle: self.battle.id,
                    player,
                    side,
                    units,
                    candidates,
                    message: format!("{player} retreat?"),
                }));
            }
            Some(Decision::Retreat(to)) => to,
            Some(other) => return Err(self.mismatch(DecisionKind::Retreat, &other)),
        };
        let Some(to) = to else {
            return DONE;
        };
        if !candidates.contains(&to) {
            return Err(self
                .battle
                .violation(IntegrityViolation::RetreatNotOffered(to)));
        }

        self.sound(SoundClip::Retreat);
        self.retreat(&units, side, Some(to))?;
        let destination = match self.ctx.env.map() {
            Ok(map) => map.display_name(to),
            Err(_) => to.to_string(),
        };
        self.history(Some(player), format!("{player} retreats all units to {destination}"));
        DONE
    }

    /// Pulls `units` out of the engagement. Withdrawn attackers and grounded
    /// defenders are also stripped from every dependent engagement.
    fn retreat(
        &mut self,
        units: &[UnitId],
        side: Side,
        to: Option<TerritoryId>,
    ) -> Result<(), BattleError> {
        let battle = self.battle.id;
        if side == Side::Attacker || to.is_none() {
            self.ctx
                .tracker
                .units_lost_in_preceding_battle(battle, units, true, self.ctx.events);
        }
        let text = format!(
            "{} {}",
            describe(self.ctx.world, units),
            if to.is_some() { "retreated" } else { "grounded" }
        );
        self.battle.roster_mut(side).retain(|id| !units.contains(id));

        let site = self.battle.site;
        if self.battle.kind.is_air() {
            self.ctx.world.set_flag(units, UnitFlags::WAS_IN_AIR_BATTLE);
        } else if let Some(to) = to
            && to != site
        {
            self.ctx.world.move_units(site, to, units)?;
        }

        let player = self.battle.player(side);
        self.history(player, text);
        self.emit(BattleEvent::Retreated {
            battle,
            side,
            units: units.to_vec(),
            to,
        });
        Ok(())
    }

    pub(crate) fn next_round(&mut self, stack: &mut ExecutionStack<Step>) -> StepResult {
        if self.battle.is_over {
            return DONE;
        }
        if !stack.is_empty() {
            return Err(self.battle.violation(IntegrityViolation::StackNotEmpty {
                remaining: stack.len(),
            }));
        }
        self.battle.round += 1;
        let battle = self.battle.id;
        let steps = self.step_names(false)?;
        self.emit(BattleEvent::StepsListed { battle, steps });
        stack.push(Step::FightLoop);
        DONE
    }

    pub(crate) fn fight_loop(&mut self, stack: &mut ExecutionStack<Step>) -> StepResult {
        let phases = self.phases(false)?;
        stack.push_all(phases);
        DONE
    }

    pub(crate) fn finish_headless(&mut self) -> Result<BattleOutcome, BattleError> {
        if self.battle.kind.is_raid() {
            let units = self.units()?;
            let bombers = self.record_air_battle_participants()?;
            for bomber in bombers {
                let targets = bombing_targets(
                    self.ctx.world,
                    units,
                    self.battle.site,
                    self.battle.attacker,
                    bomber,
                )?;
                if let Some(&target) = targets.first() {
                    self.register_bombing_raid(bomber, target);
                }
            }
            self.link_bombing_raid()?;
        }
        let battle = &*self.battle;
        let outcome = BattleOutcome {
            battle: battle.id,
            who_won: WhoWon::Attacker,
            description: BattleResultDescription::NoBattle,
            rounds: battle.round,
            attacker_lost_value: battle.attacker_lost_value,
            defender_lost_value: battle.defender_lost_value,
        };
        self.battle.outcome = Some(outcome.clone());
        self.battle.is_over = true;
        Ok(outcome)
    }
}
