//! A single engagement: rosters, round counter, outcome, and the execution
//! stack that drives them.
//!
//! [`Engagement::fight`] either resumes a suspended stack or, on a fresh
//! start, rebuilds both rosters from the board and pushes the first round's
//! phase list. It returns as soon as the stack drains or a step needs a
//! participant decision.

mod phases;

use std::collections::{BTreeMap, BTreeSet};

use crate::combat::{CasualtyDetails, DiceRoll};
use crate::error::ErrorContext;
use crate::state::{BattleId, PlayerId, TerritoryId, UnitId, WorldState};

use super::stack::{ExecutionStack, StackStatus};
use super::{
    BattleContext, BattleError, BattleKind, BattleOutcome, Decision, DecisionRequest,
    IntegrityViolation, Route, Side, Step, WhoWon,
};

/// Result of one `fight` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FightStatus {
    /// A step is waiting on this request; answer it and fight again.
    AwaitingDecision(DecisionRequest),
    Concluded(BattleOutcome),
}

/// Dice and casualties of one side's fire phase, kept between sub-steps.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct FireRecord {
    pub(crate) dice: DiceRoll,
    pub(crate) details: Option<CasualtyDetails>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngagementState {
    id: BattleId,
    site: TerritoryId,
    kind: BattleKind,
    attacker: PlayerId,
    defender: Option<PlayerId>,
    attacking: Vec<UnitId>,
    defending: Vec<UnitId>,
    attacking_waiting_to_die: BTreeSet<UnitId>,
    defending_waiting_to_die: BTreeSet<UnitId>,
    /// Where attackers came from; ground retreats go back there.
    attacked_from: Vec<TerritoryId>,
    /// Units stripped by a preceding engagement; never rejoin this one.
    excluded: BTreeSet<UnitId>,
    /// Bomber -> chosen target, for bombing raids.
    bombing_targets: BTreeMap<UnitId, UnitId>,
    round: u32,
    max_rounds: u32,
    /// Dice rolls made so far; feeds the dice seed.
    rolls: u32,
    attacker_lost_value: u32,
    defender_lost_value: u32,
    /// Set once the defender launched at least one interceptor.
    intercepted: bool,
    attacker_fire: Option<FireRecord>,
    defender_fire: Option<FireRecord>,
    outcome: Option<BattleOutcome>,
    is_over: bool,
    /// Follow-on engagements this one registered.
    spawned: Vec<BattleId>,
    pending: Option<DecisionRequest>,
    inbox: Option<Decision>,
}

impl EngagementState {
    fn new(
        id: BattleId,
        site: TerritoryId,
        kind: BattleKind,
        attacker: PlayerId,
        defender: Option<PlayerId>,
    ) -> Self {
        Self {
            id,
            site,
            kind,
            attacker,
            defender,
            attacking: Vec::new(),
            defending: Vec::new(),
            attacking_waiting_to_die: BTreeSet::new(),
            defending_waiting_to_die: BTreeSet::new(),
            attacked_from: Vec::new(),
            excluded: BTreeSet::new(),
            bombing_targets: BTreeMap::new(),
            round: 1,
            max_rounds: 0,
            rolls: 0,
            attacker_lost_value: 0,
            defender_lost_value: 0,
            intercepted: false,
            attacker_fire: None,
            defender_fire: None,
            outcome: None,
            is_over: false,
            spawned: Vec::new(),
            pending: None,
            inbox: None,
        }
    }

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn site(&self) -> TerritoryId {
        self.site
    }

    pub fn kind(&self) -> BattleKind {
        self.kind
    }

    pub fn attacker(&self) -> PlayerId {
        self.attacker
    }

    pub fn defender(&self) -> Option<PlayerId> {
        self.defender
    }

    pub fn attacking_units(&self) -> &[UnitId] {
        &self.attacking
    }

    pub fn defending_units(&self) -> &[UnitId] {
        &self.defending
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Round limit in force; 0 is unbounded.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn lost_value(&self, side: Side) -> u32 {
        match side {
            Side::Attacker => self.attacker_lost_value,
            Side::Defender => self.defender_lost_value,
        }
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn who_won(&self) -> WhoWon {
        self.outcome
            .as_ref()
            .map_or(WhoWon::NotFinished, |outcome| outcome.who_won)
    }

    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.outcome.as_ref()
    }

    pub fn spawned(&self) -> &[BattleId] {
        &self.spawned
    }

    pub fn excluded(&self) -> &BTreeSet<UnitId> {
        &self.excluded
    }

    pub fn pending_decision(&self) -> Option<&DecisionRequest> {
        self.pending.as_ref()
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::for_battle(self.id, self.site, self.round)
    }

    fn violation(&self, violation: IntegrityViolation) -> BattleError {
        BattleError::integrity(violation, self.context())
    }

    fn roster(&self, side: Side) -> &[UnitId] {
        match side {
            Side::Attacker => &self.attacking,
            Side::Defender => &self.defending,
        }
    }

    fn roster_mut(&mut self, side: Side) -> &mut Vec<UnitId> {
        match side {
            Side::Attacker => &mut self.attacking,
            Side::Defender => &mut self.defending,
        }
    }

    fn waiting_to_die(&self, side: Side) -> &BTreeSet<UnitId> {
        match side {
            Side::Attacker => &self.attacking_waiting_to_die,
            Side::Defender => &self.defending_waiting_to_die,
        }
    }

    fn waiting_to_die_mut(&mut self, side: Side) -> &mut BTreeSet<UnitId> {
        match side {
            Side::Attacker => &mut self.attacking_waiting_to_die,
            Side::Defender => &mut self.defending_waiting_to_die,
        }
    }

    fn fire_slot(&mut self, side: Side) -> &mut Option<FireRecord> {
        match side {
            Side::Attacker => &mut self.attacker_fire,
            Side::Defender => &mut self.defender_fire,
        }
    }

    fn player(&self, side: Side) -> Option<PlayerId> {
        match side {
            Side::Attacker => Some(self.attacker),
            Side::Defender => self.defender,
        }
    }

    fn add_lost_value(&mut self, side: Side, value: u32) {
        match side {
            Side::Attacker => self.attacker_lost_value += value,
            Side::Defender => self.defender_lost_value += value,
        }
    }

    /// Drops units from both rosters and both casualty sets.
    fn forget_units(&mut self, ids: &[UnitId]) {
        let keep = |id: &UnitId| !ids.contains(id);
        self.attacking.retain(keep);
        self.defending.retain(keep);
        self.attacking_waiting_to_die.retain(keep);
        self.defending_waiting_to_die.retain(keep);
    }

    fn max_rounds_reached(&self) -> bool {
        self.max_rounds > 0 && self.max_rounds <= self.round
    }

    /// Drops units that left the board (or the site) since the last call.
    fn remove_units_that_no_longer_exist(&mut self, world: &WorldState) {
        let site = self.site;
        let present = |id: &UnitId| world.contains(site, *id);
        self.attacking.retain(present);
        self.defending.retain(present);
    }
}

/// An engagement and its continuation stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Engagement {
    state: EngagementState,
    stack: ExecutionStack<Step>,
}

impl Engagement {
    pub fn new(
        id: BattleId,
        site: TerritoryId,
        kind: BattleKind,
        attacker: PlayerId,
        defender: Option<PlayerId>,
    ) -> Self {
        Self {
            state: EngagementState::new(id, site, kind, attacker, defender),
            stack: ExecutionStack::new(),
        }
    }

    pub fn id(&self) -> BattleId {
        self.state.id
    }

    pub fn site(&self) -> TerritoryId {
        self.state.site
    }

    pub fn kind(&self) -> BattleKind {
        self.state.kind
    }

    pub fn state(&self) -> &EngagementState {
        &self.state
    }

    pub fn stack(&self) -> &ExecutionStack<Step> {
        &self.stack
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over
    }

    pub fn who_won(&self) -> WhoWon {
        self.state.who_won()
    }

    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.state.outcome()
    }

    /// Joins `units` to the attack. `route` records where they came from.
    pub fn add_attacking_units(&mut self, route: Option<Route>, units: &[UnitId]) {
        for unit in units {
            if !self.state.attacking.contains(unit) {
                self.state.attacking.push(*unit);
            }
        }
        if let Some(route) = route
            && route.start != self.state.site
            && !self.state.attacked_from.contains(&route.start)
        {
            self.state.attacked_from.push(route.start);
        }
    }

    pub fn remove_attacking_units(&mut self, units: &[UnitId]) {
        self.state.attacking.retain(|id| !units.contains(id));
    }

    pub(crate) fn set_bombing_target(&mut self, bomber: UnitId, target: UnitId) {
        self.state.bombing_targets.insert(bomber, target);
    }

    pub fn bombing_target(&self, bomber: UnitId) -> Option<UnitId> {
        self.state.bombing_targets.get(&bomber).copied()
    }

    /// Strips units consumed or withdrawn by a preceding engagement.
    ///
    /// Returns the units actually stripped; repeating the call with the same
    /// units strips nothing more.
    pub fn units_lost_in_preceding_battle(&mut self, units: &[UnitId]) -> Vec<UnitId> {
        let mut stripped = Vec::new();
        for unit in units {
            let before = self.state.attacking.len() + self.state.defending.len();
            self.state.attacking.retain(|id| id != unit);
            self.state.defending.retain(|id| id != unit);
            self.state.bombing_targets.remove(unit);
            let removed = before != self.state.attacking.len() + self.state.defending.len();
            if self.state.excluded.insert(*unit) || removed {
                stripped.push(*unit);
            }
        }
        stripped
    }

    /// Accepts the answer to the pending request.
    pub(crate) fn provide_decision(&mut self, decision: Decision) -> Result<(), BattleError> {
        let Some(pending) = &self.state.pending else {
            return Err(BattleError::NoPendingDecision(self.state.id));
        };
        if pending.kind() != decision.kind() {
            return Err(BattleError::UnexpectedDecision {
                battle: self.state.id,
                expected: pending.kind(),
                provided: decision.kind(),
            });
        }
        self.state.pending = None;
        self.state.inbox = Some(decision);
        Ok(())
    }

    /// Runs until the engagement concludes or needs a decision.
    pub fn fight(&mut self, ctx: &mut BattleContext<'_, '_>) -> Result<FightStatus, BattleError> {
        self.state.remove_units_that_no_longer_exist(ctx.world);

        if let Some(request) = &self.state.pending {
            return Ok(FightStatus::AwaitingDecision(request.clone()));
        }

        if self.stack.is_executing() {
            let mut scope = StepScope {
                battle: &mut self.state,
                ctx: &mut *ctx,
            };
            scope.show_battle()?;
            return self.drain(ctx);
        }

        if self.state.is_over {
            return self.concluded();
        }

        let mut scope = StepScope {
            battle: &mut self.state,
            ctx: &mut *ctx,
        };
        scope.start()?;
        let phases = scope.phases(true)?;
        self.stack.push_all(phases);
        self.drain(ctx)
    }

    fn drain(&mut self, ctx: &mut BattleContext<'_, '_>) -> Result<FightStatus, BattleError> {
        let mut scope = StepScope {
            battle: &mut self.state,
            ctx,
        };
        match self.stack.execute(&mut scope)? {
            StackStatus::Suspended(request) => {
                self.state.pending = Some(request.clone());
                Ok(FightStatus::AwaitingDecision(request))
            }
            StackStatus::Drained => self.concluded(),
        }
    }

    fn concluded(&self) -> Result<FightStatus, BattleError> {
        match &self.state.outcome {
            Some(outcome) if self.state.is_over => Ok(FightStatus::Concluded(outcome.clone())),
            _ => Err(self.state.violation(IntegrityViolation::Stalled)),
        }
    }

    /// Ends the engagement without fighting: follow-on consequences run with
    /// default choices and the attacker is credited with a no-battle result.
    pub(crate) fn finish_headless(
        &mut self,
        ctx: &mut BattleContext<'_, '_>,
    ) -> Result<BattleOutcome, BattleError> {
        self.stack = ExecutionStack::new();
        let mut scope = StepScope {
            battle: &mut self.state,
            ctx,
        };
        scope.finish_headless()
    }
}

/// What a step sees while it runs: its own engagement plus the outside world.
pub struct StepScope<'s, 'a, 'e> {
    battle: &'s mut EngagementState,
    ctx: &'s mut BattleContext<'a, 'e>,
}

#[cfg(test)]
mod tests;
