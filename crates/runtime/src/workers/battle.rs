//! Battle worker that owns the authoritative world and tracker.
//!
//! Receives commands from [`crate::RuntimeHandle`], runs the engine, and
//! republishes its notifications on the [`EventBus`]. A `fight` command
//! returns as soon as the engagement concludes or suspends, so the worker is
//! never parked on a participant and keeps serving other callers.

use std::collections::BTreeSet;

use battle_core::{
    BattleError, BattleEvent, BattleId, BattleRecord, BattleTracker, Decision, EngineError, FightStatus,
    PlayerId, Route, UnitId, WorldState,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::api::{BattleSummary, Result};
use crate::events::{Event, EventBus, TrackerEvent};
use crate::oracle::OracleManager;
use crate::repository::BattleSnapshot;
use crate::types::Sequence;

/// Commands that can be sent to the battle worker
pub enum Command {
    DeclareAttack {
        route: Route,
        attacker: PlayerId,
        units: Vec<UnitId>,
        bombing: bool,
        reply: oneshot::Sender<Result<BattleId>>,
    },
    AddDependency {
        dependent: BattleId,
        depends_on: BattleId,
        reply: oneshot::Sender<Result<()>>,
    },
    Fight {
        battle: BattleId,
        reply: oneshot::Sender<Result<FightStatus>>,
    },
    ProvideDecision {
        battle: BattleId,
        decision: Decision,
        reply: oneshot::Sender<Result<()>>,
    },
    VoidBattle {
        battle: BattleId,
        reply: oneshot::Sender<Result<()>>,
    },
    Unblocked {
        reply: oneshot::Sender<Vec<BattleSummary>>,
    },
    QueryBattles {
        reply: oneshot::Sender<Vec<BattleSummary>>,
    },
    QueryRecords {
        reply: oneshot::Sender<Vec<BattleRecord>>,
    },
    QueryWorld {
        reply: oneshot::Sender<WorldState>,
    },
    Snapshot {
        reply: oneshot::Sender<BattleSnapshot>,
    },
    Restore {
        snapshot: BattleSnapshot,
        reply: oneshot::Sender<()>,
    },
}

/// Background task that processes battle commands one at a time.
pub struct BattleWorker {
    world: WorldState,
    tracker: BattleTracker,
    oracles: OracleManager,
    sequence: Sequence,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl BattleWorker {
    pub fn new(
        snapshot: BattleSnapshot,
        oracles: OracleManager,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::worker",
            sequence = snapshot.sequence,
            territories = snapshot.world.territories().count(),
            units = snapshot.world.unit_count(),
            battles = snapshot.tracker.battle_ids().len(),
            "battle worker initialized"
        );

        Self {
            world: snapshot.world,
            tracker: snapshot.tracker,
            oracles,
            sequence: snapshot.sequence,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop; ends when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }
        debug!(target: "runtime::worker", sequence = self.sequence, "battle worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::DeclareAttack {
                route,
                attacker,
                units,
                bombing,
                reply,
            } => {
                let result = self.handle_declare_attack(route, attacker, &units, bombing);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "DeclareAttack reply channel closed (caller dropped)");
                }
            }
            Command::AddDependency {
                dependent,
                depends_on,
                reply,
            } => {
                let result: Result<()> = self
                    .tracker
                    .add_dependency(dependent, depends_on)
                    .map_err(|err| BattleError::from(err).into());
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "AddDependency reply channel closed (caller dropped)");
                }
            }
            Command::Fight { battle, reply } => {
                let result = self.handle_fight(battle);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", battle = %battle, "Fight reply channel closed (caller dropped)");
                }
            }
            Command::ProvideDecision {
                battle,
                decision,
                reply,
            } => {
                let result: Result<()> = self
                    .tracker
                    .provide_decision(battle, decision)
                    .map_err(Into::into);
                if result.is_ok() {
                    self.sequence += 1;
                }
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", battle = %battle, "ProvideDecision reply channel closed (caller dropped)");
                }
            }
            Command::VoidBattle { battle, reply } => {
                let result = self.handle_void(battle);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", battle = %battle, "VoidBattle reply channel closed (caller dropped)");
                }
            }
            Command::Unblocked { reply } => {
                let summaries = self
                    .tracker
                    .unblocked()
                    .into_iter()
                    .filter_map(|id| self.summary(id))
                    .collect();
                if reply.send(summaries).is_err() {
                    debug!(target: "runtime::worker", "Unblocked reply channel closed (caller dropped)");
                }
            }
            Command::QueryBattles { reply } => {
                let summaries = self
                    .tracker
                    .battle_ids()
                    .into_iter()
                    .filter_map(|id| self.summary(id))
                    .collect();
                if reply.send(summaries).is_err() {
                    debug!(target: "runtime::worker", "QueryBattles reply channel closed (caller dropped)");
                }
            }
            Command::QueryRecords { reply } => {
                if reply.send(self.tracker.records().to_vec()).is_err() {
                    debug!(target: "runtime::worker", "QueryRecords reply channel closed (caller dropped)");
                }
            }
            Command::QueryWorld { reply } => {
                if reply.send(self.world.clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryWorld reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                let snapshot =
                    BattleSnapshot::new(self.sequence, self.world.clone(), self.tracker.clone());
                if reply.send(snapshot).is_err() {
                    debug!(target: "runtime::worker", "Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Restore { snapshot, reply } => {
                info!(
                    target: "runtime::worker",
                    sequence = snapshot.sequence,
                    battles = snapshot.tracker.battle_ids().len(),
                    "restoring snapshot"
                );
                self.sequence = snapshot.sequence;
                self.world = snapshot.world;
                self.tracker = snapshot.tracker;
                if reply.send(()).is_err() {
                    debug!(target: "runtime::worker", "Restore reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_declare_attack(
        &mut self,
        route: Route,
        attacker: PlayerId,
        units: &[UnitId],
        bombing: bool,
    ) -> Result<BattleId> {
        let before = self.registered();
        let env = self.oracles.as_battle_env();
        let battle = self
            .tracker
            .declare_attack(route, attacker, units, bombing, &self.world, env)?;
        self.sequence += 1;

        debug!(
            target: "runtime::worker",
            battle = %battle,
            site = %route.end,
            attacker = %attacker,
            units = units.len(),
            bombing,
            "attack declared"
        );
        self.publish_declared(&before);
        Ok(battle)
    }

    fn handle_fight(&mut self, battle: BattleId) -> Result<FightStatus> {
        let before = self.registered();
        let mut events = Vec::new();
        let env = self.oracles.as_battle_env();
        let result = self
            .tracker
            .fight(battle, &mut self.world, env, &mut events);

        self.publish_battle_events(events);
        self.publish_declared(&before);

        match &result {
            Ok(FightStatus::Concluded(outcome)) => {
                self.sequence += 1;
                info!(
                    target: "runtime::worker",
                    battle = %battle,
                    who_won = %outcome.who_won,
                    result = %outcome.description,
                    rounds = outcome.rounds,
                    "battle concluded"
                );
                if let Some(record) = self.tracker.records().last() {
                    self.event_bus.publish(Event::Tracker(TrackerEvent::Concluded {
                        record: record.clone(),
                    }));
                }
            }
            Ok(FightStatus::AwaitingDecision(request)) => {
                self.sequence += 1;
                debug!(
                    target: "runtime::worker",
                    battle = %battle,
                    kind = ?request.kind(),
                    player = %request.player(),
                    "battle suspended"
                );
            }
            Err(err) if err.severity().is_fatal() => {
                self.sequence += 1;
                let round = err.context().and_then(|ctx| ctx.round);
                error!(
                    target: "runtime::worker",
                    battle = %battle,
                    round = ?round,
                    severity = err.severity().as_str(),
                    code = err.error_code(),
                    error = %err,
                    "battle aborted"
                );
                self.event_bus.publish(Event::Tracker(TrackerEvent::Aborted {
                    battle,
                    error: err.to_string(),
                }));
            }
            Err(err) => {
                warn!(
                    target: "runtime::worker",
                    battle = %battle,
                    code = err.error_code(),
                    error = %err,
                    "fight refused"
                );
            }
        }

        result.map_err(Into::into)
    }

    fn handle_void(&mut self, battle: BattleId) -> Result<()> {
        let before = self.registered();
        let mut events = Vec::new();
        let env = self.oracles.as_battle_env();
        let result = self
            .tracker
            .void_battle(battle, &mut self.world, env, &mut events);

        self.publish_battle_events(events);
        self.publish_declared(&before);
        result?;

        self.sequence += 1;
        info!(target: "runtime::worker", battle = %battle, "battle voided");
        self.event_bus
            .publish(Event::Tracker(TrackerEvent::Voided { battle }));
        Ok(())
    }

    fn registered(&self) -> BTreeSet<BattleId> {
        self.tracker.battle_ids().into_iter().collect()
    }

    /// Announce engagements registered since `before` was taken.
    fn publish_declared(&self, before: &BTreeSet<BattleId>) {
        for engagement in self.tracker.battles() {
            if before.contains(&engagement.id()) {
                continue;
            }
            self.event_bus.publish(Event::Tracker(TrackerEvent::Declared {
                battle: engagement.id(),
                site: engagement.site(),
                kind: engagement.kind(),
            }));
        }
    }

    fn publish_battle_events(&self, events: Vec<BattleEvent>) {
        for event in events {
            self.event_bus.publish(Event::Battle(event));
        }
    }

    fn summary(&self, id: BattleId) -> Option<BattleSummary> {
        let engagement = self.tracker.battle(id)?;
        let state = engagement.state();
        Some(BattleSummary {
            id,
            site: engagement.site(),
            kind: engagement.kind(),
            attacker: state.attacker(),
            defender: state.defender(),
            round: state.round(),
            blocked_by: self.tracker.dependencies_of(id),
            pending: state.pending_decision().map(|request| request.kind()),
        })
    }
}
