//! Cloneable façade for issuing commands to the battle worker.
//!
//! [`RuntimeHandle`] hides channel plumbing. Every call is one round trip
//! to the worker, which never waits on a participant, so a handle may be
//! used from inside a decision provider while that provider's battle is
//! suspended.
use std::collections::HashMap;

use battle_core::{
    BattleId, BattleKind, BattleRecord, Decision, DecisionKind, FightStatus, PlayerId, Route,
    TerritoryId, UnitId, WorldState,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::repository::BattleSnapshot;
use crate::workers::Command;

/// Read-only view of a registered engagement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSummary {
    pub id: BattleId,
    pub site: TerritoryId,
    pub kind: BattleKind,
    pub attacker: PlayerId,
    pub defender: Option<PlayerId>,
    pub round: u32,
    pub blocked_by: Vec<BattleId>,
    pub pending: Option<DecisionKind>,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Register the engagements an attack along `route` triggers. Returns
    /// the engagement the force fights first.
    pub async fn declare_attack(
        &self,
        route: Route,
        attacker: PlayerId,
        units: Vec<UnitId>,
        bombing: bool,
    ) -> Result<BattleId> {
        self.request(|reply| Command::DeclareAttack {
            route,
            attacker,
            units,
            bombing,
            reply,
        })
        .await?
    }

    /// `dependent` may not be fought before `depends_on` concludes.
    pub async fn add_dependency(&self, dependent: BattleId, depends_on: BattleId) -> Result<()> {
        self.request(|reply| Command::AddDependency {
            dependent,
            depends_on,
            reply,
        })
        .await?
    }

    /// Run `battle` until it concludes or suspends on a decision.
    pub async fn fight(&self, battle: BattleId) -> Result<FightStatus> {
        self.request(|reply| Command::Fight { battle, reply }).await?
    }

    /// Hand the answer to `battle`'s pending request to the engine.
    pub async fn provide_decision(&self, battle: BattleId, decision: Decision) -> Result<()> {
        self.request(|reply| Command::ProvideDecision {
            battle,
            decision,
            reply,
        })
        .await?
    }

    /// End `battle` without fighting it.
    pub async fn void_battle(&self, battle: BattleId) -> Result<()> {
        self.request(|reply| Command::VoidBattle { battle, reply })
            .await?
    }

    /// Engagements nothing blocks, in id order.
    pub async fn unblocked(&self) -> Result<Vec<BattleSummary>> {
        self.request(|reply| Command::Unblocked { reply }).await
    }

    pub async fn battles(&self) -> Result<Vec<BattleSummary>> {
        self.request(|reply| Command::QueryBattles { reply }).await
    }

    pub async fn records(&self) -> Result<Vec<BattleRecord>> {
        self.request(|reply| Command::QueryRecords { reply }).await
    }

    /// Clone of the authoritative world.
    pub async fn query_world(&self) -> Result<WorldState> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    /// World and tracker as they stand, with every suspended engagement.
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Replace the worker's world and tracker with `snapshot`.
    pub async fn restore(&self, snapshot: BattleSnapshot) -> Result<()> {
        self.request(|reply| Command::Restore { snapshot, reply })
            .await
    }

    /// Subscribe to events from a specific topic.
    ///
    /// ```rust,ignore
    /// let mut battle_rx = handle.subscribe(Topic::Battle).await;
    /// while let Ok(Event::Battle(event)) = battle_rx.recv().await {
    ///     println!("{}", event.history_text().unwrap_or_default());
    /// }
    /// ```
    pub async fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic).await
    }

    pub async fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics).await
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
