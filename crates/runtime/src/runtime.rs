//! High-level runtime orchestrator.
//!
//! The runtime owns the battle worker, wires up command and event channels,
//! and drives engagements through the [`BattleDriver`].

use std::sync::Arc;

use battle_core::{BattleConfig, BattleId, BattleOutcome, BattleTracker, PlayerId, WorldState};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

use crate::api::{DecisionProvider, ProviderKind, ProviderRegistry, Result, RuntimeError, RuntimeHandle};
use crate::driver::BattleDriver;
use crate::events::EventBus;
use crate::oracle::{ConfigOracleImpl, MapOracleImpl, OracleManager, UnitOracleImpl};
use crate::repository::BattleSnapshot;
use crate::scenario::PlannedAttack;
use crate::workers::BattleWorker;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Rules used when the builder assembles the oracles itself.
    pub battle_config: BattleConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle_config: BattleConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime that resolves battles.
///
/// [`RuntimeHandle`] is the cloneable façade for clients; the runtime adds
/// provider routing on top of it.
pub struct Runtime {
    handle: RuntimeHandle,
    driver: BattleDriver,
    worker: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn driver(&self) -> BattleDriver {
        self.driver.clone()
    }

    /// Register the engagements of a scenario attack.
    pub async fn declare(&self, attack: &PlannedAttack) -> Result<BattleId> {
        self.handle
            .declare_attack(attack.route, attack.attacker, attack.units.clone(), attack.bombing)
            .await
    }

    pub async fn fight(&self, battle: BattleId) -> Result<BattleOutcome> {
        self.driver.fight(battle).await
    }

    pub async fn fight_all(&self) -> Result<Vec<BattleOutcome>> {
        self.driver.fight_all().await
    }

    pub async fn register_provider(
        &self,
        kind: ProviderKind,
        provider: Arc<dyn DecisionProvider>,
    ) {
        self.driver
            .providers()
            .write()
            .await
            .register_shared(kind, provider);
    }

    pub async fn bind_player(&self, player: PlayerId, kind: ProviderKind) {
        self.driver.providers().write().await.bind_player(player, kind);
    }

    /// Stop the worker once every outstanding handle has been dropped.
    pub async fn shutdown(self) -> Result<()> {
        let Runtime {
            handle,
            driver,
            worker,
        } = self;
        drop(driver);
        drop(handle);
        worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

pub struct RuntimeBuilder {
    config: RuntimeConfig,
    oracles: Option<OracleManager>,
    units: Option<UnitOracleImpl>,
    map: Option<MapOracleImpl>,
    snapshot: Option<BattleSnapshot>,
    providers: ProviderRegistry,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracles: None,
            units: None,
            map: None,
            snapshot: None,
            providers: ProviderRegistry::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a ready oracle bundle; its config wins over `RuntimeConfig`.
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    pub fn units(mut self, units: UnitOracleImpl) -> Self {
        self.units = Some(units);
        self
    }

    pub fn map(mut self, map: MapOracleImpl) -> Self {
        self.map = Some(map);
        self
    }

    /// Start from `world` with no engagements registered.
    pub fn world(mut self, world: WorldState) -> Self {
        self.snapshot = Some(BattleSnapshot::new(0, world, BattleTracker::new()));
        self
    }

    /// Resume from a saved snapshot, suspended engagements included.
    pub fn snapshot(mut self, snapshot: BattleSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    pub async fn build(self) -> Result<Runtime> {
        let oracles = match (self.oracles, self.units, self.map) {
            (Some(oracles), _, _) => oracles,
            (None, Some(units), Some(map)) => OracleManager::new(
                Arc::new(units),
                Arc::new(map),
                Arc::new(ConfigOracleImpl::new(self.config.battle_config.clone())),
            ),
            _ => return Err(RuntimeError::MissingOracles),
        };
        if self.config.command_buffer_size == 0 {
            return Err(RuntimeError::InvalidConfig(
                "command_buffer_size must be positive".to_string(),
            ));
        }

        let snapshot = self
            .snapshot
            .unwrap_or_else(|| BattleSnapshot::new(0, WorldState::new(), BattleTracker::new()));

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let worker = BattleWorker::new(snapshot, oracles, command_rx, event_bus.clone());
        let worker = tokio::spawn(async move {
            worker.run().await;
        });

        let handle = RuntimeHandle::new(command_tx, event_bus);
        let driver = BattleDriver::new(handle.clone(), Arc::new(RwLock::new(self.providers)));

        Ok(Runtime {
            handle,
            driver,
            worker,
        })
    }
}
