//! Runtime wrappers around the static rule oracles.
//!
//! These implementations expose `battle-core` oracle traits and bundle them
//! into an [`OracleManager`] so the worker can build a [`BattleEnv`] for every
//! engine call. The data is immutable once the runtime is built; the world and
//! the engagements live in the worker.
mod config;
mod map;
mod units;

use std::sync::Arc;

use battle_core::{BattleEnv, Env, PcgRng};

pub use config::ConfigOracleImpl;
pub use map::MapOracleImpl;
pub use units::UnitOracleImpl;

/// Owns every oracle implementation and hands out borrowed environments.
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) units: Arc<UnitOracleImpl>,
    pub(crate) map: Arc<MapOracleImpl>,
    pub(crate) config: Arc<ConfigOracleImpl>,
    pub(crate) rng: PcgRng,
}

impl OracleManager {
    pub fn new(
        units: Arc<UnitOracleImpl>,
        map: Arc<MapOracleImpl>,
        config: Arc<ConfigOracleImpl>,
    ) -> Self {
        Self {
            units,
            map,
            config,
            rng: PcgRng,
        }
    }

    pub fn as_battle_env(&self) -> BattleEnv<'_> {
        Env::with_all(
            self.units.as_ref(),
            self.map.as_ref(),
            self.config.as_ref(),
            &self.rng,
        )
        .as_battle_env()
    }

    pub fn units(&self) -> &UnitOracleImpl {
        &self.units
    }

    pub fn map(&self) -> &MapOracleImpl {
        &self.map
    }

    pub fn config(&self) -> &ConfigOracleImpl {
        &self.config
    }
}
