//! Config oracle implementation for the runtime.

use battle_core::{BattleConfig, ConfigOracle};

/// Runtime implementation of ConfigOracle that wraps BattleConfig.
pub struct ConfigOracleImpl {
    config: BattleConfig,
}

impl ConfigOracleImpl {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    pub fn battle_config(&self) -> &BattleConfig {
        &self.config
    }
}

impl ConfigOracle for ConfigOracleImpl {
    fn game_seed(&self) -> u64 {
        self.config.game_seed()
    }

    fn dice_sides(&self) -> u32 {
        self.config.dice_sides()
    }

    fn air_battle_rounds(&self) -> u32 {
        self.config.air_battle_rounds()
    }

    fn land_battle_rounds(&self) -> u32 {
        self.config.land_battle_rounds()
    }

    fn air_battle_attackers_can_retreat(&self) -> bool {
        self.config.air_battle_attackers_can_retreat()
    }

    fn air_battle_defenders_can_retreat(&self) -> bool {
        self.config.air_battle_defenders_can_retreat()
    }

    fn attackers_can_retreat(&self) -> bool {
        self.config.attackers_can_retreat()
    }

    fn can_scramble_into_air_battles(&self) -> bool {
        self.config.can_scramble_into_air_battles()
    }

    fn damage_from_bombing_done_to_units(&self) -> bool {
        self.config.damage_from_bombing_done_to_units()
    }

    fn player_selects_casualties(&self) -> bool {
        self.config.player_selects_casualties()
    }

    fn confirm_casualties(&self) -> bool {
        self.config.confirm_casualties()
    }
}
