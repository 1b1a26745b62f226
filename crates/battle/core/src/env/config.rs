use crate::config::BattleConfig;

/// Rules accessor consulted by engagements.
pub trait ConfigOracle: Send + Sync {
    fn game_seed(&self) -> u64;
    fn dice_sides(&self) -> u32;
    /// 0 means unbounded.
    fn air_battle_rounds(&self) -> u32;
    /// 0 means unbounded.
    fn land_battle_rounds(&self) -> u32;
    fn air_battle_attackers_can_retreat(&self) -> bool;
    fn air_battle_defenders_can_retreat(&self) -> bool;
    fn attackers_can_retreat(&self) -> bool;
    fn can_scramble_into_air_battles(&self) -> bool;
    fn damage_from_bombing_done_to_units(&self) -> bool;
    fn player_selects_casualties(&self) -> bool;
    fn confirm_casualties(&self) -> bool;
}

impl ConfigOracle for BattleConfig {
    fn game_seed(&self) -> u64 {
        self.game_seed
    }

    fn dice_sides(&self) -> u32 {
        self.dice_sides.max(1)
    }

    fn air_battle_rounds(&self) -> u32 {
        self.air_battle_rounds
    }

    fn land_battle_rounds(&self) -> u32 {
        self.land_battle_rounds
    }

    fn air_battle_attackers_can_retreat(&self) -> bool {
        self.air_battle_attackers_can_retreat
    }

    fn air_battle_defenders_can_retreat(&self) -> bool {
        self.air_battle_defenders_can_retreat
    }

    fn attackers_can_retreat(&self) -> bool {
        self.attackers_can_retreat
    }

    fn can_scramble_into_air_battles(&self) -> bool {
        self.can_scramble_into_air_battles
    }

    fn damage_from_bombing_done_to_units(&self) -> bool {
        self.damage_from_bombing_done_to_units
    }

    fn player_selects_casualties(&self) -> bool {
        self.player_selects_casualties
    }

    fn confirm_casualties(&self) -> bool {
        self.confirm_casualties
    }
}
