/// Rule switches that shape how an engagement plays out.
///
/// Read by the engine only through [`crate::env::ConfigOracle`], so hosts may
/// back the oracle with something other than this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Base seed mixed into every dice roll.
    pub game_seed: u64,
    pub dice_sides: u32,
    /// Round limit for air battles and air raids; 0 means unbounded.
    pub air_battle_rounds: u32,
    /// Round limit for ground and sea battles; 0 means unbounded.
    pub land_battle_rounds: u32,
    pub air_battle_attackers_can_retreat: bool,
    pub air_battle_defenders_can_retreat: bool,
    pub attackers_can_retreat: bool,
    pub can_scramble_into_air_battles: bool,
    /// Bombers pick a damageable unit to bomb instead of the territory.
    pub damage_from_bombing_done_to_units: bool,
    /// Ask the hit player to choose casualties when the choice matters.
    pub player_selects_casualties: bool,
    /// Require both sides to acknowledge every casualty notification.
    pub confirm_casualties: bool,
}

impl BattleConfig {
    pub const DEFAULT_DICE_SIDES: u32 = 6;
    pub const DEFAULT_AIR_BATTLE_ROUNDS: u32 = 1;

    pub fn new() -> Self {
        Self {
            game_seed: 0,
            dice_sides: Self::DEFAULT_DICE_SIDES,
            air_battle_rounds: Self::DEFAULT_AIR_BATTLE_ROUNDS,
            land_battle_rounds: 0,
            air_battle_attackers_can_retreat: true,
            air_battle_defenders_can_retreat: true,
            attackers_can_retreat: true,
            can_scramble_into_air_battles: false,
            damage_from_bombing_done_to_units: true,
            player_selects_casualties: true,
            confirm_casualties: true,
        }
    }

    /// Configuration for runs without any remote participant: no casualty
    /// choice and no acknowledgement handshake.
    pub fn headless() -> Self {
        Self {
            player_selects_casualties: false,
            confirm_casualties: false,
            ..Self::new()
        }
    }

    pub fn with_seed(mut self, game_seed: u64) -> Self {
        self.game_seed = game_seed;
        self
    }

    pub fn with_air_battle_rounds(mut self, rounds: u32) -> Self {
        self.air_battle_rounds = rounds;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
