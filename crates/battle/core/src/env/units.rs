use bitflags::bitflags;

use crate::combat::Role;
use crate::state::{Unit, UnitTypeId};

use super::OracleError;

bitflags! {
    /// Static capabilities of a unit type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnitCapabilities: u16 {
        /// Flies; may take part in air battles as escort or defender.
        const CAN_AIR_BATTLE            = 1 << 0;
        /// May intercept a bombing raid.
        const CAN_INTERCEPT             = 1 << 1;
        const STRATEGIC_BOMBER          = 1 << 2;
        /// Destroyed at the end of the round it fights in, hit or not.
        const SUICIDE                   = 1 << 3;
        const AIR_BASE                  = 1 << 4;
        /// Intercepts only when an air base is present.
        const REQUIRES_AIR_BASE         = 1 << 5;
        /// May be chosen as a strategic bombing target.
        const CAN_BE_DAMAGED            = 1 << 6;
        const CAN_SCRAMBLE              = 1 << 7;
    }
}

/// Attributes of one unit type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UnitTypeDef {
    pub id: UnitTypeId,
    pub attack: u32,
    pub defense: u32,
    pub attack_rolls: u32,
    pub defense_rolls: u32,
    pub air_attack: u32,
    pub air_defense: u32,
    pub hit_points: u32,
    /// Production value, used for lost-value accounting and casualty order.
    pub cost: u32,
    pub capabilities: UnitCapabilities,
    /// Interceptors an air base of this type supports; `None` is unlimited.
    pub max_intercept_count: Option<u32>,
    pub max_scramble_distance: u32,
    /// Cap on bombing damage this unit can take.
    pub max_bombing_damage: u32,
    /// Types this bomber may strike; `None` allows any damageable unit.
    pub bombing_targets: Option<Vec<UnitTypeId>>,
}

impl Default for UnitTypeDef {
    fn default() -> Self {
        Self {
            id: UnitTypeId::default(),
            attack: 0,
            defense: 0,
            attack_rolls: 1,
            defense_rolls: 1,
            air_attack: 0,
            air_defense: 0,
            hit_points: 1,
            cost: 0,
            capabilities: UnitCapabilities::empty(),
            max_intercept_count: Some(0),
            max_scramble_distance: 0,
            max_bombing_damage: 0,
            bombing_targets: None,
        }
    }
}

impl UnitTypeDef {
    pub fn new(id: impl Into<UnitTypeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_combat(mut self, attack: u32, defense: u32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self
    }

    pub fn with_air_combat(mut self, air_attack: u32, air_defense: u32) -> Self {
        self.air_attack = air_attack;
        self.air_defense = air_defense;
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points.max(1);
        self
    }

    pub fn with_capabilities(mut self, capabilities: UnitCapabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    pub fn with_intercept_capacity(mut self, capacity: Option<u32>) -> Self {
        self.max_intercept_count = capacity;
        self
    }

    pub fn with_scramble_distance(mut self, distance: u32) -> Self {
        self.max_scramble_distance = distance;
        self
    }

    pub fn with_bombing_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<UnitTypeId>,
    {
        self.bombing_targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn can_bomb(&self, target: &UnitTypeId) -> bool {
        self.bombing_targets
            .as_ref()
            .is_none_or(|allowed| allowed.contains(target))
    }

    pub fn with_max_bombing_damage(mut self, damage: u32) -> Self {
        self.max_bombing_damage = damage;
        self
    }

    #[inline]
    pub fn has(&self, capability: UnitCapabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Hit threshold for the given role; 0 means the unit cannot fire.
    pub fn strength(&self, role: Role, air: bool) -> u32 {
        match (role, air) {
            (Role::Offense, false) => self.attack,
            (Role::Defense, false) => self.defense,
            (Role::Offense, true) => self.air_attack,
            (Role::Defense, true) => self.air_defense,
        }
    }

    /// Dice this unit throws in the given role.
    pub fn rolls(&self, role: Role, air: bool) -> u32 {
        if self.strength(role, air) == 0 {
            return 0;
        }
        match role {
            Role::Offense => self.attack_rolls,
            Role::Defense => self.defense_rolls,
        }
    }

    /// Hits `unit` can still absorb before dying (at least one).
    pub fn remaining_hit_points(&self, unit: &Unit) -> u32 {
        self.hit_points.saturating_sub(unit.hits).max(1)
    }
}

/// Read-only unit attribute tables.
pub trait UnitOracle: Send + Sync {
    fn definition(&self, unit_type: &UnitTypeId) -> Option<&UnitTypeDef>;

    fn definitions(&self) -> Vec<&UnitTypeDef>;

    /// Definition for `unit_type`, or an error naming the missing type.
    fn require(&self, unit_type: &UnitTypeId) -> Result<&UnitTypeDef, OracleError> {
        self.definition(unit_type)
            .ok_or_else(|| OracleError::UnknownUnitType(unit_type.clone()))
    }

    /// Furthest any scrambling type can travel.
    fn max_scramble_distance(&self) -> u32 {
        self.definitions()
            .into_iter()
            .filter(|def| def.has(UnitCapabilities::CAN_SCRAMBLE))
            .map(|def| def.max_scramble_distance)
            .max()
            .unwrap_or(0)
    }
}
