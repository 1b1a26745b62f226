use crate::env::{DiceSeed, OracleError, RngOracle, UnitOracle};
use crate::state::{PlayerId, Unit};

use super::Role;

/// One thrown die.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Die {
    pub value: u32,
    /// Highest value that still counts as a hit.
    pub hit_at: u32,
}

impl Die {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.value <= self.hit_at
    }
}

/// Every die thrown by one side in one fire phase.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceRoll {
    pub player: PlayerId,
    /// Phase the roll belongs to, e.g. "Attackers Fire".
    pub label: String,
    dice: Vec<Die>,
    hits: u32,
}

impl DiceRoll {
    pub fn new(player: PlayerId, label: impl Into<String>, dice: Vec<Die>) -> Self {
        let hits = dice.iter().filter(|die| die.is_hit()).count() as u32;
        Self {
            player,
            label: label.into(),
            dice,
            hits,
        }
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }
}

/// Rolls for every unit in `roster` firing in `role`.
///
/// Units without strength in the role throw nothing but stay in the roster.
#[allow(clippy::too_many_arguments)]
pub fn roll_dice<U, R>(
    roster: &[&Unit],
    role: Role,
    air: bool,
    player: PlayerId,
    label: &str,
    sides: u32,
    seed: DiceSeed,
    units: &U,
    rng: &R,
) -> Result<DiceRoll, OracleError>
where
    U: UnitOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    let mut dice = Vec::new();
    for unit in roster {
        let def = units.require(&unit.unit_type)?;
        let hit_at = def.strength(role, air);
        for _ in 0..def.rolls(role, air) {
            let value = rng.roll_die(seed.for_die(player, dice.len() as u32), sides);
            dice.push(Die { value, hit_at });
        }
    }
    Ok(DiceRoll::new(player, label, dice))
}
