//! Deterministic dice.
//!
//! Every die is derived from a seed built out of the game seed, the battle, the
//! roll ordinal within that battle, the firing player, and the die index. A
//! resumed engagement therefore rolls exactly what an uninterrupted one would.

use crate::state::{BattleId, PlayerId};

/// Stateless source of pseudo-random numbers keyed by seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a die with `sides` faces (1..=sides).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides.max(1)) + 1
    }
}

/// PCG-XSH-RR: one LCG step followed by an xorshift and a random rotation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Seed material for one dice roll of one engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiceSeed {
    pub game_seed: u64,
    pub battle: BattleId,
    /// Ordinal of this roll within the engagement.
    pub roll: u32,
}

impl DiceSeed {
    /// Seed for a single die of this roll.
    pub fn for_die(&self, player: PlayerId, die: u32) -> u64 {
        let mut hash = self.game_seed;
        hash ^= self.battle.0.wrapping_mul(0x9e3779b97f4a7c15);
        hash ^= (self.roll as u64).wrapping_mul(0xc2b2ae3d27d4eb4f);
        hash ^= (player.0 as u64).wrapping_mul(0x517cc1b727220a95);
        hash ^= (die as u64).wrapping_mul(0x85ebca6b);
        hash ^= hash >> 33;
        hash = hash.wrapping_mul(0xff51afd7ed558ccd);
        hash ^= hash >> 33;
        hash
    }
}
