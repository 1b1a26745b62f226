use bitflags::bitflags;

use super::{PlayerId, UnitId, UnitTypeId};

bitflags! {
    /// Per-unit turn state that affects eligibility for engagements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnitFlags: u8 {
        /// Fought (or was grounded) in an air battle this turn.
        const WAS_IN_AIR_BATTLE = 1 << 0;
        /// Moved into its current territory by scrambling.
        const WAS_SCRAMBLED     = 1 << 1;
        /// Infrastructure knocked out (e.g. a bombed air base).
        const DISABLED          = 1 << 2;
    }
}

/// A unit on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    /// Hits absorbed so far; a unit dies once this reaches its hit points.
    pub hits: u32,
    /// Damage taken from strategic bombing.
    pub bombing_damage: u32,
    /// Carrier this unit rides in; removed together with it.
    pub transported_by: Option<UnitId>,
    pub flags: UnitFlags,
}

impl Unit {
    pub fn new(id: UnitId, unit_type: UnitTypeId, owner: PlayerId) -> Self {
        Self {
            id,
            unit_type,
            owner,
            hits: 0,
            bombing_damage: 0,
            transported_by: None,
            flags: UnitFlags::empty(),
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: UnitFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    pub fn is_transported(&self) -> bool {
        self.transported_by.is_some()
    }
}
