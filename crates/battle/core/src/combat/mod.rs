//! Combat resolver.
//!
//! Stateless math shared by every engagement kind:
//!
//! - [`roll_dice`]: firing roster → [`DiceRoll`]
//! - [`select_casualties`]: hits + target roster → [`CasualtyDetails`]
//! - [`validate_casualties`]: checks a participant's own casualty choice
//! - [`sort_roster`]: the stable total order used for presentation and ties

mod casualty;
mod dice;
mod order;

pub use casualty::{
    CasualtyDetails, hit_points_consumed, needs_player_selection, select_casualties,
    validate_casualties,
};
pub use dice::{DiceRoll, Die, roll_dice};
pub use order::sort_roster;

/// Which role a roster fires in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Offense,
    Defense,
}
