use crate::env::{OracleError, UnitOracle};
use crate::state::{UnitId, WorldState};

/// Sorts a roster into its canonical order: cheapest first, then by type
/// name, then by id. Units missing from the world sort last by id.
pub fn sort_roster<U>(roster: &mut [UnitId], world: &WorldState, units: &U) -> Result<(), OracleError>
where
    U: UnitOracle + ?Sized,
{
    let mut keyed = Vec::with_capacity(roster.len());
    for id in roster.iter() {
        let key = match world.unit(*id) {
            Some(unit) => {
                let def = units.require(&unit.unit_type)?;
                (0u8, def.cost, unit.unit_type.as_str().to_owned(), *id)
            }
            None => (1u8, 0, String::new(), *id),
        };
        keyed.push(key);
    }
    keyed.sort();
    for (slot, key) in roster.iter_mut().zip(keyed) {
        *slot = key.3;
    }
    Ok(())
}
