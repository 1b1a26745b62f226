use std::collections::BTreeSet;

use crate::battle::IntegrityViolation;
use crate::env::{OracleError, UnitOracle};
use crate::state::{Unit, UnitId};

/// Units chosen to absorb one side's hits.
///
/// `killed` and `damaged` are disjoint and both drawn from the roster that was
/// fired upon. A damaged unit absorbs exactly one hit and survives; killing a
/// unit consumes all of its remaining hit points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CasualtyDetails {
    pub killed: Vec<UnitId>,
    pub damaged: Vec<UnitId>,
}

impl CasualtyDetails {
    pub fn new(killed: Vec<UnitId>, damaged: Vec<UnitId>) -> Self {
        Self { killed, damaged }
    }

    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }
}

struct Candidate<'a> {
    unit: &'a Unit,
    remaining: u32,
    cost: u32,
}

fn candidates<'a, U>(
    roster: &[&'a Unit],
    pending_removal: &BTreeSet<UnitId>,
    units: &U,
) -> Result<Vec<Candidate<'a>>, OracleError>
where
    U: UnitOracle + ?Sized,
{
    roster
        .iter()
        .filter(|unit| !pending_removal.contains(&unit.id))
        .map(|unit| {
            let def = units.require(&unit.unit_type)?;
            Ok(Candidate {
                unit,
                remaining: def.remaining_hit_points(unit),
                cost: def.cost,
            })
        })
        .collect()
}

/// Default allocation of `hits` against `roster`.
///
/// `roster` is expected in canonical order. Hits first go to multi-hit units
/// as damage (one each), then kill the cheapest undamaged units, then finish
/// off damaged units if hits remain. Units already pending removal are
/// ignored. Never consumes more hit points than `hits`.
pub fn select_casualties<U>(
    hits: u32,
    roster: &[&Unit],
    pending_removal: &BTreeSet<UnitId>,
    units: &U,
) -> Result<CasualtyDetails, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let eligible = candidates(roster, pending_removal, units)?;
    if hits == 0 || eligible.is_empty() {
        return Ok(CasualtyDetails::default());
    }

    let total: u32 = eligible.iter().map(|c| c.remaining).sum();
    if hits >= total {
        return Ok(CasualtyDetails::new(
            eligible.iter().map(|c| c.unit.id).collect(),
            Vec::new(),
        ));
    }

    let mut remaining = hits;
    let mut damaged = Vec::new();
    for candidate in &eligible {
        if remaining == 0 {
            break;
        }
        if candidate.remaining > 1 {
            damaged.push(candidate.unit.id);
            remaining -= 1;
        }
    }

    let mut by_cost: Vec<&Candidate<'_>> = eligible
        .iter()
        .filter(|c| !damaged.contains(&c.unit.id))
        .collect();
    by_cost.sort_by_key(|c| c.cost);

    let mut killed = Vec::new();
    for candidate in by_cost {
        if remaining == 0 {
            break;
        }
        killed.push(candidate.unit.id);
        remaining -= 1;
    }

    while remaining > 0 {
        let Some(id) = damaged.pop() else { break };
        let needed = eligible
            .iter()
            .find(|c| c.unit.id == id)
            .map(|c| c.remaining - 1)
            .unwrap_or(0);
        if needed > remaining {
            damaged.push(id);
            break;
        }
        killed.push(id);
        remaining -= needed;
    }

    Ok(CasualtyDetails::new(killed, damaged))
}

/// Hit points a selection uses up against `roster`.
pub fn hit_points_consumed<U>(
    details: &CasualtyDetails,
    roster: &[&Unit],
    units: &U,
) -> Result<u32, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let mut consumed = details.damaged.len() as u32;
    for id in &details.killed {
        if let Some(unit) = roster.iter().find(|u| u.id == *id) {
            consumed += units.require(&unit.unit_type)?.remaining_hit_points(unit);
        }
    }
    Ok(consumed)
}

/// Whether the hit player gets a say: more than one unit type is exposed and
/// the hits do not simply destroy everything.
pub fn needs_player_selection<U>(
    hits: u32,
    roster: &[&Unit],
    pending_removal: &BTreeSet<UnitId>,
    units: &U,
) -> Result<bool, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let eligible = candidates(roster, pending_removal, units)?;
    let total: u32 = eligible.iter().map(|c| c.remaining).sum();
    let types: BTreeSet<&str> = eligible.iter().map(|c| c.unit.unit_type.as_str()).collect();
    Ok(hits > 0 && hits < total && types.len() > 1)
}

/// Checks a participant-chosen selection.
///
/// Returns `Ok(None)` when the selection is legal. A legal selection only
/// names eligible units, names each at most once, damages only units that can
/// absorb a hit, consumes no more hit points than `hits`, and consumes at
/// least as many as the default allocation would.
pub fn validate_casualties<U>(
    details: &CasualtyDetails,
    hits: u32,
    roster: &[&Unit],
    pending_removal: &BTreeSet<UnitId>,
    units: &U,
) -> Result<Option<IntegrityViolation>, OracleError>
where
    U: UnitOracle + ?Sized,
{
    let eligible = candidates(roster, pending_removal, units)?;
    let mut seen = BTreeSet::new();
    for id in details.killed.iter().chain(&details.damaged) {
        if !eligible.iter().any(|c| c.unit.id == *id) {
            return Ok(Some(IntegrityViolation::CasualtyNotInRoster(*id)));
        }
        if !seen.insert(*id) {
            return Ok(Some(IntegrityViolation::CasualtyListedTwice(*id)));
        }
    }
    for id in &details.damaged {
        if eligible
            .iter()
            .any(|c| c.unit.id == *id && c.remaining <= 1)
        {
            return Ok(Some(IntegrityViolation::CasualtyCannotAbsorb(*id)));
        }
    }

    let consumed = hit_points_consumed(details, roster, units)?;
    if consumed > hits {
        return Ok(Some(IntegrityViolation::CasualtiesExceedHits { consumed, hits }));
    }
    let default = select_casualties(hits, roster, pending_removal, units)?;
    let required = hit_points_consumed(&default, roster, units)?;
    if consumed < required {
        return Ok(Some(IntegrityViolation::CasualtiesUnderAllocated {
            consumed,
            required,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;
    use crate::env::UnitTypeDef;
    use crate::state::{PlayerId, UnitTypeId};

    struct Table(HashMap<UnitTypeId, UnitTypeDef>);

    impl UnitOracle for Table {
        fn definition(&self, unit_type: &UnitTypeId) -> Option<&UnitTypeDef> {
            self.0.get(unit_type)
        }

        fn definitions(&self) -> Vec<&UnitTypeDef> {
            self.0.values().collect()
        }
    }

    fn table() -> Table {
        let defs = [
            UnitTypeDef::new("infantry").with_combat(1, 2).with_cost(3),
            UnitTypeDef::new("tank").with_combat(3, 3).with_cost(6),
            UnitTypeDef::new("battleship")
                .with_combat(4, 4)
                .with_cost(20)
                .with_hit_points(2),
        ];
        Table(defs.into_iter().map(|d| (d.id.clone(), d)).collect())
    }

    fn roster(types: &[&str]) -> Vec<Unit> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| Unit::new(UnitId(i as u32), UnitTypeId::from(*t), PlayerId(2)))
            .collect()
    }

    #[test]
    fn kills_cheapest_first() {
        let units = roster(&["tank", "infantry", "tank"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let details = select_casualties(1, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(details.killed, vec![UnitId(1)]);
        assert!(details.damaged.is_empty());
    }

    #[test]
    fn multi_hit_units_soak_damage_first() {
        let units = roster(&["infantry", "battleship"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let details = select_casualties(1, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(details.damaged, vec![UnitId(1)]);
        assert!(details.killed.is_empty());

        let details = select_casualties(2, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(details.damaged, vec![UnitId(1)]);
        assert_eq!(details.killed, vec![UnitId(0)]);
    }

    #[test]
    fn overwhelming_hits_kill_everything() {
        let units = roster(&["infantry", "battleship"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let details = select_casualties(5, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(details.killed, vec![UnitId(0), UnitId(1)]);
        assert!(details.damaged.is_empty());
    }

    #[test]
    fn pending_removal_is_not_selected_again() {
        let units = roster(&["infantry", "tank"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let pending = BTreeSet::from([UnitId(0)]);
        let details = select_casualties(1, &refs, &pending, &table()).unwrap();
        assert_eq!(details.killed, vec![UnitId(1)]);
    }

    #[test]
    fn selection_is_only_offered_when_it_matters() {
        let mixed = roster(&["infantry", "tank"]);
        let refs: Vec<&Unit> = mixed.iter().collect();
        assert!(needs_player_selection(1, &refs, &BTreeSet::new(), &table()).unwrap());
        assert!(!needs_player_selection(2, &refs, &BTreeSet::new(), &table()).unwrap());

        let uniform = roster(&["infantry", "infantry"]);
        let refs: Vec<&Unit> = uniform.iter().collect();
        assert!(!needs_player_selection(1, &refs, &BTreeSet::new(), &table()).unwrap());
    }

    #[test]
    fn rejects_units_outside_the_roster() {
        let units = roster(&["infantry", "tank"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let choice = CasualtyDetails::new(vec![UnitId(9)], vec![]);
        let violation = validate_casualties(&choice, 1, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(violation, Some(IntegrityViolation::CasualtyNotInRoster(UnitId(9))));
    }

    #[test]
    fn rejects_more_deaths_than_hits() {
        let units = roster(&["infantry", "tank"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let choice = CasualtyDetails::new(vec![UnitId(0), UnitId(1)], vec![]);
        let violation = validate_casualties(&choice, 1, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(
            violation,
            Some(IntegrityViolation::CasualtiesExceedHits {
                consumed: 2,
                hits: 1
            })
        );
    }

    #[test]
    fn accepts_a_different_but_complete_choice() {
        let units = roster(&["infantry", "tank"]);
        let refs: Vec<&Unit> = units.iter().collect();
        let choice = CasualtyDetails::new(vec![UnitId(1)], vec![]);
        let violation = validate_casualties(&choice, 1, &refs, &BTreeSet::new(), &table()).unwrap();
        assert_eq!(violation, None);
    }

    fn arb_roster() -> impl Strategy<Value = Vec<Unit>> {
        prop::collection::vec(
            prop::sample::select(vec!["infantry", "tank", "battleship"]),
            0..12,
        )
        .prop_map(|types| roster(&types))
    }

    proptest! {
        #[test]
        fn default_selection_is_a_disjoint_subset(
            units in arb_roster(),
            hits in 0u32..20,
            pending_mask in prop::collection::vec(any::<bool>(), 12),
        ) {
            let refs: Vec<&Unit> = units.iter().collect();
            let pending: BTreeSet<UnitId> = units
                .iter()
                .zip(&pending_mask)
                .filter(|(_, p)| **p)
                .map(|(u, _)| u.id)
                .collect();
            let details = select_casualties(hits, &refs, &pending, &table()).unwrap();

            let killed: BTreeSet<UnitId> = details.killed.iter().copied().collect();
            let damaged: BTreeSet<UnitId> = details.damaged.iter().copied().collect();
            prop_assert_eq!(killed.len(), details.killed.len());
            prop_assert_eq!(damaged.len(), details.damaged.len());
            prop_assert!(killed.is_disjoint(&damaged));
            for id in killed.iter().chain(&damaged) {
                prop_assert!(units.iter().any(|u| u.id == *id));
                prop_assert!(!pending.contains(id));
            }
            let consumed = hit_points_consumed(&details, &refs, &table()).unwrap();
            prop_assert!(consumed <= hits);
            prop_assert!(details.killed.len() as u32 <= hits);
            prop_assert_eq!(
                validate_casualties(&details, hits, &refs, &pending, &table()).unwrap(),
                None
            );
        }
    }
}
