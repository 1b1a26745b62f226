use crate::state::UnitId;

use super::engagement::StepScope;
use super::stack::{ExecutionStack, Executable, StepControl};
use super::{BattleError, DecisionRequest, Side};

/// One resumable piece of engagement logic.
///
/// Steps hold only identifiers; everything they work on lives in the
/// engagement state, so a persisted stack resumes exactly where it stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Step {
    /// Round one of an air kind: the defender commits interceptors.
    LaunchInterceptors,
    /// Expands into roll, casualty selection, and notification.
    Fire(Side),
    RollDice(Side),
    SelectCasualties(Side),
    NotifyCasualties(Side),
    /// Applies the round's deaths, then suicide cleanup.
    RemoveCasualties,
    /// Follow-on consequences once the engagement is finished.
    MakeBattle,
    SpawnBombingRaid(UnitId),
    LinkBombingRaid,
    Bombard,
    EndIfFinished,
    Retreat(Side),
    /// Advances the round and schedules the next one.
    NextRound,
    FightLoop,
}

impl<'s, 'a, 'e> Executable<StepScope<'s, 'a, 'e>> for Step {
    type Request = DecisionRequest;
    type Error = BattleError;

    fn execute(
        &mut self,
        stack: &mut ExecutionStack<Self>,
        scope: &mut StepScope<'s, 'a, 'e>,
    ) -> Result<StepControl<DecisionRequest>, BattleError> {
        match *self {
            Step::LaunchInterceptors => scope.launch_interceptors(),
            Step::Fire(side) => scope.fire(side, stack),
            Step::RollDice(side) => scope.roll_dice(side),
            Step::SelectCasualties(side) => scope.select_casualties(side),
            Step::NotifyCasualties(side) => scope.notify_casualties(side),
            Step::RemoveCasualties => scope.remove_casualties(),
            Step::MakeBattle => scope.make_battle(stack),
            Step::SpawnBombingRaid(bomber) => scope.spawn_bombing_raid(bomber),
            Step::LinkBombingRaid => scope.link_bombing_raid(),
            Step::Bombard => scope.bombard(),
            Step::EndIfFinished => scope.end_if_finished(),
            Step::Retreat(side) => scope.retreat_query(side),
            Step::NextRound => scope.next_round(stack),
            Step::FightLoop => scope.fight_loop(stack),
        }
    }
}
