//! Asynchronous abstraction for sourcing participant decisions.
//!
//! The engine suspends on a [`DecisionRequest`] and never waits on anyone.
//! Runtime users plug in [`DecisionProvider`] implementations so the same
//! battle can be fought against humans, scripted fixtures, or defaults.
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use battle_core::{Decision, DecisionRequest};

use super::errors::{ProviderKind, Result, RuntimeError};

/// Answers the questions an engagement puts to one participant.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Answer any request except a casualty confirmation.
    async fn query(&self, request: &DecisionRequest) -> Result<Decision>;

    /// The hit player acknowledges its own losses.
    async fn confirm_own_casualties(&self, _request: &DecisionRequest) -> Result<()> {
        Ok(())
    }

    /// The firing player acknowledges the losses it inflicted.
    async fn confirm_enemy_casualties(&self, _request: &DecisionRequest) -> Result<()> {
        Ok(())
    }
}

/// Accepts the engine's default answer to everything.
pub struct DefaultDecisionProvider;

#[async_trait]
impl DecisionProvider for DefaultDecisionProvider {
    async fn query(&self, request: &DecisionRequest) -> Result<Decision> {
        Ok(request.default_decision())
    }
}

/// Replays prepared answers in order, then falls back to defaults.
///
/// Records every request it was asked so tests and replays can check the
/// questions as well as the answers.
#[derive(Default)]
pub struct ScriptedDecisionProvider {
    answers: Mutex<VecDeque<Decision>>,
    asked: Mutex<Vec<DecisionRequest>>,
    own_confirmations: AtomicUsize,
    enemy_confirmations: AtomicUsize,
    fail_enemy_confirmations: bool,
}

impl ScriptedDecisionProvider {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Every confirmation of enemy casualties reports a failure.
    pub fn failing_enemy_confirmations(mut self) -> Self {
        self.fail_enemy_confirmations = true;
        self
    }

    pub fn push(&self, decision: Decision) -> Result<()> {
        self.answers
            .lock()
            .map_err(|_| poisoned())?
            .push_back(decision);
        Ok(())
    }

    pub fn asked(&self) -> Vec<DecisionRequest> {
        self.asked
            .lock()
            .map(|asked| asked.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|answers| answers.len()).unwrap_or(0)
    }

    pub fn own_confirmations(&self) -> usize {
        self.own_confirmations.load(Ordering::SeqCst)
    }

    pub fn enemy_confirmations(&self) -> usize {
        self.enemy_confirmations.load(Ordering::SeqCst)
    }
}

fn poisoned() -> RuntimeError {
    RuntimeError::provider(ProviderKind::Scripted, "answer queue lock poisoned")
}

#[async_trait]
impl DecisionProvider for ScriptedDecisionProvider {
    async fn query(&self, request: &DecisionRequest) -> Result<Decision> {
        self.asked.lock().map_err(|_| poisoned())?.push(request.clone());
        let scripted = self.answers.lock().map_err(|_| poisoned())?.pop_front();
        Ok(scripted.unwrap_or_else(|| request.default_decision()))
    }

    async fn confirm_own_casualties(&self, _request: &DecisionRequest) -> Result<()> {
        self.own_confirmations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn confirm_enemy_casualties(&self, _request: &DecisionRequest) -> Result<()> {
        self.enemy_confirmations.fetch_add(1, Ordering::SeqCst);
        if self.fail_enemy_confirmations {
            return Err(RuntimeError::provider(
                ProviderKind::Scripted,
                "participant disconnected",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{BattleId, PlayerId, TerritoryId, UnitId};

    use super::*;

    fn retreat_request() -> DecisionRequest {
        DecisionRequest::Retreat {
            battle: BattleId(1),
            player: PlayerId(1),
            side: battle_core::Side::Attacker,
            units: vec![UnitId(0)],
            candidates: vec![TerritoryId(1)],
            message: "retreat?".into(),
        }
    }

    #[tokio::test]
    async fn scripted_answers_run_out_into_defaults() {
        let provider =
            ScriptedDecisionProvider::new([Decision::Retreat(Some(TerritoryId(1)))]);

        let first = provider.query(&retreat_request()).await.unwrap();
        let second = provider.query(&retreat_request()).await.unwrap();

        assert_eq!(first, Decision::Retreat(Some(TerritoryId(1))));
        assert_eq!(second, Decision::Retreat(None));
        assert_eq!(provider.asked().len(), 2);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn default_provider_stays_and_fights() {
        let decision = DefaultDecisionProvider
            .query(&retreat_request())
            .await
            .unwrap();
        assert_eq!(decision, Decision::Retreat(None));
    }
}
