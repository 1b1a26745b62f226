//! Drives engagements to completion by routing their questions.
//!
//! The worker hands back a [`DecisionRequest`] whenever an engagement
//! suspends. The driver asks the provider bound to the addressed player,
//! returns the answer, and fights again. Casualty confirmations go to both
//! sides at once: the firing player's acknowledgement runs as its own task
//! while the hit player's is awaited, so neither side waits on the other.

use std::collections::BTreeSet;
use std::sync::Arc;

use battle_core::{BattleId, BattleOutcome, Decision, DecisionRequest, FightStatus, PlayerId};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::{DecisionProvider, ProviderRegistry, Result, RuntimeError, RuntimeHandle};
use crate::events::{DecisionEvent, Event};

#[derive(Clone)]
pub struct BattleDriver {
    handle: RuntimeHandle,
    providers: Arc<RwLock<ProviderRegistry>>,
}

impl BattleDriver {
    pub(crate) fn new(handle: RuntimeHandle, providers: Arc<RwLock<ProviderRegistry>>) -> Self {
        Self { handle, providers }
    }

    pub fn providers(&self) -> &Arc<RwLock<ProviderRegistry>> {
        &self.providers
    }

    /// Fight `battle` until it concludes, answering every request on the way.
    ///
    /// A provider failure leaves the battle suspended on the same request;
    /// fighting it again re-issues that request.
    pub async fn fight(&self, battle: BattleId) -> Result<BattleOutcome> {
        loop {
            match self.handle.fight(battle).await? {
                FightStatus::Concluded(outcome) => return Ok(outcome),
                FightStatus::AwaitingDecision(request) => {
                    let decision = self.decide(&request).await?;
                    let kind = decision.kind();
                    self.handle.provide_decision(battle, decision).await?;
                    self.publish(DecisionEvent::Answered { battle, kind });
                }
            }
        }
    }

    /// Fight every unblocked battle until none remain.
    ///
    /// Each wave fights at most one battle per site, different sites
    /// concurrently. A battle the engine aborts is logged and skipped; any
    /// other error stops the run.
    pub async fn fight_all(&self) -> Result<Vec<BattleOutcome>> {
        let mut outcomes = Vec::new();
        loop {
            let ready = self.handle.unblocked().await?;
            if ready.is_empty() {
                break;
            }

            let mut sites = BTreeSet::new();
            let mut wave = JoinSet::new();
            for summary in ready {
                if !sites.insert(summary.site) {
                    continue;
                }
                let driver = self.clone();
                wave.spawn(async move { (summary.id, driver.fight(summary.id).await) });
            }
            debug!(target: "runtime::driver", battles = wave.len(), "fighting wave");

            while let Some(joined) = wave.join_next().await {
                let (battle, result) = joined.map_err(RuntimeError::WorkerJoin)?;
                match result {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) if err.aborted_battle() => {
                        warn!(
                            target: "runtime::driver",
                            battle = %battle,
                            severity = err.severity().as_str(),
                            error = %err,
                            "skipping aborted battle"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(outcomes)
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<Decision> {
        self.publish(DecisionEvent::Requested {
            battle: request.battle(),
            kind: request.kind(),
            player: request.player(),
        });
        debug!(
            target: "runtime::driver",
            battle = %request.battle(),
            kind = ?request.kind(),
            player = %request.player(),
            "routing decision"
        );

        if let DecisionRequest::ConfirmCasualties {
            hit_player,
            firing_player,
            ..
        } = request
        {
            self.confirm_casualties(request, *hit_player, *firing_player)
                .await?;
            return Ok(Decision::Acknowledged);
        }

        self.provider_for(request.player()).await?.query(request).await
    }

    async fn confirm_casualties(
        &self,
        request: &DecisionRequest,
        hit_player: PlayerId,
        firing_player: PlayerId,
    ) -> Result<()> {
        let own = self.provider_for(hit_player).await?;
        let enemy = self.provider_for(firing_player).await?;

        let enemy_request = request.clone();
        let enemy_task =
            tokio::spawn(async move { enemy.confirm_enemy_casualties(&enemy_request).await });

        if let Err(err) = own.confirm_own_casualties(request).await {
            self.confirmation_failed(request.battle(), hit_player, &err);
        }
        match enemy_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.confirmation_failed(request.battle(), firing_player, &err),
            Err(join) => self.confirmation_failed(
                request.battle(),
                firing_player,
                &RuntimeError::WorkerJoin(join),
            ),
        }
        Ok(())
    }

    fn confirmation_failed(&self, battle: BattleId, player: PlayerId, err: &RuntimeError) {
        warn!(
            target: "runtime::driver",
            battle = %battle,
            player = %player,
            error = %err,
            "casualty confirmation failed"
        );
        self.publish(DecisionEvent::ConfirmationFailed {
            battle,
            player,
            error: err.to_string(),
        });
    }

    async fn provider_for(&self, player: PlayerId) -> Result<Arc<dyn DecisionProvider>> {
        self.providers.read().await.get_for_player(player)
    }

    fn publish(&self, event: DecisionEvent) {
        self.handle.event_bus().publish(Event::Decision(event));
    }
}
