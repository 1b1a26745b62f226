mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use battle_core::{
    BattleConfig, BattleKind, Decision, DecisionKind, DecisionRequest, FightStatus, Route,
};
use battle_runtime::{
    DecisionEvent, DecisionProvider, Event, ProviderKind, Result, Runtime, RuntimeHandle,
    ScriptedDecisionProvider, Topic, TrackerEvent,
};
use common::*;

async fn runtime_with(
    config: BattleConfig,
    world: battle_core::WorldState,
    red: Arc<dyn DecisionProvider>,
    blue: Arc<dyn DecisionProvider>,
) -> Runtime {
    let runtime = Runtime::builder()
        .oracles(oracles(config))
        .world(world)
        .build()
        .await
        .expect("runtime should build");
    runtime.register_provider(ProviderKind::Remote(1), red).await;
    runtime.register_provider(ProviderKind::Remote(2), blue).await;
    runtime.bind_player(RED, ProviderKind::Remote(1)).await;
    runtime.bind_player(BLUE, ProviderKind::Remote(2)).await;
    runtime
}

#[tokio::test]
async fn both_sides_confirm_every_casualty_notification() {
    let (world, route, tanks) = siege();
    let red = Arc::new(ScriptedDecisionProvider::default());
    let blue = Arc::new(ScriptedDecisionProvider::default());
    let runtime = runtime_with(interactive_rules(), world, red.clone(), blue.clone()).await;

    let battle = runtime
        .handle()
        .declare_attack(route, RED, tanks, false)
        .await
        .expect("attack should register");
    let outcome = runtime.fight(battle).await.expect("battle should conclude");

    assert!(outcome.rounds >= 1 && outcome.rounds <= 3);
    let own = red.own_confirmations() + blue.own_confirmations();
    let enemy = red.enemy_confirmations() + blue.enemy_confirmations();
    assert!(own >= 2, "each side fires at least once");
    assert_eq!(own, enemy);

    assert!(
        red.asked()
            .iter()
            .any(|request| request.kind() == DecisionKind::Retreat)
    );
    assert!(
        blue.asked()
            .iter()
            .all(|request| request.kind() != DecisionKind::Retreat),
        "defenders of a land battle are never offered a retreat"
    );

    let records = runtime.handle().records().await.expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, outcome);
    assert!(runtime.handle().battles().await.expect("battles").is_empty());

    runtime.shutdown().await.expect("worker should stop");
}

#[tokio::test]
async fn failed_confirmation_is_reported_but_not_fatal() {
    let (world, route, tanks) = siege();
    let red = Arc::new(ScriptedDecisionProvider::default().failing_enemy_confirmations());
    let blue = Arc::new(ScriptedDecisionProvider::default().failing_enemy_confirmations());
    let runtime = runtime_with(interactive_rules(), world, red.clone(), blue.clone()).await;
    let mut decisions = runtime.handle().subscribe(Topic::Decision).await;

    let battle = runtime
        .handle()
        .declare_attack(route, RED, tanks, false)
        .await
        .expect("attack should register");
    runtime.fight(battle).await.expect("battle should still conclude");

    let mut failures = 0;
    while let Ok(event) = decisions.try_recv() {
        if let Event::Decision(DecisionEvent::ConfirmationFailed { battle: id, .. }) = event {
            assert_eq!(id, battle);
            failures += 1;
        }
    }
    assert_eq!(failures, red.enemy_confirmations() + blue.enemy_confirmations());
    assert!(failures >= 2);
}

/// Answers retreat questions only after inspecting the runtime through its
/// own handle, which must not deadlock while the battle is suspended.
struct Inspector {
    handle: RuntimeHandle,
    inspections: AtomicUsize,
}

#[async_trait]
impl DecisionProvider for Inspector {
    async fn query(&self, request: &DecisionRequest) -> Result<Decision> {
        let battles = self.handle.battles().await?;
        let summary = battles
            .iter()
            .find(|summary| summary.id == request.battle())
            .expect("suspended battle stays registered");
        assert_eq!(summary.pending, Some(request.kind()));
        self.handle.query_world().await?;
        self.inspections.fetch_add(1, Ordering::SeqCst);
        Ok(request.default_decision())
    }
}

#[tokio::test]
async fn providers_may_call_back_into_the_runtime() {
    let (world, route, tanks) = siege();
    let runtime = Runtime::builder()
        .oracles(oracles(interactive_rules()))
        .world(world)
        .build()
        .await
        .expect("runtime should build");
    let inspector = Arc::new(Inspector {
        handle: runtime.handle(),
        inspections: AtomicUsize::new(0),
    });
    runtime
        .register_provider(ProviderKind::Remote(1), inspector.clone())
        .await;
    runtime.bind_player(RED, ProviderKind::Remote(1)).await;

    let battle = runtime
        .handle()
        .declare_attack(route, RED, tanks, false)
        .await
        .expect("attack should register");
    runtime.fight(battle).await.expect("battle should conclude");

    assert!(inspector.inspections.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn fight_all_clears_independent_sites() {
    let mut world = world();
    let west = spawn(&mut world, NORMANDY, "tank", RED, 3);
    spawn(&mut world, NORMANDY, "infantry", BLUE, 1);
    let east = spawn(&mut world, PICARDY, "tank", RED, 2);
    let rules = BattleConfig::headless().with_seed(5);
    let runtime = Runtime::builder()
        .oracles(oracles(rules))
        .world(world)
        .build()
        .await
        .expect("runtime should build");
    let mut tracker_rx = runtime.handle().subscribe(Topic::Tracker).await;

    let handle = runtime.handle();
    handle
        .declare_attack(Route::new(KENT, NORMANDY), RED, west, false)
        .await
        .expect("west attack");
    handle
        .declare_attack(Route::new(NORMANDY, PICARDY), RED, east, false)
        .await
        .expect("east attack");
    assert_eq!(handle.unblocked().await.expect("unblocked").len(), 2);

    let outcomes = runtime.fight_all().await.expect("every battle resolves");
    assert_eq!(outcomes.len(), 2);
    assert!(handle.battles().await.expect("battles").is_empty());

    let mut declared = 0;
    let mut concluded = 0;
    while let Ok(event) = tracker_rx.try_recv() {
        match event {
            Event::Tracker(TrackerEvent::Declared { kind, .. }) => {
                assert_eq!(kind, BattleKind::Normal);
                declared += 1;
            }
            Event::Tracker(TrackerEvent::Concluded { .. }) => concluded += 1,
            _ => {}
        }
    }
    assert_eq!((declared, concluded), (2, 2));
}

#[tokio::test]
async fn fight_all_skips_a_battle_that_aborts_mid_fight() {
    let mut world = world();
    let west = spawn(&mut world, NORMANDY, "tank", RED, 3);
    spawn(&mut world, NORMANDY, "infantry", BLUE, 1);
    let east = spawn(&mut world, PICARDY, "tank", RED, 1);
    // Not in the unit tables: the fight fails as soon as the rosters are built.
    spawn(&mut world, PICARDY, "ghost", BLUE, 1);
    let runtime = Runtime::builder()
        .oracles(oracles(BattleConfig::headless().with_seed(5)))
        .world(world)
        .build()
        .await
        .expect("runtime should build");
    let mut tracker_rx = runtime.handle().subscribe(Topic::Tracker).await;

    let handle = runtime.handle();
    handle
        .declare_attack(Route::new(KENT, NORMANDY), RED, west, false)
        .await
        .expect("west attack");
    let doomed = handle
        .declare_attack(Route::new(NORMANDY, PICARDY), RED, east, false)
        .await
        .expect("east attack");

    let outcomes = runtime.fight_all().await.expect("the abort is skipped");
    assert_eq!(outcomes.len(), 1);
    assert!(handle.battles().await.expect("battles").is_empty());
    assert_eq!(handle.records().await.expect("records").len(), 1);

    let mut aborted = Vec::new();
    while let Ok(event) = tracker_rx.try_recv() {
        if let Event::Tracker(TrackerEvent::Aborted { battle, .. }) = event {
            aborted.push(battle);
        }
    }
    assert_eq!(aborted, vec![doomed]);
}

#[tokio::test]
async fn worker_refuses_a_blocked_battle() {
    let mut world = world();
    let tanks = spawn(&mut world, NORMANDY, "tank", RED, 1);
    spawn(&mut world, NORMANDY, "infantry", BLUE, 1);
    let more = spawn(&mut world, PICARDY, "tank", RED, 1);
    let rules = BattleConfig {
        attackers_can_retreat: false,
        ..BattleConfig::headless()
    };
    let runtime = Runtime::builder()
        .oracles(oracles(rules))
        .world(world)
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();

    let first = handle
        .declare_attack(Route::new(KENT, NORMANDY), RED, tanks, false)
        .await
        .expect("first attack");
    let second = handle
        .declare_attack(Route::new(NORMANDY, PICARDY), RED, more, false)
        .await
        .expect("second attack");
    handle
        .add_dependency(second, first)
        .await
        .expect("dependency is acyclic");

    let err = handle
        .fight(second)
        .await
        .expect_err("blocked battle cannot be fought");
    assert!(!err.aborted_battle());

    assert!(matches!(
        handle.fight(first).await.expect("first battle fights"),
        FightStatus::Concluded(_)
    ));
    assert!(matches!(
        handle.fight(second).await.expect("now unblocked"),
        FightStatus::Concluded(_)
    ));
}
