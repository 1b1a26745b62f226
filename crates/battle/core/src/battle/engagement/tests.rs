use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::battle::{
    BattleEvent, BattleKind, BattleOutcome, BattleResultDescription, BattleTracker, Decision,
    DecisionRequest, FightStatus, IntegrityViolation, Route, Side, StepName, WhoWon,
};
use crate::config::BattleConfig;
use crate::env::{BattleEnv, Env, MapOracle, PcgRng, UnitCapabilities, UnitOracle, UnitTypeDef};
use crate::error::{EngineError, ErrorSeverity};
use crate::state::{BattleId, PlayerId, TerritoryId, UnitFlags, UnitId, UnitTypeId, WorldState};

const FROM: TerritoryId = TerritoryId(1);
const SITE: TerritoryId = TerritoryId(2);
const RED: PlayerId = PlayerId(1);
const BLUE: PlayerId = PlayerId(2);

struct Table(HashMap<UnitTypeId, UnitTypeDef>);

impl UnitOracle for Table {
    fn definition(&self, unit_type: &UnitTypeId) -> Option<&UnitTypeDef> {
        self.0.get(unit_type)
    }

    fn definitions(&self) -> Vec<&UnitTypeDef> {
        self.0.values().collect()
    }
}

struct Board(BTreeMap<TerritoryId, Vec<TerritoryId>>);

impl MapOracle for Board {
    fn neighbors(&self, territory: TerritoryId) -> Vec<TerritoryId> {
        self.0.get(&territory).cloned().unwrap_or_default()
    }

    fn territory_name(&self, territory: TerritoryId) -> Option<&str> {
        match territory {
            FROM => Some("Kent"),
            SITE => Some("Normandy"),
            _ => None,
        }
    }
}

struct Rules {
    units: Table,
    map: Board,
    config: BattleConfig,
}

impl Rules {
    fn new(config: BattleConfig) -> Self {
        let air = UnitCapabilities::CAN_AIR_BATTLE | UnitCapabilities::CAN_INTERCEPT;
        let defs = [
            UnitTypeDef::new("infantry").with_combat(1, 2).with_cost(3),
            UnitTypeDef::new("tank").with_combat(3, 3).with_cost(6),
            UnitTypeDef::new("battleship")
                .with_combat(4, 4)
                .with_cost(20)
                .with_hit_points(2),
            UnitTypeDef::new("bunker")
                .with_combat(1, 1)
                .with_cost(10)
                .with_hit_points(50),
            UnitTypeDef::new("fighter")
                .with_combat(3, 4)
                .with_air_combat(1, 1)
                .with_cost(10)
                .with_capabilities(air),
            UnitTypeDef::new("zeppelin")
                .with_air_combat(1, 1)
                .with_cost(8)
                .with_hit_points(20)
                .with_capabilities(air),
            UnitTypeDef::new("jet")
                .with_air_combat(2, 2)
                .with_cost(10)
                .with_capabilities(air | UnitCapabilities::REQUIRES_AIR_BASE),
            UnitTypeDef::new("bomber")
                .with_combat(4, 1)
                .with_air_combat(1, 0)
                .with_cost(12)
                .with_capabilities(
                    UnitCapabilities::STRATEGIC_BOMBER | UnitCapabilities::CAN_AIR_BATTLE,
                ),
            UnitTypeDef::new("kamikaze")
                .with_combat(6, 6)
                .with_cost(4)
                .with_capabilities(UnitCapabilities::SUICIDE),
            UnitTypeDef::new("rocket")
                .with_combat(4, 1)
                .with_air_combat(1, 0)
                .with_cost(12)
                .with_capabilities(
                    UnitCapabilities::STRATEGIC_BOMBER
                        | UnitCapabilities::CAN_AIR_BATTLE
                        | UnitCapabilities::SUICIDE,
                ),
            UnitTypeDef::new("factory")
                .with_capabilities(UnitCapabilities::CAN_BE_DAMAGED)
                .with_max_bombing_damage(20),
            UnitTypeDef::new("depot")
                .with_capabilities(UnitCapabilities::CAN_BE_DAMAGED)
                .with_max_bombing_damage(10),
            UnitTypeDef::new("raider")
                .with_combat(3, 1)
                .with_cost(10)
                .with_capabilities(UnitCapabilities::STRATEGIC_BOMBER)
                .with_bombing_targets(["factory"]),
            UnitTypeDef::new("airfield")
                .with_capabilities(UnitCapabilities::AIR_BASE)
                .with_intercept_capacity(Some(1)),
        ];
        Self {
            units: Table(defs.into_iter().map(|d| (d.id.clone(), d)).collect()),
            map: Board(BTreeMap::from([(FROM, vec![SITE]), (SITE, vec![FROM])])),
            config,
        }
    }

    fn env(&self) -> BattleEnv<'_> {
        Env::with_all(&self.units, &self.map, &self.config, &PcgRng).as_battle_env()
    }
}

fn headless() -> BattleConfig {
    BattleConfig::headless().with_seed(17)
}

fn board() -> WorldState {
    let mut world = WorldState::new();
    world.add_territory(FROM, Some(RED));
    world.add_territory(SITE, Some(BLUE));
    world
}

fn spawn(world: &mut WorldState, owner: PlayerId, unit_type: &str, count: usize) -> Vec<UnitId> {
    (0..count)
        .map(|_| world.spawn_unit(SITE, unit_type, owner).unwrap())
        .collect()
}

fn route() -> Option<Route> {
    Some(Route::new(FROM, SITE))
}

/// Fights `battle` to the end, answering every request with its default.
fn drive(
    tracker: &mut BattleTracker,
    world: &mut WorldState,
    env: BattleEnv<'_>,
    battle: BattleId,
    events: &mut Vec<BattleEvent>,
) -> BattleOutcome {
    for _ in 0..1_000 {
        match tracker.fight(battle, world, env, events).unwrap() {
            FightStatus::Concluded(outcome) => return outcome,
            FightStatus::AwaitingDecision(request) => tracker
                .provide_decision(battle, request.default_decision())
                .unwrap(),
        }
    }
    panic!("battle {battle} did not conclude");
}

fn fired(events: &[BattleEvent]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            BattleEvent::Casualties { .. }
                | BattleEvent::StepEntered {
                    step: StepName::AttackersFire | StepName::DefendersFire,
                    ..
                }
        )
    })
}

/// How many `UnitsRemoved` events name `unit`.
fn removals(events: &[BattleEvent], unit: UnitId) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(event, BattleEvent::UnitsRemoved { units, .. } if units.contains(&unit))
        })
        .count()
}

#[test]
fn empty_defence_is_an_attacker_win_without_dice() {
    let rules = Rules::new(headless());
    let mut world = board();
    let tanks = spawn(&mut world, RED, "tank", 2);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &tanks);
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

    assert_eq!(outcome.who_won, WhoWon::Attacker);
    assert_eq!(outcome.description, BattleResultDescription::WonWithoutConquering);
    assert_eq!(outcome.rounds, 1);
    assert!(!fired(&events));
    assert!(tracker.battle(battle).is_none());
    assert_eq!(tracker.records().len(), 1);
    assert_eq!(tracker.records()[0].outcome, outcome);
}

#[test]
fn unopposed_bombers_win_at_once_and_spawn_a_bombing_raid() {
    let rules = Rules::new(headless());
    let mut world = board();
    let factory = spawn(&mut world, BLUE, "factory", 1)[0];
    let bombers = spawn(&mut world, RED, "bomber", 3);
    let infantry = spawn(&mut world, RED, "infantry", 1);
    let mut tracker = BattleTracker::new();
    let normal = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &infantry);
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &bombers);
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), raid, &mut events);

    assert_eq!(outcome.who_won, WhoWon::Attacker);
    assert!(!fired(&events));
    for bomber in &bombers {
        assert!(world.unit(*bomber).unwrap().has_flag(UnitFlags::WAS_IN_AIR_BATTLE));
    }

    let bombing = tracker.pending(SITE, BattleKind::BombingRaid).unwrap();
    let follow_on = tracker.battle(bombing).unwrap();
    assert_eq!(follow_on.state().attacking_units(), bombers.as_slice());
    assert!(bombers.iter().all(|b| follow_on.bombing_target(*b) == Some(factory)));
    assert_eq!(tracker.dependencies_of(normal), vec![bombing]);
    assert!(matches!(
        tracker.fight(normal, &mut world, rules.env(), &mut events),
        Err(crate::battle::BattleError::Blocked { .. })
    ));

    let strike = drive(&mut tracker, &mut world, rules.env(), bombing, &mut events);
    assert_eq!(strike.who_won, WhoWon::Attacker);
    assert_eq!(strike.description, BattleResultDescription::Bombed);
    assert!(world.unit(factory).unwrap().bombing_damage > 0);
    assert!(!tracker.is_blocked(normal));
}

#[test]
fn round_limit_of_one_ends_in_a_stalemate() {
    let mut config = headless();
    config.land_battle_rounds = 1;
    let rules = Rules::new(config);
    let mut world = board();
    let attackers = spawn(&mut world, RED, "bunker", 1);
    let defenders = spawn(&mut world, BLUE, "bunker", 1);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &attackers);
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

    assert_eq!(outcome.who_won, WhoWon::Draw);
    assert_eq!(outcome.description, BattleResultDescription::Stalemate);
    assert_eq!(outcome.rounds, 1);
    assert!(world.contains(SITE, attackers[0]));
    assert!(world.contains(SITE, defenders[0]));
}

#[test]
fn rounds_advance_once_per_completed_round() {
    let rules = Rules::new(headless());
    let mut world = board();
    let attackers = spawn(&mut world, RED, "infantry", 4);
    spawn(&mut world, BLUE, "infantry", 3);
    let mut tracker = BattleTracker::new();
    // No route: nowhere to retreat to, so the battle runs without a single query.
    let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), None, &attackers);
    let mut events = Vec::new();

    let status = tracker
        .fight(battle, &mut world, rules.env(), &mut events)
        .unwrap();
    let FightStatus::Concluded(outcome) = status else {
        panic!("unexpected request: {status:?}");
    };

    let listings = events
        .iter()
        .filter(|event| matches!(event, BattleEvent::StepsListed { .. }))
        .count();
    assert!(outcome.rounds >= 1);
    assert_eq!(listings as u32, outcome.rounds);
    assert_ne!(outcome.who_won, WhoWon::NotFinished);
    let endings = events
        .iter()
        .filter(|event| matches!(event, BattleEvent::BattleEnded { .. }))
        .count();
    assert_eq!(endings, 1);
}

#[test]
fn casualties_never_overlap() {
    let rules = Rules::new(BattleConfig::new().with_seed(3));
    let mut world = board();
    let mut attackers = spawn(&mut world, RED, "battleship", 2);
    attackers.extend(spawn(&mut world, RED, "infantry", 3));
    spawn(&mut world, BLUE, "battleship", 1);
    spawn(&mut world, BLUE, "tank", 3);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), None, &attackers);
    let mut events = Vec::new();

    drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

    let mut notified = 0;
    for event in &events {
        if let BattleEvent::Casualties { details, .. } = event {
            let killed: BTreeSet<_> = details.killed.iter().collect();
            assert!(details.damaged.iter().all(|id| !killed.contains(id)));
            notified += 1;
        }
    }
    assert!(notified > 0);
}

#[test]
fn attacker_retreat_strips_dependents_once() {
    let mut config = headless().with_air_battle_rounds(0);
    config.air_battle_defenders_can_retreat = false;
    let rules = Rules::new(config);
    let mut world = board();
    let escort = spawn(&mut world, RED, "zeppelin", 1);
    let infantry = spawn(&mut world, RED, "infantry", 1);
    spawn(&mut world, BLUE, "zeppelin", 1);
    let mut tracker = BattleTracker::new();
    let force = [escort.clone(), infantry.clone()].concat();
    let normal = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &force);
    let air = tracker.add_battle(SITE, BattleKind::AirBattle, RED, Some(BLUE), route(), &escort);
    tracker.add_dependency(normal, air).unwrap();
    let mut events = Vec::new();

    let status = tracker
        .fight(air, &mut world, rules.env(), &mut events)
        .unwrap();
    let FightStatus::AwaitingDecision(DecisionRequest::Retreat {
        side,
        units,
        candidates,
        ..
    }) = status
    else {
        panic!("expected a retreat query, got {status:?}");
    };
    assert_eq!(side, Side::Attacker);
    assert_eq!(units, escort);
    assert_eq!(candidates, vec![SITE]);

    tracker
        .provide_decision(air, Decision::Retreat(Some(SITE)))
        .unwrap();
    let outcome = drive(&mut tracker, &mut world, rules.env(), air, &mut events);

    assert_eq!(outcome.who_won, WhoWon::Defender);
    let dependent = tracker.battle(normal).unwrap();
    assert_eq!(dependent.state().attacking_units(), infantry.as_slice());
    assert!(dependent.state().excluded().contains(&escort[0]));
    let withdrawals = events
        .iter()
        .filter_map(BattleEvent::history_text)
        .filter(|text| text.contains("withdrawn in preceding battle"))
        .count();
    assert_eq!(withdrawals, 1);
    assert!(world.unit(escort[0]).unwrap().has_flag(UnitFlags::WAS_IN_AIR_BATTLE));
    assert!(!tracker.is_blocked(normal));
}

#[test]
fn unoffered_interceptor_aborts_and_deregisters() {
    let rules = Rules::new(headless());
    let mut world = board();
    spawn(&mut world, BLUE, "fighter", 2);
    let bombers = spawn(&mut world, RED, "bomber", 1);
    let infantry = spawn(&mut world, RED, "infantry", 1);
    let mut tracker = BattleTracker::new();
    let normal = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &infantry);
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &bombers);
    tracker.add_dependency(normal, raid).unwrap();
    let mut events = Vec::new();

    let status = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap();
    assert!(matches!(
        status,
        FightStatus::AwaitingDecision(DecisionRequest::SelectInterceptors { max: None, .. })
    ));

    tracker
        .provide_decision(raid, Decision::Interceptors(bombers.clone()))
        .unwrap();
    let err = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap_err();

    assert_eq!(
        err.violation(),
        Some(&IntegrityViolation::InterceptorNotEligible(bombers[0]))
    );
    assert_eq!(err.severity(), ErrorSeverity::Fatal);
    assert!(tracker.battle(raid).is_none());
    assert!(!tracker.is_blocked(normal));
    assert!(tracker.records().is_empty());
}

#[test]
fn interceptors_beyond_air_base_capacity_are_fatal() {
    let rules = Rules::new(headless());
    let mut world = board();
    spawn(&mut world, BLUE, "airfield", 1);
    let jets = spawn(&mut world, BLUE, "jet", 2);
    let bombers = spawn(&mut world, RED, "bomber", 1);
    let mut tracker = BattleTracker::new();
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &bombers);
    let mut events = Vec::new();

    let status = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap();
    let FightStatus::AwaitingDecision(DecisionRequest::SelectInterceptors { candidates, max, .. }) =
        status
    else {
        panic!("expected an interceptor query, got {status:?}");
    };
    assert_eq!(candidates, jets);
    assert_eq!(max, Some(1));

    tracker
        .provide_decision(raid, Decision::Interceptors(jets))
        .unwrap();
    let err = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&IntegrityViolation::InterceptorCapExceeded {
            selected: 2,
            cap: 1
        })
    );
}

#[test]
fn unanswered_request_is_repeated_and_wrong_answers_are_refused() {
    let rules = Rules::new(headless());
    let mut world = board();
    spawn(&mut world, BLUE, "fighter", 1);
    let bombers = spawn(&mut world, RED, "bomber", 1);
    let mut tracker = BattleTracker::new();
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &bombers);
    let mut events = Vec::new();

    let first = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap();
    let emitted = events.len();
    let again = tracker
        .fight(raid, &mut world, rules.env(), &mut events)
        .unwrap();

    assert_eq!(first, again);
    assert_eq!(events.len(), emitted);
    assert!(matches!(
        tracker.provide_decision(raid, Decision::Acknowledged),
        Err(crate::battle::BattleError::UnexpectedDecision { .. })
    ));
    assert!(tracker.battle(raid).unwrap().state().pending_decision().is_some());
}

#[test]
fn resuming_from_a_copy_matches_an_uninterrupted_run() {
    let rules = Rules::new(BattleConfig::new().with_seed(99));
    let mut world = board();
    let mut attackers = spawn(&mut world, RED, "battleship", 1);
    attackers.extend(spawn(&mut world, RED, "tank", 2));
    attackers.extend(spawn(&mut world, RED, "infantry", 2));
    spawn(&mut world, BLUE, "infantry", 3);
    spawn(&mut world, BLUE, "tank", 1);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &attackers);

    let (mut straight_tracker, mut straight_world) = (tracker.clone(), world.clone());
    let mut straight_events = Vec::new();
    let straight = drive(
        &mut straight_tracker,
        &mut straight_world,
        rules.env(),
        battle,
        &mut straight_events,
    );

    let mut events = Vec::new();
    let resumed = loop {
        match tracker
            .fight(battle, &mut world, rules.env(), &mut events)
            .unwrap()
        {
            FightStatus::Concluded(outcome) => break outcome,
            FightStatus::AwaitingDecision(request) => {
                // Drop the live copies and carry on from clones, as a reload would.
                let (saved_tracker, saved_world) = (tracker.clone(), world.clone());
                tracker = saved_tracker;
                world = saved_world;
                tracker
                    .provide_decision(battle, request.default_decision())
                    .unwrap();
            }
        }
    };

    assert_eq!(resumed, straight);
    assert_eq!(world, straight_world);
    assert_eq!(events, straight_events);
    assert_eq!(tracker.records(), straight_tracker.records());
}

#[test]
fn voided_raid_still_sends_bombers_on() {
    let rules = Rules::new(headless());
    let mut world = board();
    let factory = spawn(&mut world, BLUE, "factory", 1)[0];
    spawn(&mut world, BLUE, "fighter", 1);
    let bombers = spawn(&mut world, RED, "bomber", 2);
    let mut tracker = BattleTracker::new();
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &bombers);
    let mut events = Vec::new();

    tracker
        .void_battle(raid, &mut world, rules.env(), &mut events)
        .unwrap();

    assert!(tracker.battle(raid).is_none());
    assert!(tracker.records().is_empty());
    let bombing = tracker.pending(SITE, BattleKind::BombingRaid).unwrap();
    let follow_on = tracker.battle(bombing).unwrap();
    assert!(bombers.iter().all(|b| follow_on.bombing_target(*b) == Some(factory)));
}

#[test]
fn sunk_carrier_takes_its_cargo_out_of_the_battle() {
    let mut cleared = 0;
    for seed in 0..40 {
        let mut config = BattleConfig::headless().with_seed(seed);
        config.land_battle_rounds = 20;
        let rules = Rules::new(config);
        let mut world = board();
        let carrier = spawn(&mut world, BLUE, "infantry", 1)[0];
        let cargo = spawn(&mut world, BLUE, "tank", 1)[0];
        world.load(carrier, cargo).unwrap();
        let ship = spawn(&mut world, RED, "battleship", 1);
        let mut tracker = BattleTracker::new();
        let battle = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), None, &ship);
        let mut events = Vec::new();

        let outcome = drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

        if world.unit(carrier).is_none() {
            assert!(world.unit(cargo).is_none(), "seed {seed}");
        }
        let blue_left = world.units_at(SITE).any(|unit| unit.owner == BLUE);
        if !blue_left && world.contains(SITE, ship[0]) {
            assert_eq!(outcome.who_won, WhoWon::Attacker, "seed {seed}");
            assert_eq!(outcome.defender_lost_value, 9, "seed {seed}");
            assert!(outcome.rounds < 20, "seed {seed}");
            cleared += 1;
        }
    }
    assert!(cleared > 0);
}

#[test]
fn undefined_unit_type_aborts_the_fight() {
    let rules = Rules::new(headless());
    let mut world = board();
    spawn(&mut world, BLUE, "infantry", 1);
    let ghosts = spawn(&mut world, RED, "ghost", 1);
    let tanks = spawn(&mut world, RED, "tank", 1);
    let mut tracker = BattleTracker::new();
    let normal = tracker.add_battle(SITE, BattleKind::Normal, RED, Some(BLUE), route(), &tanks);
    let air = tracker.add_battle(SITE, BattleKind::AirBattle, RED, Some(BLUE), route(), &ghosts);
    tracker.add_dependency(normal, air).unwrap();
    let mut events = Vec::new();

    let err = tracker
        .fight(air, &mut world, rules.env(), &mut events)
        .unwrap_err();

    assert_eq!(err.severity(), ErrorSeverity::Fatal);
    assert_eq!(err.error_code(), "BATTLE_ABORTED");
    assert!(matches!(
        err,
        crate::battle::BattleError::Aborted { battle, .. } if battle == air
    ));
    assert!(matches!(
        err.root_cause(),
        crate::battle::BattleError::Oracle(crate::env::OracleError::UnknownUnitType(_))
    ));
    assert!(tracker.battle(air).is_none());
    assert!(!tracker.is_blocked(normal));
    assert!(tracker.records().is_empty());

    let gone = tracker
        .fight(air, &mut world, rules.env(), &mut events)
        .unwrap_err();
    assert_eq!(gone.severity(), ErrorSeverity::Validation);
}

#[test]
fn suicide_units_fire_then_leave_after_the_round() {
    let mut config = headless();
    config.land_battle_rounds = 1;
    let rules = Rules::new(config);
    let mut world = board();
    let kamikaze = spawn(&mut world, RED, "kamikaze", 1)[0];
    let bunker = spawn(&mut world, RED, "bunker", 1)[0];
    spawn(&mut world, BLUE, "bunker", 1);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(
        SITE,
        BattleKind::Normal,
        RED,
        Some(BLUE),
        None,
        &[kamikaze, bunker],
    );
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

    let attack_dice = events.iter().find_map(|event| match event {
        BattleEvent::Casualties {
            step: StepName::AttackersFire,
            dice,
            ..
        } => Some(dice.clone()),
        _ => None,
    });
    let attack_dice = attack_dice.unwrap();
    assert_eq!(attack_dice.dice().len(), 2);
    assert!(attack_dice.dice().iter().any(|die| die.hit_at == 6));

    assert_eq!(outcome.who_won, WhoWon::Draw);
    assert!(world.unit(kamikaze).is_none());
    assert!(world.contains(SITE, bunker));
    assert_eq!(removals(&events, kamikaze), 1);
    assert_eq!(outcome.attacker_lost_value, 4);
}

#[test]
fn suicide_casualty_is_charged_once() {
    let rules = Rules::new(headless());
    let mut world = board();
    let kamikaze = spawn(&mut world, RED, "kamikaze", 1)[0];
    let bunker = spawn(&mut world, RED, "bunker", 1)[0];
    let defenders = spawn(&mut world, BLUE, "kamikaze", 2);
    let mut tracker = BattleTracker::new();
    let battle = tracker.add_battle(
        SITE,
        BattleKind::Normal,
        RED,
        Some(BLUE),
        None,
        &[kamikaze, bunker],
    );
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), battle, &mut events);

    // Both defenders always hit: one damages the bunker, one kills the kamikaze.
    let killed_by_defence = events.iter().any(|event| {
        matches!(
            event,
            BattleEvent::Casualties { step: StepName::DefendersFire, details, .. }
                if details.killed == vec![kamikaze]
        )
    });
    assert!(killed_by_defence);
    assert_eq!(removals(&events, kamikaze), 1);
    assert_eq!(outcome.attacker_lost_value, 4);
    for defender in &defenders {
        assert_eq!(removals(&events, *defender), 1);
        assert!(world.unit(*defender).is_none());
    }
    assert_eq!(outcome.defender_lost_value, 8);
    assert_eq!(outcome.who_won, WhoWon::Attacker);
    assert_eq!(outcome.rounds, 1);
    assert!(world.contains(SITE, bunker));
}

#[test]
fn raid_bombers_are_spared_the_suicide_cleanup() {
    let rules = Rules::new(headless().with_air_battle_rounds(1));
    let mut world = board();
    spawn(&mut world, BLUE, "factory", 1);
    spawn(&mut world, BLUE, "zeppelin", 1);
    let rockets = spawn(&mut world, RED, "rocket", 2);
    let mut tracker = BattleTracker::new();
    let raid = tracker.add_battle(SITE, BattleKind::AirRaid, RED, Some(BLUE), route(), &rockets);
    let mut events = Vec::new();

    let outcome = drive(&mut tracker, &mut world, rules.env(), raid, &mut events);

    assert_eq!(outcome.who_won, WhoWon::Attacker);
    let survivors: BTreeSet<UnitId> = rockets
        .iter()
        .copied()
        .filter(|id| world.contains(SITE, *id))
        .collect();
    // One defending die can bring down one rocket at most.
    assert!(!survivors.is_empty());
    assert_eq!(outcome.attacker_lost_value, 12 * (2 - survivors.len() as u32));
    for rocket in &survivors {
        assert_eq!(removals(&events, *rocket), 0);
    }

    let bombing = tracker.pending(SITE, BattleKind::BombingRaid).unwrap();
    let follow_on: BTreeSet<UnitId> = tracker
        .battle(bombing)
        .unwrap()
        .state()
        .attacking_units()
        .iter()
        .copied()
        .collect();
    assert_eq!(follow_on, survivors);
}

#[test]
fn each_bomber_picks_from_its_own_targets() {
    let rules = Rules::new(headless());
    let mut world = board();
    let depot = spawn(&mut world, BLUE, "depot", 1)[0];
    let factory = spawn(&mut world, BLUE, "factory", 1)[0];
    let bomber = spawn(&mut world, RED, "bomber", 1)[0];
    let raider = spawn(&mut world, RED, "raider", 1)[0];
    let mut tracker = BattleTracker::new();
    let raid = tracker.add_battle(
        SITE,
        BattleKind::AirRaid,
        RED,
        Some(BLUE),
        route(),
        &[bomber, raider],
    );
    let mut events = Vec::new();

    drive(&mut tracker, &mut world, rules.env(), raid, &mut events);

    let bombing = tracker.pending(SITE, BattleKind::BombingRaid).unwrap();
    let follow_on = tracker.battle(bombing).unwrap();
    assert_eq!(follow_on.bombing_target(bomber), Some(depot));
    assert_eq!(follow_on.bombing_target(raider), Some(factory));

    drive(&mut tracker, &mut world, rules.env(), bombing, &mut events);
    assert!(world.unit(depot).unwrap().bombing_damage > 0);
    assert!(world.unit(factory).unwrap().bombing_damage > 0);
}
