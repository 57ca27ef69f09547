use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use loop_defence_core::{
    Command, EnemyId, EnemyTemplate, Event, UnitId, UnitKind, WaveIndex, WorldPoint,
};
use loop_defence_system_unit_targeting::UnitTargeting;
use loop_defence_world::{self as world, query, World};

const STEP: Duration = Duration::from_millis(100);

#[test]
fn deterministic_replay_tracks_the_leading_enemy() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");

    let (unit, target) = first
        .assignments
        .iter()
        .find_map(|(unit, target)| target.map(|target| (*unit, target)))
        .expect("an enemy walks into range");
    assert_eq!(unit, first.unit);
    assert_eq!(
        target, first.spawned[0],
        "closest enemy wins among enemies at the same waypoint"
    );

    let switches = first
        .assignments
        .iter()
        .filter(|(_, target)| target.is_some())
        .count();
    assert!(switches <= first.spawned.len() + 1, "targets must stick");
}

#[test]
fn idle_unit_rescans_only_after_the_stickiness_delay() {
    let mut world = World::new();
    let mut targeting = UnitTargeting::new();
    let mut events = Vec::new();
    let mut commands = Vec::new();
    world::apply(
        &mut world,
        Command::SummonUnit {
            kind: UnitKind::new(0),
        },
        &mut events,
    );

    let mut scans = Vec::new();
    for frame in 0..10 {
        world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);
        targeting.handle(
            &query::unit_view(&world),
            &query::enemy_view(&world),
            &mut commands,
        );
        for command in commands.drain(..) {
            assert!(matches!(command, Command::AssignTarget { target: None, .. }));
            scans.push(frame);
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(scans.first(), Some(&0));
    for pair in scans.windows(2) {
        assert!(pair[1] - pair[0] >= 3, "scans at frames {pair:?} ignore the delay");
    }
    assert!(scans.len() < 10);
}

#[derive(Debug, PartialEq, Eq)]
struct ReplayOutcome {
    unit: UnitId,
    spawned: Vec<EnemyId>,
    assignments: Vec<(UnitId, Option<EnemyId>)>,
    fingerprint: u64,
}

fn replay() -> ReplayOutcome {
    let mut world = World::new();
    let mut targeting = UnitTargeting::new();
    let mut events = Vec::new();
    let mut hasher = DefaultHasher::new();

    for command in scripted_commands() {
        world::apply(&mut world, command, &mut events);
    }
    let unit = events
        .iter()
        .find_map(|event| match event {
            Event::UnitSummoned { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("unit summoned");
    let spawned: Vec<EnemyId> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();

    let mut assignments = Vec::new();
    let mut commands = Vec::new();
    for _ in 0..60 {
        world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);
        world::apply(&mut world, Command::StepField { dt: STEP }, &mut events);

        targeting.handle(
            &query::unit_view(&world),
            &query::enemy_view(&world),
            &mut commands,
        );
        for command in commands.drain(..) {
            if let Command::AssignTarget { unit, target } = command {
                unit.hash(&mut hasher);
                target.hash(&mut hasher);
                assignments.push((unit, target));
            }
            world::apply(&mut world, command, &mut events);
        }
    }

    ReplayOutcome {
        unit,
        spawned,
        assignments,
        fingerprint: hasher.finish(),
    }
}

fn scripted_commands() -> Vec<Command> {
    let template = EnemyTemplate {
        hp_scale: 1.0,
        speed: 80.0,
        boss: false,
    };
    vec![
        Command::SummonUnit {
            kind: UnitKind::new(0),
        },
        Command::BeginWave {
            wave: WaveIndex::new(0),
            boss: false,
        },
        Command::SpawnEnemy {
            wave: WaveIndex::new(0),
            template,
            offset: WorldPoint::new(0.0, 0.0),
        },
        Command::SpawnEnemy {
            wave: WaveIndex::new(0),
            template,
            offset: WorldPoint::new(0.0, 30.0),
        },
    ]
}
