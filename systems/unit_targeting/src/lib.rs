#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic unit targets from world snapshots.
//!
//! A unit holds on to its target while that enemy is alive and in range. Once
//! the target is lost and the unit's stickiness delay has elapsed, the system
//! picks the in-range enemy furthest along the loop. Every such scan restarts
//! the delay, including one that finds nothing.

use loop_defence_core::{
    Command, EnemyId, EnemySnapshot, EnemyView, Lifecycle, UnitView, WorldPoint,
};

/// Unit targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct UnitTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl UnitTargeting {
    /// Creates a new unit targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::AssignTarget` for every unit that scans for a new target.
    pub fn handle(&mut self, units: &UnitView, enemies: &EnemyView, out: &mut Vec<Command>) {
        if units.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for unit in units.iter() {
            if unit.cell.is_none() {
                continue;
            }

            let holds_target = unit
                .target
                .and_then(|target| enemies.get(target))
                .is_some_and(|enemy| in_range(unit.position, unit.range, enemy));
            if holds_target || !unit.retarget_ready {
                continue;
            }

            out.push(Command::AssignTarget {
                unit: unit.id,
                target: self.select(unit.position, unit.range),
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());
        self.enemy_workspace
            .extend(enemies.iter().map(|enemy| EnemyCandidate {
                id: enemy.id,
                position: enemy.position,
                waypoint_index: enemy.waypoint_index,
            }));
    }

    fn select(&self, origin: WorldPoint, range: f32) -> Option<EnemyId> {
        let mut best: Option<BestCandidate> = None;

        for candidate in &self.enemy_workspace {
            let distance = origin.distance(candidate.position);
            if distance > range {
                continue;
            }

            let current = BestCandidate {
                waypoint_index: candidate.waypoint_index,
                distance,
                enemy: candidate.id,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.enemy)
    }
}

impl Lifecycle for UnitTargeting {
    fn initialize(&mut self) {
        self.enemy_workspace.clear();
    }

    fn teardown(&mut self) {
        self.enemy_workspace = Vec::new();
    }
}

fn in_range(origin: WorldPoint, range: f32, enemy: &EnemySnapshot) -> bool {
    origin.distance(enemy.position) <= range
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: WorldPoint,
    waypoint_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    waypoint_index: usize,
    distance: f32,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.waypoint_index != other.waypoint_index {
            return self.waypoint_index > other.waypoint_index;
        }

        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        self.enemy < other.enemy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_defence_core::{CellCoord, Tier, UnitId, UnitKind, UnitSnapshot};

    fn unit(id: u32, target: Option<u32>, retarget_ready: bool) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: UnitKind::new(0),
            tier: Tier::Normal,
            level: 1,
            attack: 30,
            range: 100.0,
            cell: Some(CellCoord::new(0, 0)),
            position: WorldPoint::new(0.0, 0.0),
            target: target.map(EnemyId::new),
            retarget_ready,
            attack_ready: false,
            skills: Vec::new(),
        }
    }

    fn enemy(id: u32, x: f32, waypoint_index: usize) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            position: WorldPoint::new(x, 0.0),
            waypoint_index,
            hp: 100,
            max_hp: 100,
            boss: false,
        }
    }

    fn run(units: Vec<UnitSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<Command> {
        let mut system = UnitTargeting::new();
        let mut out = Vec::new();
        system.handle(
            &UnitView::from_snapshots(units),
            &EnemyView::from_snapshots(enemies),
            &mut out,
        );
        out
    }

    #[test]
    fn furthest_along_the_loop_wins() {
        let out = run(
            vec![unit(1, None, true)],
            vec![enemy(1, 10.0, 0), enemy(2, 90.0, 2), enemy(3, 40.0, 1)],
        );
        assert_eq!(
            out,
            vec![Command::AssignTarget {
                unit: UnitId::new(1),
                target: Some(EnemyId::new(2)),
            }]
        );
    }

    #[test]
    fn ties_break_on_distance_then_id() {
        let out = run(
            vec![unit(1, None, true), unit(2, None, true)],
            vec![enemy(7, 50.0, 1), enemy(4, 20.0, 1), enemy(3, 20.0, 1)],
        );
        assert_eq!(
            out,
            vec![
                Command::AssignTarget {
                    unit: UnitId::new(1),
                    target: Some(EnemyId::new(3)),
                },
                Command::AssignTarget {
                    unit: UnitId::new(2),
                    target: Some(EnemyId::new(3)),
                },
            ]
        );
    }

    #[test]
    fn live_target_in_range_is_kept() {
        let out = run(
            vec![unit(1, Some(1), true)],
            vec![enemy(1, 10.0, 0), enemy(2, 20.0, 3)],
        );
        assert!(out.is_empty());
    }

    #[test]
    fn lost_target_waits_for_stickiness() {
        let enemies = vec![enemy(2, 20.0, 0), enemy(5, 150.0, 3)];
        assert!(run(vec![unit(1, Some(9), false)], enemies.clone()).is_empty());
        assert!(run(vec![unit(1, Some(5), false)], enemies.clone()).is_empty());
        assert_eq!(
            run(vec![unit(1, Some(5), true)], enemies),
            vec![Command::AssignTarget {
                unit: UnitId::new(1),
                target: Some(EnemyId::new(2)),
            }]
        );
    }

    #[test]
    fn nothing_in_range_clears_the_target() {
        let enemies = vec![enemy(1, 500.0, 0)];
        assert_eq!(
            run(vec![unit(1, Some(1), true)], enemies),
            vec![Command::AssignTarget {
                unit: UnitId::new(1),
                target: None,
            }]
        );
    }

    #[test]
    fn empty_scan_restarts_the_stickiness_delay() {
        let enemies = vec![enemy(1, 500.0, 0)];
        assert_eq!(
            run(vec![unit(1, None, true)], enemies.clone()),
            vec![Command::AssignTarget {
                unit: UnitId::new(1),
                target: None,
            }]
        );
        assert!(run(vec![unit(1, None, false)], enemies).is_empty());
    }

    #[test]
    fn detached_units_are_skipped() {
        let mut detached = unit(1, None, true);
        detached.cell = None;
        assert!(run(vec![detached], vec![enemy(1, 10.0, 0)]).is_empty());
    }
}
