//! Enemy instantiation at the loop seat.

use loop_defence_core::{Balance, EnemyId, EnemyTemplate, Layout, WorldPoint};

use crate::field::EnemyState;

/// Allocates enemy identifiers and builds freshly spawned enemies.
#[derive(Debug)]
pub(crate) struct Spawner {
    next_enemy_id: EnemyId,
}

impl Spawner {
    pub(crate) fn new() -> Self {
        Self {
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Builds an enemy at the seat, heading for the first loop waypoint.
    pub(crate) fn spawn(
        &mut self,
        layout: &Layout,
        balance: &Balance,
        template: EnemyTemplate,
        offset: WorldPoint,
    ) -> EnemyState {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let max_hp = spawn_hit_points(balance, template.hp_scale);

        EnemyState {
            id,
            position: layout.seat.offset_by(offset),
            waypoint_index: 0,
            hp: max_hp,
            max_hp,
            speed: template.speed.max(0.0),
            boss: template.boss,
            alive: true,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.next_enemy_id = EnemyId::new(0);
    }
}

/// Hit points assigned to an enemy with the provided scale.
pub(crate) fn spawn_hit_points(balance: &Balance, hp_scale: f32) -> u32 {
    ((balance.enemy_base_hp * hp_scale).floor() as u32).max(1)
}
