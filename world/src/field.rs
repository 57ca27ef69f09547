//! Enemy motion, projectile homing and damage-zone resolution.

use glam::Vec2;
use loop_defence_core::{
    Balance, DamageZonePayload, EnemyId, EnemySnapshot, Event, Layout, ProjectileId, WorldPoint,
    ZoneId,
};

use crate::economy::kill_bounty;

const MIN_TICK_INTERVAL: f32 = 0.01;

/// Runtime state of an enemy walking the loop.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) position: WorldPoint,
    pub(crate) waypoint_index: usize,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    pub(crate) speed: f32,
    pub(crate) boss: bool,
    pub(crate) alive: bool,
}

impl EnemyState {
    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            waypoint_index: self.waypoint_index,
            hp: self.hp,
            max_hp: self.max_hp,
            boss: self.boss,
        }
    }
}

#[derive(Clone, Debug)]
struct ProjectileState {
    id: ProjectileId,
    position: Vec2,
    velocity: Vec2,
    damage: u32,
    target: EnemyId,
    zone: Option<DamageZonePayload>,
}

#[derive(Clone, Debug)]
struct ZoneState {
    id: ZoneId,
    center: Vec2,
    payload: DamageZonePayload,
    remaining: f32,
    tick_timer: f32,
}

/// Parameters of a projectile launch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) origin: WorldPoint,
    pub(crate) target: EnemyId,
    pub(crate) damage: u32,
    pub(crate) zone: Option<DamageZonePayload>,
}

/// Every transient combat entity on the playfield.
#[derive(Debug, Default)]
pub(crate) struct Field {
    enemies: Vec<EnemyState>,
    projectiles: Vec<ProjectileState>,
    zones: Vec<ZoneState>,
    next_projectile: u32,
    next_zone: u32,
}

impl Field {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn insert_enemy(&mut self, enemy: EnemyState) {
        self.enemies.push(enemy);
    }

    pub(crate) fn enemies(&self) -> impl Iterator<Item = &EnemyState> {
        self.enemies.iter().filter(|enemy| enemy.alive)
    }

    pub(crate) fn enemy(&self, id: EnemyId) -> Option<&EnemyState> {
        self.enemies().find(|enemy| enemy.id == id)
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.enemies().count()
    }

    pub(crate) fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub(crate) fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Launches a projectile toward a live enemy.
    ///
    /// Returns `None` when the target is not alive.
    pub(crate) fn launch(&mut self, launch: Launch, balance: &Balance) -> Option<ProjectileId> {
        let aim = to_vec(self.enemy(launch.target)?.position);
        let origin = to_vec(launch.origin);
        let direction = (aim - origin).normalize_or_zero();
        let id = ProjectileId::new(self.next_projectile);
        self.next_projectile = self.next_projectile.wrapping_add(1);
        self.projectiles.push(ProjectileState {
            id,
            position: origin + direction * balance.muzzle_offset,
            velocity: direction * balance.projectile_speed,
            damage: launch.damage,
            target: launch.target,
            zone: launch.zone,
        });
        Some(id)
    }

    /// Resolves one step of motion and damage, then purges dead enemies.
    pub(crate) fn step(&mut self, dt: f32, layout: &Layout, balance: &Balance, out: &mut Vec<Event>) {
        self.advance_enemies(dt, layout, balance);
        self.advance_projectiles(dt, layout, balance, out);
        self.advance_zones(dt, layout, balance, out);
        self.enemies.retain(|enemy| enemy.alive);
    }

    fn advance_enemies(&mut self, dt: f32, layout: &Layout, balance: &Balance) {
        let waypoints = layout.waypoints();
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.alive) {
            let waypoint = to_vec(waypoints[enemy.waypoint_index % waypoints.len()]);
            let position = to_vec(enemy.position);
            let offset = waypoint - position;
            let distance = offset.length();
            let travel = (enemy.speed * dt).min(distance);
            let moved = position + offset.normalize_or_zero() * travel;
            enemy.position = to_point(moved);
            if moved.distance(waypoint) <= balance.waypoint_arrival_threshold {
                enemy.waypoint_index = (enemy.waypoint_index + 1) % waypoints.len();
            }
        }
    }

    fn advance_projectiles(
        &mut self,
        dt: f32,
        layout: &Layout,
        balance: &Balance,
        out: &mut Vec<Event>,
    ) {
        let projectiles = std::mem::take(&mut self.projectiles);
        for mut projectile in projectiles {
            let target = self
                .enemies
                .iter()
                .position(|enemy| enemy.alive && enemy.id == projectile.target);

            let Some(index) = target else {
                projectile.position += projectile.velocity * dt;
                if layout.contains(to_point(projectile.position)) {
                    self.projectiles.push(projectile);
                } else {
                    out.push(Event::ProjectileExpired {
                        projectile: projectile.id,
                    });
                }
                continue;
            };

            let aim = to_vec(self.enemies[index].position);
            let offset = aim - projectile.position;
            let distance = offset.length();
            if distance >= balance.projectile_hit_radius {
                let direction = offset / distance;
                projectile.velocity = direction * balance.projectile_speed;
                projectile.position += direction * (balance.projectile_speed * dt).min(distance);
            }

            if projectile.position.distance(aim) < balance.projectile_hit_radius {
                damage_enemy(&mut self.enemies[index], projectile.damage, balance, out);
                if let Some(payload) = projectile.zone {
                    let id = ZoneId::new(self.next_zone);
                    self.next_zone = self.next_zone.wrapping_add(1);
                    self.zones.push(ZoneState {
                        id,
                        center: aim,
                        payload,
                        remaining: payload.duration,
                        tick_timer: 0.0,
                    });
                    out.push(Event::DamageZoneCreated {
                        zone: id,
                        position: to_point(aim),
                        radius: payload.radius,
                    });
                }
                continue;
            }

            self.projectiles.push(projectile);
        }
    }

    fn advance_zones(&mut self, dt: f32, layout: &Layout, balance: &Balance, out: &mut Vec<Event>) {
        for zone in &mut self.zones {
            zone.tick_timer += dt;
            let interval = zone.payload.tick_interval.max(MIN_TICK_INTERVAL);
            let reach = zone.payload.radius + layout.enemy_radius;
            let damage = zone.payload.tick_damage.round().max(0.0) as u32;
            while zone.tick_timer >= interval {
                zone.tick_timer -= interval;
                for enemy in self.enemies.iter_mut().filter(|enemy| enemy.alive) {
                    if to_vec(enemy.position).distance(zone.center) <= reach {
                        damage_enemy(enemy, damage, balance, out);
                    }
                }
            }
            zone.remaining -= dt;
        }

        self.zones.retain(|zone| {
            if zone.remaining > 0.0 {
                return true;
            }
            out.push(Event::DamageZoneExpired { zone: zone.id });
            false
        });
    }
}

fn damage_enemy(enemy: &mut EnemyState, damage: u32, balance: &Balance, out: &mut Vec<Event>) {
    if !enemy.alive {
        return;
    }
    enemy.hp = enemy.hp.saturating_sub(damage);
    if enemy.hp > 0 {
        out.push(Event::EnemyDamaged {
            enemy: enemy.id,
            damage,
            remaining: enemy.hp,
        });
        return;
    }

    enemy.alive = false;
    out.push(Event::EnemyKilled {
        enemy: enemy.id,
        position: enemy.position,
        max_hp: enemy.max_hp,
        bounty: kill_bounty(balance, enemy.max_hp),
    });
}

fn to_vec(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

fn to_point(vector: Vec2) -> WorldPoint {
    WorldPoint::new(vector.x, vector.y)
}
