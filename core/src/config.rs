//! Session configuration and balance constants.

use serde::{Deserialize, Serialize};

use crate::RarityGroup;

/// Difficulty presets offered to the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Shipped pacing.
    #[default]
    Normal,
    /// Shorter waves and denser spawns.
    Hard,
    /// Shortest waves and densest spawns.
    Extreme,
}

/// Configuration loaded once per session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Difficulty the remaining values were derived from.
    pub difficulty: Difficulty,
    /// Seconds the whole round may last before it is lost.
    pub round_time_limit: f32,
    /// Whether a normal wave that times out with enemies alive loses the session.
    pub wave_timeout_fails: bool,
    /// Multiplier applied to every wave's base duration.
    pub wave_duration_scale: f32,
    /// Multiplier applied to every computed spawn interval.
    pub spawn_interval_scale: f32,
    /// Pacing multiplier applied to `dt` on top of the player's speed setting.
    pub time_scale: f32,
}

impl GameConfig {
    /// Builds the preset configuration for a difficulty.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (wave_duration_scale, spawn_interval_scale) = match difficulty {
            Difficulty::Normal => (1.0, 1.0),
            Difficulty::Hard => (0.95, 0.9),
            Difficulty::Extreme => (0.9, 0.8),
        };

        Self {
            difficulty,
            round_time_limit: 900.0,
            wave_timeout_fails: false,
            wave_duration_scale,
            spawn_interval_scale,
            time_scale: 1.0,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Normal)
    }
}

/// Cost curve of one permanent-upgrade track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentUpgradeTrack {
    /// Price of the first level.
    pub base_cost: u32,
    /// Price increase per level already bought.
    pub cost_increase: u32,
}

impl PermanentUpgradeTrack {
    /// Price of the next level when `level` levels were already bought.
    #[must_use]
    pub fn cost_at(&self, level: u32) -> u32 {
        self.base_cost
            .saturating_add(self.cost_increase.saturating_mul(level))
    }
}

/// Tunable balance constants shared by the world and the systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Gold held when the session starts.
    pub starting_gold: u32,
    /// Price of one summon.
    pub summon_cost: u32,
    /// Fraction of a unit's value refunded on sale.
    pub sell_return_rate: f32,
    /// Maximum number of live units.
    pub max_units: u32,
    /// Maximum Manhattan distance a cell group may be moved.
    pub move_range: u32,
    /// Live enemy count that ends the session.
    pub field_cap: u32,
    /// Hit points of an enemy with an hp scale of 1.
    pub enemy_base_hp: f32,
    /// Gold granted per point of an enemy's maximum hit points.
    pub gold_per_hp: f32,
    /// Wave-clear bonus paid for the first wave.
    pub wave_clear_base: f32,
    /// Compound growth of the wave-clear bonus per wave.
    pub wave_clear_growth: f32,
    /// Attack multiplier gained per local level.
    pub level_multiplier: f32,
    /// Highest local level a unit may reach.
    pub max_unit_level: u8,
    /// Base damage per tier, lowest tier first.
    pub base_damage_by_tier: [f32; 5],
    /// Attack bonus granted per permanent-upgrade level.
    pub permanent_bonus_rate: f32,
    /// Permanent-upgrade cost curves, in [`RarityGroup::ALL`] order.
    pub permanent_upgrades: [PermanentUpgradeTrack; 3],
    /// Level-up price per tier rank and current level.
    pub level_up_base_cost: u32,
    /// Price of one skill level.
    pub skill_upgrade_cost: u32,
    /// Price of the first summon level upgrade.
    pub summon_level_base_cost: u32,
    /// Price increase per summon level already reached.
    pub summon_level_cost_increase: u32,
    /// Highest summon progression level.
    pub max_summon_level: u32,
    /// Seconds a unit waits before re-acquiring a lost target.
    pub target_stickiness: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Distance at which a projectile connects with its target.
    pub projectile_hit_radius: f32,
    /// Distance from the unit at which projectiles appear.
    pub muzzle_offset: f32,
    /// Distance at which an enemy counts as having reached a waypoint.
    pub waypoint_arrival_threshold: f32,
    /// Floor applied to every spawn interval.
    pub min_spawn_interval: f32,
    /// Width of the square in which spawned enemies are scattered.
    pub spawn_offset_spread: f32,
    /// Automatic interval used by waves with no enemies.
    pub empty_wave_interval: f32,
}

impl Balance {
    /// Cost curve of the permanent-upgrade track of a rarity group.
    #[must_use]
    pub fn permanent_track(&self, group: RarityGroup) -> PermanentUpgradeTrack {
        self.permanent_upgrades[group.index()]
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            starting_gold: 200,
            summon_cost: 100,
            sell_return_rate: 0.5,
            max_units: 20,
            move_range: 100,
            field_cap: 100,
            enemy_base_hp: 100.0,
            gold_per_hp: 0.05,
            wave_clear_base: 50.0,
            wave_clear_growth: 0.2,
            level_multiplier: 1.5,
            max_unit_level: 12,
            base_damage_by_tier: [30.0, 100.0, 320.0, 1_000.0, 3_200.0],
            permanent_bonus_rate: 0.1,
            permanent_upgrades: [
                PermanentUpgradeTrack {
                    base_cost: 100,
                    cost_increase: 50,
                },
                PermanentUpgradeTrack {
                    base_cost: 200,
                    cost_increase: 100,
                },
                PermanentUpgradeTrack {
                    base_cost: 400,
                    cost_increase: 200,
                },
            ],
            level_up_base_cost: 50,
            skill_upgrade_cost: 500,
            summon_level_base_cost: 200,
            summon_level_cost_increase: 100,
            max_summon_level: 20,
            target_stickiness: 0.3,
            projectile_speed: 600.0,
            projectile_hit_radius: 8.0,
            muzzle_offset: 20.0,
            waypoint_arrival_threshold: 4.0,
            min_spawn_interval: 0.05,
            spawn_offset_spread: 20.0,
            empty_wave_interval: 1.5,
        }
    }
}
