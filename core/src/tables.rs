//! Static data tables: units, skills and waves.
//!
//! The standard tables reproduce the shipped game data. Hosts may replace any
//! of them, for example by deserialising a TOML file.

use serde::{Deserialize, Serialize};

use crate::{EnemyTemplate, SkillId, Tier, UnitKind};

/// Attack interval around which variant damage ratios are balanced.
pub const BASELINE_ATTACK_INTERVAL: f32 = 1.0;

/// Identifier of the standard attack-speed skill.
pub const BERSERK: SkillId = SkillId::new(0);

/// Identifier of the standard damage-zone skill.
pub const INFERNO: SkillId = SkillId::new(1);

/// Stat line of one concrete unit identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitArchetype {
    /// Identity described by this entry.
    pub kind: UnitKind,
    /// Display name.
    pub name: String,
    /// Tier the identity belongs to.
    pub tier: Tier,
    /// Seconds between two attacks.
    pub attack_interval: f32,
    /// Attacking range in world units.
    pub range: f32,
    /// Skills granted to every unit of this identity.
    #[serde(default)]
    pub skills: Vec<SkillId>,
}

impl UnitArchetype {
    /// Per-hit damage ratio of the variant.
    ///
    /// Slow variants hit harder and fast variants hit softer so that damage
    /// per second stays comparable within a tier.
    #[must_use]
    pub fn damage_ratio(&self) -> f32 {
        self.attack_interval / BASELINE_ATTACK_INTERVAL
    }
}

/// Table of every unit identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTable {
    units: Vec<UnitArchetype>,
}

impl UnitTable {
    /// Creates a table from explicit entries.
    #[must_use]
    pub fn new(units: Vec<UnitArchetype>) -> Self {
        Self { units }
    }

    /// Fifteen identities, three per tier: steady, rapid and heavy.
    #[must_use]
    pub fn standard() -> Self {
        const ENTRIES: [(&str, Tier, f32, f32); 15] = [
            ("Warrior", Tier::Normal, 1.0, 200.0),
            ("Knight", Tier::Normal, 0.1, 190.0),
            ("Paladin", Tier::Normal, 3.0, 210.0),
            ("Mage", Tier::Rare, 1.0, 220.0),
            ("Sorcerer", Tier::Rare, 0.1, 230.0),
            ("Warlock", Tier::Rare, 3.0, 210.0),
            ("Archer", Tier::Epic, 1.0, 240.0),
            ("Hunter", Tier::Epic, 0.1, 230.0),
            ("Ranger", Tier::Epic, 3.0, 250.0),
            ("Crusader", Tier::Legendary, 1.0, 260.0),
            ("Guardian", Tier::Legendary, 0.1, 250.0),
            ("Templar", Tier::Legendary, 3.0, 270.0),
            ("Dragon", Tier::Mythical, 1.0, 280.0),
            ("Phoenix", Tier::Mythical, 0.1, 300.0),
            ("Titan", Tier::Mythical, 3.0, 260.0),
        ];

        let units = ENTRIES
            .iter()
            .enumerate()
            .map(|(index, &(name, tier, attack_interval, range))| {
                let mut skills = Vec::new();
                if attack_interval < BASELINE_ATTACK_INTERVAL {
                    skills.push(BERSERK);
                }
                if attack_interval > BASELINE_ATTACK_INTERVAL && tier >= Tier::Epic {
                    skills.push(INFERNO);
                }
                UnitArchetype {
                    kind: UnitKind::new(index as u16),
                    name: name.to_owned(),
                    tier,
                    attack_interval,
                    range,
                    skills,
                }
            })
            .collect();

        Self { units }
    }

    /// Looks up the entry of a unit identity.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> Option<&UnitArchetype> {
        self.units.iter().find(|unit| unit.kind == kind)
    }

    /// Identities belonging to a tier, in table order.
    pub fn kinds_in_tier(&self, tier: Tier) -> impl Iterator<Item = UnitKind> + '_ {
        self.units
            .iter()
            .filter(move |unit| unit.tier == tier)
            .map(|unit| unit.kind)
    }

    /// Iterator over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.units.iter()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Effect record of one skill level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillEffect {
    /// Chance on attack to speed up the unit's attacks for a while.
    AttackSpeedBoost {
        /// Activation chance per attack.
        chance: f32,
        /// Buff duration in seconds.
        duration: f32,
        /// Fractional attack-speed bonus.
        speed_bonus: f32,
    },
    /// Chance on attack to leave a burning zone where the projectile lands.
    DamageZone {
        /// Activation chance per attack.
        chance: f32,
        /// Zone lifetime in seconds.
        duration: f32,
        /// Damage per tick to every enemy in the zone.
        tick_damage: f32,
        /// Zone radius in world units.
        radius: f32,
        /// Seconds between two damage ticks.
        tick_interval: f32,
    },
}

impl SkillEffect {
    /// Activation chance per attack.
    #[must_use]
    pub const fn chance(&self) -> f32 {
        match self {
            Self::AttackSpeedBoost { chance, .. } | Self::DamageZone { chance, .. } => *chance,
        }
    }
}

/// One skill and its per-level effect records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Identifier of the skill.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Effect records, level 1 first.
    pub levels: Vec<SkillEffect>,
}

impl SkillDefinition {
    /// Highest level the skill can reach.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        u8::try_from(self.levels.len()).unwrap_or(u8::MAX)
    }

    /// Effect record of a level, starting at 1.
    #[must_use]
    pub fn effect(&self, level: u8) -> Option<&SkillEffect> {
        self.levels.get(usize::from(level).checked_sub(1)?)
    }
}

/// Table of every skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillTable {
    skills: Vec<SkillDefinition>,
}

impl SkillTable {
    /// Creates a table from explicit definitions.
    #[must_use]
    pub fn new(skills: Vec<SkillDefinition>) -> Self {
        Self { skills }
    }

    /// Berserk and Inferno, five levels each.
    #[must_use]
    pub fn standard() -> Self {
        let berserk = [
            (0.10, 2.0, 0.20),
            (0.12, 2.5, 0.25),
            (0.14, 3.0, 0.30),
            (0.16, 3.5, 0.35),
            (0.20, 4.0, 0.40),
        ]
        .into_iter()
        .map(|(chance, duration, speed_bonus)| SkillEffect::AttackSpeedBoost {
            chance,
            duration,
            speed_bonus,
        })
        .collect();

        let inferno = [
            (0.15, 2.0, 40.0, 60.0),
            (0.18, 2.5, 60.0, 65.0),
            (0.21, 3.0, 90.0, 70.0),
            (0.24, 3.5, 130.0, 75.0),
            (0.30, 4.0, 180.0, 80.0),
        ]
        .into_iter()
        .map(|(chance, duration, tick_damage, radius)| SkillEffect::DamageZone {
            chance,
            duration,
            tick_damage,
            radius,
            tick_interval: 0.5,
        })
        .collect();

        Self {
            skills: vec![
                SkillDefinition {
                    id: BERSERK,
                    name: "Berserk".to_owned(),
                    levels: berserk,
                },
                SkillDefinition {
                    id: INFERNO,
                    name: "Inferno".to_owned(),
                    levels: inferno,
                },
            ],
        }
    }

    /// Looks up a skill definition.
    #[must_use]
    pub fn get(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    /// Effect record of a skill at a level.
    #[must_use]
    pub fn effect(&self, id: SkillId, level: u8) -> Option<&SkillEffect> {
        self.get(id)?.effect(level)
    }
}

impl Default for SkillTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Easing applied to the automatic spawn interval over a wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingCurve {
    /// Constant interval.
    #[default]
    Linear,
    /// Interval shrinks as the wave progresses.
    EaseIn,
    /// Interval grows as the wave progresses.
    EaseOut,
}

impl PacingCurve {
    /// Interval factor at `progress` in `[0, 1]`.
    #[must_use]
    pub fn factor(self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => 1.0,
            Self::EaseIn => 1.0 - 0.5 * progress,
            Self::EaseOut => 0.5 + 0.5 * progress,
        }
    }
}

/// Static description of one wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Base duration in seconds before the duration scale is applied.
    pub duration: f32,
    /// Number of enemies spawned over the wave.
    pub count: u32,
    /// Multiplier applied to the base enemy hit points.
    pub hp_scale: f32,
    /// Enemy speed in world units per second.
    pub speed: f32,
    /// Fixed spawn interval overriding the automatic cadence.
    #[serde(default)]
    pub spawn_interval: Option<f32>,
    /// Magnitude of the uniform noise added to the interval.
    #[serde(default)]
    pub jitter: Option<f32>,
    /// Enemies released per spawn trigger.
    #[serde(default)]
    pub batch_size: Option<u32>,
    /// Easing applied to the automatic interval.
    #[serde(default)]
    pub pacing: Option<PacingCurve>,
    /// Whether the wave is a boss wave.
    #[serde(default)]
    pub boss: bool,
}

impl WaveDefinition {
    /// Plain wave with the automatic cadence.
    #[must_use]
    pub fn new(duration: f32, count: u32, hp_scale: f32, speed: f32) -> Self {
        Self {
            duration,
            count,
            hp_scale,
            speed,
            spawn_interval: None,
            jitter: None,
            batch_size: None,
            pacing: None,
            boss: false,
        }
    }

    /// Boss wave spawning `count` enemies as fast as possible.
    #[must_use]
    pub fn boss(duration: f32, count: u32, hp_scale: f32, speed: f32) -> Self {
        Self {
            boss: true,
            ..Self::new(duration, count, hp_scale, speed)
        }
    }

    /// Stats applied to every enemy spawned by the wave.
    #[must_use]
    pub fn enemy_template(&self) -> EnemyTemplate {
        EnemyTemplate {
            hp_scale: self.hp_scale,
            speed: self.speed,
            boss: self.boss,
        }
    }
}

/// Ordered list of waves; clearing the last one wins the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveTable {
    waves: Vec<WaveDefinition>,
}

impl WaveTable {
    /// Creates a table from explicit definitions.
    #[must_use]
    pub fn new(waves: Vec<WaveDefinition>) -> Self {
        Self { waves }
    }

    /// Eighty waves in blocks of ten: five normal, four tougher, one boss.
    #[must_use]
    pub fn standard() -> Self {
        const BOSS_HP: [f32; 8] = [150.0, 300.0, 500.0, 800.0, 1_200.0, 1_700.0, 2_300.0, 3_000.0];
        const BOSS_SPEED: [f32; 8] = [100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 170.0];
        const OPENING_SPEEDS: [[f32; 9]; 2] = [
            [80.0, 85.0, 90.0, 95.0, 100.0, 100.0, 110.0, 115.0, 100.0],
            [120.0, 130.0, 125.0, 135.0, 140.0, 140.0, 150.0, 160.0, 150.0],
        ];

        let mut waves = Vec::with_capacity(80);
        for block in 0..8usize {
            for slot in 0..9usize {
                let step = if slot < 5 { 2 * block + 1 } else { 2 * block + 2 };
                let hp_scale = 1.5 * step as f32;
                let speed = match OPENING_SPEEDS.get(block) {
                    Some(speeds) => speeds[slot],
                    None => 161.0 + 10.0 * block as f32 + slot as f32,
                };
                waves.push(WaveDefinition::new(20.0, 20, hp_scale, speed));
            }
            waves.push(WaveDefinition::boss(60.0, 1, BOSS_HP[block], BOSS_SPEED[block]));
        }

        Self { waves }
    }

    /// Looks up a wave by its zero-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&WaveDefinition> {
        self.waves.get(index)
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the table holds no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Iterator over the waves in order.
    pub fn iter(&self) -> impl Iterator<Item = &WaveDefinition> {
        self.waves.iter()
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::standard()
    }
}
