#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.
//!
//! Every firing unit rolls each of its skills once. A triggered attack-speed
//! boost becomes `Command::ActivateBuff`; a triggered damage zone rides along
//! with the projectile and is released where it lands.

use loop_defence_core::{
    AttackSpeedBuff, Command, DamageZonePayload, EnemyView, Lifecycle, RandomSource, SkillEffect,
    SkillSlot, SkillTable, UnitId, UnitView,
};

/// Unit combat system that queues firing commands for ready units.
#[derive(Debug, Default)]
pub struct UnitCombat {
    scratch: Vec<Command>,
}

impl UnitCombat {
    /// Creates a new unit combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for units ready to fire.
    pub fn handle(
        &mut self,
        units: &UnitView,
        enemies: &EnemyView,
        skills: &SkillTable,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Command>,
    ) {
        if units.is_empty() || enemies.is_empty() {
            return;
        }

        self.scratch.clear();

        for unit in units.iter() {
            if !unit.attack_ready {
                continue;
            }
            let Some(target) = unit.target.filter(|target| enemies.get(*target).is_some()) else {
                continue;
            };

            let mut zone = None;
            let mut buff = None;
            for slot in &unit.skills {
                match roll_skill(skills, *slot, rng) {
                    Some(Triggered::Buff(triggered)) => buff = Some(triggered),
                    Some(Triggered::Zone(triggered)) => zone = Some(triggered),
                    None => {}
                }
            }

            self.scratch.push(Command::FireProjectile {
                unit: unit.id,
                target,
                zone,
            });
            if let Some(buff) = buff {
                self.scratch.push(activate(unit.id, buff));
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

impl Lifecycle for UnitCombat {
    fn initialize(&mut self) {
        self.scratch.clear();
    }

    fn teardown(&mut self) {
        self.scratch = Vec::new();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Triggered {
    Buff(AttackSpeedBuff),
    Zone(DamageZonePayload),
}

fn roll_skill(
    skills: &SkillTable,
    slot: SkillSlot,
    rng: &mut dyn RandomSource,
) -> Option<Triggered> {
    let effect = skills.effect(slot.skill, slot.level)?;
    if rng.next_unit() >= f64::from(effect.chance()) {
        return None;
    }

    Some(match *effect {
        SkillEffect::AttackSpeedBoost {
            duration,
            speed_bonus,
            ..
        } => Triggered::Buff(AttackSpeedBuff {
            bonus: speed_bonus,
            duration,
        }),
        SkillEffect::DamageZone {
            duration,
            tick_damage,
            radius,
            tick_interval,
            ..
        } => Triggered::Zone(DamageZonePayload {
            radius,
            duration,
            tick_damage,
            tick_interval,
        }),
    })
}

fn activate(unit: UnitId, buff: AttackSpeedBuff) -> Command {
    Command::ActivateBuff { unit, buff }
}
