//! Unit registry and derived attack values.

use std::collections::BTreeMap;

use loop_defence_core::{
    AttackSpeedBuff, Balance, CellCoord, EnemyId, SkillSlot, Tier, UnitArchetype, UnitId,
    UnitKind,
};

/// Runtime state of a unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct UnitState {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) tier: Tier,
    pub(crate) level: u8,
    pub(crate) attack: u32,
    pub(crate) damage_ratio: f32,
    pub(crate) attack_interval: f32,
    pub(crate) range: f32,
    pub(crate) cell: Option<CellCoord>,
    pub(crate) target: Option<EnemyId>,
    pub(crate) since_attack: f32,
    pub(crate) retarget_cooldown: f32,
    pub(crate) buff: Option<AttackSpeedBuff>,
    pub(crate) skills: Vec<SkillSlot>,
}

impl UnitState {
    /// Seconds between attacks after applying the active buff.
    pub(crate) fn effective_interval(&self) -> f32 {
        let bonus = self.buff.map_or(0.0, |buff| buff.bonus);
        self.attack_interval / (1.0 + bonus)
    }

    pub(crate) fn attack_ready(&self) -> bool {
        self.since_attack >= self.effective_interval()
    }

    pub(crate) fn retarget_ready(&self) -> bool {
        self.retarget_cooldown <= 0.0
    }

    /// Advances attack, stickiness and buff clocks.
    pub(crate) fn advance(&mut self, dt: f32) {
        self.since_attack += dt;
        self.retarget_cooldown = (self.retarget_cooldown - dt).max(0.0);
        if let Some(buff) = self.buff.as_mut() {
            buff.duration -= dt;
            if buff.duration <= 0.0 {
                self.buff = None;
            }
        }
    }

    pub(crate) fn recompute_attack(&mut self, balance: &Balance, permanent_level: u32) {
        self.attack = attack_value(
            balance,
            self.tier,
            self.damage_ratio,
            self.level,
            permanent_level,
        );
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, UnitState>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty unit registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    /// Creates a level-one unit of the archetype without placing it.
    pub(crate) fn create(
        &mut self,
        archetype: &UnitArchetype,
        balance: &Balance,
        permanent_level: u32,
    ) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));

        let mut unit = UnitState {
            id,
            kind: archetype.kind,
            tier: archetype.tier,
            level: 1,
            attack: 0,
            damage_ratio: archetype.damage_ratio(),
            attack_interval: archetype.attack_interval,
            range: archetype.range,
            cell: None,
            target: None,
            since_attack: archetype.attack_interval,
            retarget_cooldown: 0.0,
            buff: None,
            skills: archetype
                .skills
                .iter()
                .map(|&skill| SkillSlot { skill, level: 1 })
                .collect(),
        };
        unit.recompute_attack(balance, permanent_level);
        let _ = self.entries.insert(id, unit);
        id
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<UnitState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&UnitState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut UnitState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &UnitState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut UnitState> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_unit_id = UnitId::new(0);
    }
}

/// Damage dealt per projectile for the provided unit parameters.
pub(crate) fn attack_value(
    balance: &Balance,
    tier: Tier,
    damage_ratio: f32,
    level: u8,
    permanent_level: u32,
) -> u32 {
    let base = balance.base_damage_by_tier[tier.index()];
    let level_factor = balance
        .level_multiplier
        .powi(i32::from(level.saturating_sub(1)));
    let permanent_factor = 1.0 + balance.permanent_bonus_rate * permanent_level as f32;
    let damage = base * damage_ratio * level_factor * permanent_factor;
    damage.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_defence_core::UnitTable;

    #[test]
    fn attack_scales_with_level_and_permanent_upgrades() {
        let balance = Balance::default();
        assert_eq!(attack_value(&balance, Tier::Normal, 1.0, 1, 0), 30);
        assert_eq!(attack_value(&balance, Tier::Normal, 1.0, 2, 0), 45);
        assert_eq!(attack_value(&balance, Tier::Normal, 1.0, 1, 2), 36);
        assert_eq!(attack_value(&balance, Tier::Rare, 3.0, 1, 0), 300);
        assert_eq!(attack_value(&balance, Tier::Normal, 0.1, 1, 0), 3);
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let balance = Balance::default();
        let table = UnitTable::standard();
        let archetype = table.get(UnitKind::new(0)).expect("warrior");
        let mut registry = UnitRegistry::new();
        let first = registry.create(archetype, &balance, 0);
        let second = registry.create(archetype, &balance, 0);
        assert_eq!(first, UnitId::new(0));
        assert_eq!(second, UnitId::new(1));
        assert_eq!(registry.len(), 2);
        let unit = registry.get(first).expect("stored");
        assert_eq!(unit.level, 1);
        assert_eq!(unit.attack, 30);
        assert!(unit.attack_ready());
        assert!(unit.cell.is_none());
    }

    #[test]
    fn buff_shortens_interval_until_it_expires() {
        let balance = Balance::default();
        let table = UnitTable::standard();
        let archetype = table.get(UnitKind::new(0)).expect("warrior");
        let mut registry = UnitRegistry::new();
        let id = registry.create(archetype, &balance, 0);
        let unit = registry.get_mut(id).expect("stored");
        unit.since_attack = 0.0;
        unit.buff = Some(AttackSpeedBuff {
            bonus: 0.25,
            duration: 1.0,
        });
        assert!((unit.effective_interval() - 0.8).abs() < 1e-6);
        unit.advance(0.85);
        assert!(unit.attack_ready());
        unit.advance(0.3);
        assert!(unit.buff.is_none());
    }
}
