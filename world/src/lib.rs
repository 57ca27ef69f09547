#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Loop Defence.
//!
//! The world owns the unit grid, the unit registry, the gold ledger and every
//! transient combat entity. It is mutated exclusively through [`apply`], which
//! validates player actions atomically: a rejected action leaves the state
//! untouched and reports [`Event::ActionRejected`].

mod economy;
mod field;
mod grid;
mod merge;
mod placement;
mod spawner;
mod units;

use std::time::Duration;

use loop_defence_core::{
    ActionError, Balance, CellCoord, Command, DamageZonePayload, EnemyId, Event, Layout,
    PlayerAction, RarityGroup, SessionOutcome, SkillId, SkillTable, UnitId, UnitKind, UnitTable,
    WaveIndex, WorldPoint,
};

use crate::{
    economy::EconomyLedger,
    field::{Field, Launch},
    grid::Grid,
    merge::MergeContext,
    spawner::Spawner,
    units::{UnitRegistry, UnitState},
};

/// Represents the authoritative Loop Defence world state.
#[derive(Debug)]
pub struct World {
    layout: Layout,
    balance: Balance,
    unit_table: UnitTable,
    skill_table: SkillTable,
    grid: Grid,
    units: UnitRegistry,
    ledger: EconomyLedger,
    spawner: Spawner,
    field: Field,
    current_wave: Option<WaveIndex>,
    waves_cleared: u32,
    outcome: Option<SessionOutcome>,
    elapsed: Duration,
}

impl World {
    /// Creates a world using the shipped layout, balance and tables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(
            Layout::default(),
            Balance::default(),
            UnitTable::standard(),
            SkillTable::standard(),
        )
    }

    /// Creates a world from explicit layout, balance and tables.
    #[must_use]
    pub fn with_tables(
        layout: Layout,
        balance: Balance,
        unit_table: UnitTable,
        skill_table: SkillTable,
    ) -> Self {
        let grid = Grid::new(layout.grid_layout());
        let ledger = EconomyLedger::new(balance.starting_gold);
        Self {
            layout,
            balance,
            unit_table,
            skill_table,
            grid,
            units: UnitRegistry::new(),
            ledger,
            spawner: Spawner::new(),
            field: Field::new(),
            current_wave: None,
            waves_cleared: 0,
            outcome: None,
            elapsed: Duration::ZERO,
        }
    }

    fn reset(&mut self) {
        self.grid.clear();
        self.units.clear();
        self.ledger = EconomyLedger::new(self.balance.starting_gold);
        self.spawner.reset();
        self.field.clear();
        self.current_wave = None;
        self.waves_cleared = 0;
        self.outcome = None;
        self.elapsed = Duration::ZERO;
    }

    fn unit_position(&self, unit: &UnitState) -> Option<WorldPoint> {
        let cell = unit.cell?;
        let center = self.grid.layout().cell_to_world(cell)?;
        let occupants = &self.grid.cell(cell)?.occupants;
        let slot = occupants.iter().position(|occupant| *occupant == unit.id)?;
        Some(center.offset_by(self.layout.slot_offset(slot, occupants.len())))
    }

    fn gold_changed(&self, delta: i64) -> Event {
        Event::GoldChanged {
            balance: self.ledger.gold(),
            delta,
        }
    }

    fn occupancy_changed(&self, cell: CellCoord) -> Event {
        let (kind, occupants) = self
            .grid
            .cell(cell)
            .map_or((None, 0), |stored| (stored.kind, stored.occupants.len()));
        Event::CellOccupancyChanged {
            cell,
            kind,
            occupants,
        }
    }

    fn charge(&mut self, cost: u32) -> Result<(), ActionError> {
        let available = self.ledger.gold();
        if self.ledger.spend(cost) {
            Ok(())
        } else {
            Err(ActionError::InsufficientGold {
                required: cost,
                available,
            })
        }
    }

    fn ensure_affordable(&self, cost: u32) -> Result<(), ActionError> {
        let available = self.ledger.gold();
        if available >= cost {
            Ok(())
        } else {
            Err(ActionError::InsufficientGold {
                required: cost,
                available,
            })
        }
    }

    fn summon(&mut self, kind: UnitKind, out: &mut Vec<Event>) -> Result<(), ActionError> {
        let archetype = self.unit_table.get(kind).ok_or(ActionError::UnknownKind)?;
        let limit = self.balance.max_units;
        if self.units.len() >= limit as usize {
            return Err(ActionError::UnitLimitReached { limit });
        }
        let cost = self.balance.summon_cost;
        self.ensure_affordable(cost)?;
        let cell = placement::find_target_cell_for(&self.grid, kind)
            .ok_or(ActionError::NoEligibleCell)?;

        let permanent_level = self
            .ledger
            .permanent_level(archetype.tier.rarity_group());
        let unit = self.units.create(archetype, &self.balance, permanent_level);
        if placement::place(&mut self.grid, &mut self.units, unit, cell).is_err() {
            let _ = self.units.remove(unit);
            return Err(ActionError::NoEligibleCell);
        }
        self.charge(cost)?;

        log::debug!("summoned unit {} of kind {} into {cell:?}", unit.get(), kind.get());
        out.push(Event::UnitSummoned { unit, kind, cell });
        out.push(self.gold_changed(-i64::from(cost)));
        out.push(self.occupancy_changed(cell));
        Ok(())
    }

    fn move_units(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let source = self
            .grid
            .cell(from)
            .ok_or(ActionError::UnknownCell { cell: from })?;
        if self.grid.cell(to).is_none() {
            return Err(ActionError::UnknownCell { cell: to });
        }
        if from == to {
            return Err(ActionError::SameCell);
        }
        if source.is_empty() {
            return Err(ActionError::EmptyCell);
        }
        let distance = from.manhattan_distance(to);
        let range = self.balance.move_range;
        if distance > range {
            return Err(ActionError::OutOfMoveRange { distance, range });
        }

        let swapped = placement::move_or_swap(&mut self.grid, &mut self.units, from, to)
            .ok_or(ActionError::UnknownCell { cell: to })?;
        out.push(Event::UnitsMoved { from, to, swapped });
        out.push(self.occupancy_changed(from));
        out.push(self.occupancy_changed(to));
        Ok(())
    }

    fn combine_cell(
        &mut self,
        cell: CellCoord,
        result: UnitKind,
        out: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let outcome = merge::combine(
            MergeContext {
                grid: &mut self.grid,
                units: &mut self.units,
                table: &self.unit_table,
                balance: &self.balance,
                ledger: &self.ledger,
            },
            cell,
            result,
        )?;

        log::debug!(
            "merged {:?} in {cell:?} into unit {} ({:?})",
            outcome.tier_before,
            outcome.created.get(),
            outcome.tier_after
        );
        out.push(Event::UnitsMerged {
            consumed: outcome.consumed,
            created: outcome.created,
            kind: outcome.kind,
            tier_before: outcome.tier_before,
            tier_after: outcome.tier_after,
            cell: outcome.cell,
        });
        out.push(self.occupancy_changed(cell));
        if outcome.cell != cell {
            out.push(self.occupancy_changed(outcome.cell));
        }
        Ok(())
    }

    fn sell(&mut self, unit: UnitId, out: &mut Vec<Event>) -> Result<(), ActionError> {
        let state = self.units.get(unit).ok_or(ActionError::UnknownUnit)?;
        let kind = state.kind;
        let refund = economy::sell_refund(&self.balance, state.tier);

        let cell = placement::detach(&mut self.grid, &mut self.units, unit);
        let _ = self.units.remove(unit);
        self.ledger.add(refund);

        log::debug!("sold unit {} for {refund} gold", unit.get());
        out.push(Event::UnitSold { unit, kind, refund });
        out.push(self.gold_changed(i64::from(refund)));
        if let Some(cell) = cell {
            out.push(self.occupancy_changed(cell));
        }
        Ok(())
    }

    fn level_up(&mut self, unit: UnitId, out: &mut Vec<Event>) -> Result<(), ActionError> {
        let state = self.units.get(unit).ok_or(ActionError::UnknownUnit)?;
        if state.level >= self.balance.max_unit_level {
            return Err(ActionError::MaxLevel);
        }
        let cost = economy::level_up_cost(&self.balance, state.tier, state.level);
        let permanent_level = self.ledger.permanent_level(state.tier.rarity_group());
        self.charge(cost)?;

        let Some(state) = self.units.get_mut(unit) else {
            return Err(ActionError::UnknownUnit);
        };
        state.level += 1;
        state.recompute_attack(&self.balance, permanent_level);
        let (level, attack) = (state.level, state.attack);

        log::debug!("unit {} reached level {level}", unit.get());
        out.push(Event::UnitLeveled {
            unit,
            level,
            attack,
        });
        out.push(self.gold_changed(-i64::from(cost)));
        Ok(())
    }

    fn purchase_permanent_upgrade(
        &mut self,
        group: RarityGroup,
        out: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let cost = self
            .balance
            .permanent_track(group)
            .cost_at(self.ledger.permanent_level(group));
        self.charge(cost)?;
        let level = self.ledger.raise_permanent_level(group);

        for unit in self.units.iter_mut() {
            if unit.tier.rarity_group() == group {
                unit.recompute_attack(&self.balance, level);
            }
        }

        log::debug!("{group:?} permanent upgrade reached level {level}");
        out.push(Event::PermanentUpgradePurchased { group, level, cost });
        out.push(self.gold_changed(-i64::from(cost)));
        Ok(())
    }

    fn upgrade_summon_level(&mut self, out: &mut Vec<Event>) -> Result<(), ActionError> {
        let current = self.ledger.summon_level();
        if current >= self.balance.max_summon_level {
            return Err(ActionError::MaxLevel);
        }
        let cost = economy::summon_upgrade_cost(&self.balance, current);
        self.charge(cost)?;
        let level = self.ledger.raise_summon_level();

        log::debug!("summon level raised to {level}");
        out.push(Event::SummonLevelRaised { level, cost });
        out.push(self.gold_changed(-i64::from(cost)));
        Ok(())
    }

    fn upgrade_skill(
        &mut self,
        unit: UnitId,
        skill: SkillId,
        out: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let state = self.units.get(unit).ok_or(ActionError::UnknownUnit)?;
        let slot = state
            .skills
            .iter()
            .find(|slot| slot.skill == skill)
            .ok_or(ActionError::UnknownSkill)?;
        let definition = self
            .skill_table
            .get(skill)
            .ok_or(ActionError::UnknownSkill)?;
        if slot.level >= definition.max_level() {
            return Err(ActionError::MaxLevel);
        }
        let cost = self.balance.skill_upgrade_cost;
        self.charge(cost)?;

        let level = self
            .units
            .get_mut(unit)
            .and_then(|state| state.skills.iter_mut().find(|slot| slot.skill == skill))
            .map(|slot| {
                slot.level += 1;
                slot.level
            })
            .ok_or(ActionError::UnknownSkill)?;

        log::debug!("unit {} raised skill {} to level {level}", unit.get(), skill.get());
        out.push(Event::SkillUpgraded { unit, skill, level });
        out.push(self.gold_changed(-i64::from(cost)));
        Ok(())
    }

    fn fire(
        &mut self,
        unit: UnitId,
        target: EnemyId,
        zone: Option<DamageZonePayload>,
        out: &mut Vec<Event>,
    ) {
        let Some(state) = self.units.get(unit) else {
            return;
        };
        if !state.attack_ready() {
            return;
        }
        let Some(origin) = self.unit_position(state) else {
            return;
        };
        let launch = Launch {
            origin,
            target,
            damage: state.attack,
            zone,
        };
        let Some(projectile) = self.field.launch(launch, &self.balance) else {
            return;
        };
        if let Some(state) = self.units.get_mut(unit) {
            state.since_attack = 0.0;
        }
        out.push(Event::ProjectileFired {
            projectile,
            unit,
            target,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ResetSession => {
            world.reset();
            out_events.push(Event::SessionReset);
        }
        Command::Tick { dt } => {
            let seconds = dt.as_secs_f32();
            world.elapsed = world.elapsed.saturating_add(dt);
            for unit in world.units.iter_mut() {
                unit.advance(seconds);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AssignTarget { unit, target } => {
            let stickiness = world.balance.target_stickiness;
            if let Some(state) = world.units.get_mut(unit) {
                state.target = target;
                state.retarget_cooldown = stickiness;
            }
        }
        Command::FireProjectile { unit, target, zone } => {
            world.fire(unit, target, zone, out_events);
        }
        Command::ActivateBuff { unit, buff } => {
            if let Some(state) = world.units.get_mut(unit) {
                state.buff = Some(buff);
                out_events.push(Event::BuffActivated { unit, buff });
            }
        }
        Command::StepField { dt } => {
            world
                .field
                .step(dt.as_secs_f32(), &world.layout, &world.balance, out_events);
        }
        Command::BeginWave { wave, boss } => {
            world.current_wave = Some(wave);
            log::info!("wave {} started", wave.get() + 1);
            out_events.push(Event::WaveStarted { wave });
            if boss {
                log::info!("boss wave {} started", wave.get() + 1);
                out_events.push(Event::BossWaveStarted { wave });
            }
        }
        Command::SpawnEnemy {
            wave,
            template,
            offset,
        } => {
            let enemy = world
                .spawner
                .spawn(&world.layout, &world.balance, template, offset);
            out_events.push(Event::EnemySpawned {
                enemy: enemy.id,
                wave,
                position: enemy.position,
                max_hp: enemy.max_hp,
            });
            world.field.insert_enemy(enemy);
        }
        Command::ClearWave { wave } => {
            let bonus = economy::wave_clear_bonus(&world.balance, wave.get());
            world.ledger.add(bonus);
            world.waves_cleared = world.waves_cleared.saturating_add(1);
            log::info!("wave {} cleared, bonus {bonus}", wave.get() + 1);
            out_events.push(Event::WaveCleared { wave, bonus });
            out_events.push(world.gold_changed(i64::from(bonus)));
        }
        Command::EndSession { outcome } => {
            if world.outcome.is_none() {
                world.outcome = Some(outcome);
                log::info!("session ended: {outcome:?}");
                out_events.push(Event::SessionEnded { outcome });
            }
        }
        Command::GrantGold { amount } => {
            world.ledger.add(amount);
            out_events.push(world.gold_changed(i64::from(amount)));
        }
        Command::SummonUnit { kind } => {
            run_action(world, PlayerAction::Summon, out_events, |world, out| {
                world.summon(kind, out)
            });
        }
        Command::MoveUnits { from, to } => {
            run_action(world, PlayerAction::Move, out_events, |world, out| {
                world.move_units(from, to, out)
            });
        }
        Command::CombineCell { cell, result } => {
            run_action(world, PlayerAction::Merge, out_events, |world, out| {
                world.combine_cell(cell, result, out)
            });
        }
        Command::SellUnit { unit } => {
            run_action(world, PlayerAction::Sell, out_events, |world, out| {
                world.sell(unit, out)
            });
        }
        Command::LevelUpUnit { unit } => {
            run_action(world, PlayerAction::LevelUp, out_events, |world, out| {
                world.level_up(unit, out)
            });
        }
        Command::PurchasePermanentUpgrade { group } => {
            run_action(
                world,
                PlayerAction::PermanentUpgrade,
                out_events,
                |world, out| world.purchase_permanent_upgrade(group, out),
            );
        }
        Command::UpgradeSummonLevel => {
            run_action(world, PlayerAction::SummonUpgrade, out_events, |world, out| {
                world.upgrade_summon_level(out)
            });
        }
        Command::UpgradeSkill { unit, skill } => {
            run_action(world, PlayerAction::SkillUpgrade, out_events, |world, out| {
                world.upgrade_skill(unit, skill, out)
            });
        }
    }
}

fn run_action<F>(world: &mut World, action: PlayerAction, out_events: &mut Vec<Event>, body: F)
where
    F: FnOnce(&mut World, &mut Vec<Event>) -> Result<(), ActionError>,
{
    let result = if world.outcome.is_some() {
        Err(ActionError::SessionOver)
    } else {
        body(world, out_events)
    };

    if let Err(reason) = result {
        log::warn!("{action:?} rejected: {reason}");
        out_events.push(Event::ActionRejected { action, reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use loop_defence_core::{
        Balance, CellCoord, CellSnapshot, EnemyView, GridLayout, Layout, RarityGroup, Selection,
        SessionOutcome, SkillTable, UnitKind, UnitSnapshot, UnitTable, UnitView, WaveIndex,
        WorldPoint,
    };

    /// Provides read-only access to the playfield layout.
    #[must_use]
    pub fn layout(world: &World) -> &Layout {
        &world.layout
    }

    /// Provides read-only access to the grid geometry.
    #[must_use]
    pub fn grid_layout(world: &World) -> &GridLayout {
        world.grid.layout()
    }

    /// Provides read-only access to the balance constants.
    #[must_use]
    pub fn balance(world: &World) -> &Balance {
        &world.balance
    }

    /// Provides read-only access to the unit table.
    #[must_use]
    pub fn unit_table(world: &World) -> &UnitTable {
        &world.unit_table
    }

    /// Provides read-only access to the skill table.
    #[must_use]
    pub fn skill_table(world: &World) -> &SkillTable {
        &world.skill_table
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.ledger.gold()
    }

    /// Current summon progression level, starting at 1.
    #[must_use]
    pub fn summon_level(world: &World) -> u32 {
        world.ledger.summon_level()
    }

    /// Permanent-upgrade level bought for a rarity group.
    #[must_use]
    pub fn permanent_level(world: &World, group: RarityGroup) -> u32 {
        world.ledger.permanent_level(group)
    }

    /// Number of live units.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.units.len()
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.field.alive_count()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.field.projectile_count()
    }

    /// Number of burning damage zones.
    #[must_use]
    pub fn zone_count(world: &World) -> usize {
        world.field.zone_count()
    }

    /// Final outcome, once the session has ended.
    #[must_use]
    pub fn outcome(world: &World) -> Option<SessionOutcome> {
        world.outcome
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveIndex> {
        world.current_wave
    }

    /// Number of waves cleared so far.
    #[must_use]
    pub fn waves_cleared(world: &World) -> u32 {
        world.waves_cleared
    }

    /// Simulated time accumulated through ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Captures a read-only view of every unit.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots = world
            .units
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id,
                kind: unit.kind,
                tier: unit.tier,
                level: unit.level,
                attack: unit.attack,
                range: unit.range,
                cell: unit.cell,
                position: world.unit_position(unit).unwrap_or_default(),
                target: unit.target,
                retarget_ready: unit.retarget_ready(),
                attack_ready: unit.attack_ready(),
                skills: unit.skills.clone(),
            })
            .collect();
        UnitView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.field.enemies().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures the occupancy of a single cell.
    #[must_use]
    pub fn cell(world: &World, coord: CellCoord) -> Option<CellSnapshot> {
        let stored = world.grid.cell(coord)?;
        Some(CellSnapshot {
            coord,
            center: world.grid.layout().cell_to_world(coord)?,
            kind: stored.kind,
            occupants: stored.occupants.clone(),
        })
    }

    /// Captures the occupancy of every cell in row-major order.
    #[must_use]
    pub fn cells(world: &World) -> Vec<CellSnapshot> {
        world
            .grid
            .cells()
            .filter_map(|stored| cell(world, stored.coord))
            .collect()
    }

    /// Cell a newly summoned unit of `kind` would occupy.
    #[must_use]
    pub fn find_target_cell_for(world: &World, kind: UnitKind) -> Option<CellCoord> {
        super::placement::find_target_cell_for(&world.grid, kind)
    }

    /// Resolves a pointer position to the unit under it, or else the cell.
    #[must_use]
    pub fn select(world: &World, point: WorldPoint) -> Option<Selection> {
        let radius = world.layout.unit_pick_radius;
        let picked = world
            .units
            .iter()
            .filter_map(|unit| Some((unit, world.unit_position(unit)?, unit.cell?)))
            .filter(|(_, position, _)| position.distance(point) <= radius)
            .min_by(|(a, a_pos, _), (b, b_pos, _)| {
                a_pos
                    .distance(point)
                    .total_cmp(&b_pos.distance(point))
                    .then(a.id.cmp(&b.id))
            });
        if let Some((unit, _, cell)) = picked {
            return Some(Selection::Unit {
                unit: unit.id,
                cell,
            });
        }

        world
            .grid
            .layout()
            .world_to_cell(point)
            .map(|cell| Selection::Cell { cell })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_defence_core::{
        AttackSpeedBuff, CellSnapshot, DefeatCause, EnemyTemplate, Selection, Tier, CELL_CAPACITY,
    };

    fn summon(world: &mut World, kind: u16) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::SummonUnit {
                kind: UnitKind::new(kind),
            },
            &mut events,
        );
        events
    }

    fn rejection(events: &[Event]) -> Option<ActionError> {
        events.iter().find_map(|event| match event {
            Event::ActionRejected { reason, .. } => Some(*reason),
            _ => None,
        })
    }

    #[test]
    fn starting_gold_covers_exactly_two_summons() {
        let mut world = World::new();
        assert_eq!(query::gold(&world), 200);

        let first = summon(&mut world, 0);
        assert!(first.contains(&Event::GoldChanged {
            balance: 100,
            delta: -100
        }));
        let second = summon(&mut world, 0);
        assert!(rejection(&second).is_none());
        assert_eq!(query::gold(&world), 0);

        let third = summon(&mut world, 0);
        assert_eq!(
            rejection(&third),
            Some(ActionError::InsufficientGold {
                required: 100,
                available: 0
            })
        );
        assert_eq!(third.len(), 1);
        assert_eq!(query::unit_count(&world), 2);
    }

    #[test]
    fn unit_limit_blocks_summons_before_gold_check() {
        let mut balance = Balance::default();
        balance.max_units = 1;
        balance.starting_gold = 0;
        balance.summon_cost = 0;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        assert!(rejection(&summon(&mut world, 0)).is_none());
        assert_eq!(
            rejection(&summon(&mut world, 0)),
            Some(ActionError::UnitLimitReached { limit: 1 })
        );
    }

    #[test]
    fn full_grid_rejects_without_spending() {
        let mut balance = Balance::default();
        balance.starting_gold = 10_000;
        balance.max_units = 100;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        let slots = query::grid_layout(&world).cell_count() * CELL_CAPACITY;
        for _ in 0..slots {
            assert!(rejection(&summon(&mut world, 0)).is_none());
        }
        let gold = query::gold(&world);
        assert_eq!(
            rejection(&summon(&mut world, 3)),
            Some(ActionError::NoEligibleCell)
        );
        assert_eq!(query::gold(&world), gold);
        for cell in query::cells(&world) {
            assert!(cell.occupants.len() <= CELL_CAPACITY);
        }
    }

    #[test]
    fn moves_validate_before_mutating() {
        let mut world = World::new();
        let _ = summon(&mut world, 0);
        let origin = CellCoord::new(0, 0);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnits {
                from: origin,
                to: origin,
            },
            &mut events,
        );
        assert_eq!(rejection(&events), Some(ActionError::SameCell));

        events.clear();
        apply(
            &mut world,
            Command::MoveUnits {
                from: CellCoord::new(3, 1),
                to: origin,
            },
            &mut events,
        );
        assert_eq!(rejection(&events), Some(ActionError::EmptyCell));

        events.clear();
        let outside = CellCoord::new(6, 0);
        apply(
            &mut world,
            Command::MoveUnits {
                from: origin,
                to: outside,
            },
            &mut events,
        );
        assert_eq!(
            rejection(&events),
            Some(ActionError::UnknownCell { cell: outside })
        );

        events.clear();
        let target = CellCoord::new(5, 2);
        apply(
            &mut world,
            Command::MoveUnits {
                from: origin,
                to: target,
            },
            &mut events,
        );
        assert_eq!(
            events[0],
            Event::UnitsMoved {
                from: origin,
                to: target,
                swapped: false
            }
        );
        let units = query::unit_view(&world);
        let unit = units.iter().next().expect("one unit");
        assert_eq!(unit.cell, Some(target));
    }

    #[test]
    fn move_range_is_enforced() {
        let mut balance = Balance::default();
        balance.move_range = 1;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        let _ = summon(&mut world, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveUnits {
                from: CellCoord::new(0, 0),
                to: CellCoord::new(2, 1),
            },
            &mut events,
        );
        assert_eq!(
            rejection(&events),
            Some(ActionError::OutOfMoveRange {
                distance: 3,
                range: 1
            })
        );
    }

    #[test]
    fn merge_consumes_three_and_reports_tiers() {
        let mut balance = Balance::default();
        balance.starting_gold = 300;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        for _ in 0..3 {
            let _ = summon(&mut world, 2);
        }
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::CombineCell {
                cell: CellCoord::new(0, 0),
                result: UnitKind::new(4),
            },
            &mut events,
        );
        let merged = events
            .iter()
            .find_map(|event| match event {
                Event::UnitsMerged {
                    tier_before,
                    tier_after,
                    kind,
                    ..
                } => Some((*tier_before, *tier_after, *kind)),
                _ => None,
            })
            .expect("merge event");
        assert_eq!(merged, (Tier::Normal, Tier::Rare, UnitKind::new(4)));
        assert_eq!(query::unit_count(&world), 1);
        let cell = query::cell(&world, CellCoord::new(0, 0)).expect("cell");
        assert_eq!(cell.kind, Some(UnitKind::new(4)));
        assert_eq!(cell.occupants.len(), 1);
    }

    #[test]
    fn selling_refunds_half_of_the_unit_value() {
        let mut world = World::new();
        let _ = summon(&mut world, 0);
        let unit = query::unit_view(&world).iter().next().expect("unit").id;
        let mut events = Vec::new();
        apply(&mut world, Command::SellUnit { unit }, &mut events);
        assert!(events.contains(&Event::UnitSold {
            unit,
            kind: UnitKind::new(0),
            refund: 50
        }));
        assert_eq!(query::gold(&world), 150);
        assert_eq!(query::unit_count(&world), 0);
        assert!(query::cell(&world, CellCoord::new(0, 0))
            .expect("cell")
            .is_empty());
    }

    #[test]
    fn permanent_upgrade_recomputes_group_attack() {
        let mut balance = Balance::default();
        balance.starting_gold = 1_000;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        let _ = summon(&mut world, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PurchasePermanentUpgrade {
                group: RarityGroup::NormalRare,
            },
            &mut events,
        );
        assert!(events.contains(&Event::PermanentUpgradePurchased {
            group: RarityGroup::NormalRare,
            level: 1,
            cost: 100
        }));
        let unit = query::unit_view(&world).into_vec().remove(0);
        assert_eq!(unit.attack, 33);
    }

    #[test]
    fn level_up_and_skill_upgrade_spend_gold() {
        let mut balance = Balance::default();
        balance.starting_gold = 1_000;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        let _ = summon(&mut world, 1);
        let unit = query::unit_view(&world).iter().next().expect("unit").id;
        let mut events = Vec::new();

        apply(&mut world, Command::LevelUpUnit { unit }, &mut events);
        assert!(events.contains(&Event::UnitLeveled {
            unit,
            level: 2,
            attack: 5
        }));
        assert_eq!(query::gold(&world), 850);

        events.clear();
        let berserk = SkillId::new(0);
        apply(
            &mut world,
            Command::UpgradeSkill {
                unit,
                skill: berserk,
            },
            &mut events,
        );
        assert!(events.contains(&Event::SkillUpgraded {
            unit,
            skill: berserk,
            level: 2
        }));
        assert_eq!(query::gold(&world), 350);

        events.clear();
        apply(
            &mut world,
            Command::UpgradeSkill {
                unit,
                skill: SkillId::new(1),
            },
            &mut events,
        );
        assert_eq!(rejection(&events), Some(ActionError::UnknownSkill));
    }

    #[test]
    fn summon_level_is_capped() {
        let mut balance = Balance::default();
        balance.starting_gold = 100_000;
        balance.max_summon_level = 3;
        let mut world = World::with_tables(
            Layout::default(),
            balance,
            UnitTable::standard(),
            SkillTable::standard(),
        );
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(&mut world, Command::UpgradeSummonLevel, &mut events);
        }
        assert_eq!(query::summon_level(&world), 3);
        assert_eq!(query::gold(&world), 100_000 - 200 - 300);
        assert_eq!(rejection(&events), Some(ActionError::MaxLevel));
    }

    #[test]
    fn wave_clear_pays_compound_bonus() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ClearWave {
                wave: WaveIndex::new(1),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::WaveCleared {
                    wave: WaveIndex::new(1),
                    bonus: 60
                },
                Event::GoldChanged {
                    balance: 260,
                    delta: 60
                }
            ]
        );
    }

    #[test]
    fn actions_after_session_end_are_refused() {
        let mut world = World::new();
        let mut events = Vec::new();
        let outcome = SessionOutcome::Defeat {
            cause: DefeatCause::FieldOverrun,
        };
        apply(&mut world, Command::EndSession { outcome }, &mut events);
        apply(&mut world, Command::EndSession { outcome: SessionOutcome::Victory }, &mut events);
        assert_eq!(events, vec![Event::SessionEnded { outcome }]);
        assert_eq!(query::outcome(&world), Some(outcome));

        let events = summon(&mut world, 0);
        assert_eq!(rejection(&events), Some(ActionError::SessionOver));
    }

    #[test]
    fn reset_clears_entities_but_keeps_layout() {
        let mut world = World::new();
        let _ = summon(&mut world, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                wave: WaveIndex::new(0),
                template: EnemyTemplate {
                    hp_scale: 1.0,
                    speed: 50.0,
                    boss: false,
                },
                offset: WorldPoint::default(),
            },
            &mut events,
        );
        assert_eq!(query::enemy_count(&world), 1);
        let cells_before = query::grid_layout(&world).cell_count();

        apply(&mut world, Command::ResetSession, &mut events);
        assert_eq!(query::unit_count(&world), 0);
        assert_eq!(query::enemy_count(&world), 0);
        assert_eq!(query::gold(&world), 200);
        assert_eq!(query::grid_layout(&world).cell_count(), cells_before);
        assert!(query::cells(&world).iter().all(CellSnapshot::is_empty));
    }

    #[test]
    fn pointer_resolves_units_before_cells() {
        let mut world = World::new();
        let _ = summon(&mut world, 0);
        let snapshot = query::unit_view(&world).into_vec().remove(0);
        assert_eq!(
            query::select(&world, snapshot.position),
            Some(Selection::Unit {
                unit: snapshot.id,
                cell: CellCoord::new(0, 0)
            })
        );
        let far_corner = query::cell(&world, CellCoord::new(5, 2))
            .expect("cell")
            .center;
        assert_eq!(
            query::select(&world, far_corner),
            Some(Selection::Cell {
                cell: CellCoord::new(5, 2)
            })
        );
        assert_eq!(query::select(&world, WorldPoint::new(0.0, 0.0)), None);
    }

    #[test]
    fn buffs_and_targets_update_unit_state() {
        let mut world = World::new();
        let _ = summon(&mut world, 0);
        let unit = query::unit_view(&world).iter().next().expect("unit").id;
        let mut events = Vec::new();
        let buff = AttackSpeedBuff {
            bonus: 0.2,
            duration: 2.0,
        };
        apply(&mut world, Command::ActivateBuff { unit, buff }, &mut events);
        apply(
            &mut world,
            Command::AssignTarget {
                unit,
                target: Some(EnemyId::new(4)),
            },
            &mut events,
        );
        assert_eq!(events, vec![Event::BuffActivated { unit, buff }]);
        let snapshot = query::unit_view(&world).into_vec().remove(0);
        assert_eq!(snapshot.target, Some(EnemyId::new(4)));
        assert!(!snapshot.retarget_ready);
    }
}
