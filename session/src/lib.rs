#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session façade that drives the Loop Defence world and its systems.
//!
//! A [`Session`] owns the authoritative world, every pure system and the
//! random streams they draw from. Hosts call [`Session::advance`] once per
//! frame and the `request_*` methods for discrete player actions, then drain
//! the broadcast [`Event`] values with [`Session::drain_events`].

mod streams;

use std::time::Duration;

use loop_defence_core::{
    ActionError, Balance, CellCoord, Command, DefeatCause, Event, GameConfig, Layout, Lifecycle,
    PlayerAction, RarityGroup, Selection, SessionOutcome, SkillId, SkillTable, UnitId, UnitTable,
    WaveTable, WorldPoint,
};
use loop_defence_system_merging::Merging;
use loop_defence_system_summoning::Summoning;
use loop_defence_system_unit_combat::UnitCombat;
use loop_defence_system_unit_targeting::UnitTargeting;
use loop_defence_system_wave_scheduler::{Config, RoundTimer, WaveScheduler};
use loop_defence_world::{self as world, query, World};

pub use streams::{derive_labeled_seed, RandomStreams};

/// Slowest game speed multiplier.
pub const MIN_SPEED: f32 = 1.0;
/// Fastest game speed multiplier.
pub const MAX_SPEED: f32 = 4.0;

/// Everything a session is built from.
#[derive(Debug)]
pub struct SessionSetup {
    /// Difficulty-derived session configuration.
    pub config: GameConfig,
    /// Tunable balance constants.
    pub balance: Balance,
    /// Playfield geometry.
    pub layout: Layout,
    /// Unit identities.
    pub unit_table: UnitTable,
    /// Skill effect records.
    pub skill_table: SkillTable,
    /// Ordered wave definitions.
    pub wave_table: WaveTable,
    /// Random sources for summons, merges, combat and spawning.
    pub streams: RandomStreams,
}

impl SessionSetup {
    /// Shipped tables and balance with streams derived from `seed`.
    #[must_use]
    pub fn standard(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            balance: Balance::default(),
            layout: Layout::default(),
            unit_table: UnitTable::standard(),
            skill_table: SkillTable::standard(),
            wave_table: WaveTable::standard(),
            streams: RandomStreams::from_seed(seed),
        }
    }
}

/// A single play session.
#[derive(Debug)]
pub struct Session {
    world: World,
    config: GameConfig,
    streams: RandomStreams,
    summoning: Summoning,
    merging: Merging,
    targeting: UnitTargeting,
    combat: UnitCombat,
    scheduler: WaveScheduler,
    round_timer: RoundTimer,
    speed: f32,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    /// Creates a session with the shipped tables, ready to advance.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::from_setup(SessionSetup::standard(config, seed))
    }

    /// Creates a session from explicit parts, ready to advance.
    #[must_use]
    pub fn from_setup(setup: SessionSetup) -> Self {
        let SessionSetup {
            config,
            balance,
            layout,
            unit_table,
            skill_table,
            wave_table,
            streams,
        } = setup;

        let scheduler = WaveScheduler::new(wave_table, Config::new(&config, &balance));
        let round_timer = RoundTimer::new(config.round_time_limit);
        let mut session = Self {
            world: World::with_tables(layout, balance, unit_table, skill_table),
            config,
            streams,
            summoning: Summoning::new(),
            merging: Merging::new(),
            targeting: UnitTargeting::new(),
            combat: UnitCombat::new(),
            scheduler,
            round_timer,
            speed: MIN_SPEED,
            events: Vec::new(),
            commands: Vec::new(),
        };
        session.initialize();
        session
    }

    /// Advances the simulation by one frame of `dt` real time.
    pub fn advance(&mut self, dt: Duration) {
        if query::outcome(&self.world).is_some() {
            return;
        }

        let dt = self.scaled(dt);
        let frame_start = self.events.len();

        if self.round_timer.update(dt) {
            self.apply(Command::EndSession {
                outcome: SessionOutcome::Defeat {
                    cause: DefeatCause::RoundTimeExpired,
                },
            });
            self.round_timer.pause();
            return;
        }

        self.apply(Command::Tick { dt });

        let units = query::unit_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&units, &enemies, &mut self.commands);
        self.flush_commands();

        let units = query::unit_view(&self.world);
        self.combat.handle(
            &units,
            &enemies,
            query::skill_table(&self.world),
            self.streams.combat.as_mut(),
            &mut self.commands,
        );
        self.flush_commands();

        self.apply(Command::StepField { dt });

        self.scheduler.handle(
            dt,
            query::enemy_count(&self.world),
            self.streams.waves.as_mut(),
            &mut self.commands,
        );
        self.flush_commands();

        let bounties: Vec<u32> = self.events[frame_start..]
            .iter()
            .filter_map(|event| match event {
                Event::EnemyKilled { bounty, .. } => Some(*bounty),
                _ => None,
            })
            .collect();
        for amount in bounties {
            self.apply(Command::GrantGold { amount });
        }

        if query::outcome(&self.world).is_some() {
            self.round_timer.pause();
        }
    }

    /// Summons a unit drawn from the current summon level.
    pub fn request_summon(&mut self) -> Result<UnitId, ActionError> {
        if query::outcome(&self.world).is_some() {
            return Err(self.reject(PlayerAction::Summon, ActionError::SessionOver));
        }

        self.summoning.handle(
            query::summon_level(&self.world),
            query::unit_table(&self.world),
            self.streams.summon.as_mut(),
            &mut self.commands,
        );
        let Some(command) = self.commands.pop() else {
            return Err(self.reject(PlayerAction::Summon, ActionError::UnknownKind));
        };

        self.execute(command, |event| match event {
            Event::UnitSummoned { unit, .. } => Some(*unit),
            _ => None,
        })
    }

    /// Moves the occupants of `from` to `to`, swapping when `to` is occupied.
    ///
    /// Returns whether the two cells exchanged occupants.
    pub fn request_move(&mut self, from: CellCoord, to: CellCoord) -> Result<bool, ActionError> {
        self.execute(Command::MoveUnits { from, to }, |event| match event {
            Event::UnitsMoved { swapped, .. } => Some(*swapped),
            _ => None,
        })
    }

    /// Merges the three units in `cell` into one unit of the next tier.
    pub fn request_merge(&mut self, cell: CellCoord) -> Result<UnitId, ActionError> {
        if query::outcome(&self.world).is_some() {
            return Err(self.reject(PlayerAction::Merge, ActionError::SessionOver));
        }
        let Some(snapshot) = query::cell(&self.world, cell) else {
            return Err(self.reject(PlayerAction::Merge, ActionError::UnknownCell { cell }));
        };

        let proposal = self.merging.handle(
            &snapshot,
            query::unit_table(&self.world),
            self.streams.merge.as_mut(),
            &mut self.commands,
        );
        if let Err(reason) = proposal {
            self.commands.clear();
            return Err(self.reject(PlayerAction::Merge, reason));
        }
        let Some(command) = self.commands.pop() else {
            return Err(self.reject(PlayerAction::Merge, ActionError::CellNotMergeable));
        };

        self.execute(command, |event| match event {
            Event::UnitsMerged { created, .. } => Some(*created),
            _ => None,
        })
    }

    /// Sells a unit, returning the refunded gold.
    pub fn request_sell(&mut self, unit: UnitId) -> Result<u32, ActionError> {
        self.execute(Command::SellUnit { unit }, |event| match event {
            Event::UnitSold { refund, .. } => Some(*refund),
            _ => None,
        })
    }

    /// Buys one permanent upgrade level, returning the level reached.
    pub fn request_permanent_upgrade(&mut self, group: RarityGroup) -> Result<u32, ActionError> {
        self.execute(
            Command::PurchasePermanentUpgrade { group },
            |event| match event {
                Event::PermanentUpgradePurchased { level, .. } => Some(*level),
                _ => None,
            },
        )
    }

    /// Raises a unit's local level, returning the level reached.
    pub fn request_level_up(&mut self, unit: UnitId) -> Result<u8, ActionError> {
        self.execute(Command::LevelUpUnit { unit }, |event| match event {
            Event::UnitLeveled { level, .. } => Some(*level),
            _ => None,
        })
    }

    /// Raises one of a unit's skills, returning the level reached.
    pub fn request_skill_upgrade(
        &mut self,
        unit: UnitId,
        skill: SkillId,
    ) -> Result<u8, ActionError> {
        self.execute(Command::UpgradeSkill { unit, skill }, |event| match event {
            Event::SkillUpgraded { level, .. } => Some(*level),
            _ => None,
        })
    }

    /// Raises the summon progression level, returning the level reached.
    pub fn request_summon_upgrade(&mut self) -> Result<u32, ActionError> {
        self.execute(Command::UpgradeSummonLevel, |event| match event {
            Event::SummonLevelRaised { level, .. } => Some(*level),
            _ => None,
        })
    }

    /// Resolves a pointer position to a unit or else a cell.
    #[must_use]
    pub fn pointer_selected(&self, point: WorldPoint) -> Option<Selection> {
        query::select(&self.world, point)
    }

    /// Sets the game speed multiplier, clamped to `1.0..=4.0`.
    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed = if multiplier.is_finite() {
            multiplier.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            MIN_SPEED
        };
    }

    /// Current game speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Takes every event broadcast since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the session was built with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Wave scheduler state.
    #[must_use]
    pub fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Whole-round countdown.
    #[must_use]
    pub fn round_timer(&self) -> &RoundTimer {
        &self.round_timer
    }

    /// Final result, once the session ended.
    #[must_use]
    pub fn outcome(&self) -> Option<SessionOutcome> {
        query::outcome(&self.world)
    }

    fn scaled(&self, dt: Duration) -> Duration {
        let factor = self.speed * self.config.time_scale.max(0.0);
        Duration::try_from_secs_f32(dt.as_secs_f32() * factor).unwrap_or(Duration::ZERO)
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn flush_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            self.apply(command);
        }
    }

    fn execute<T>(
        &mut self,
        command: Command,
        confirm: impl Fn(&Event) -> Option<T>,
    ) -> Result<T, ActionError> {
        let start = self.events.len();
        self.apply(command);

        let emitted = &self.events[start..];
        if let Some(reason) = emitted.iter().find_map(|event| match event {
            Event::ActionRejected { reason, .. } => Some(*reason),
            _ => None,
        }) {
            return Err(reason);
        }
        emitted
            .iter()
            .find_map(confirm)
            .ok_or(ActionError::SessionOver)
    }

    fn reject(&mut self, action: PlayerAction, reason: ActionError) -> ActionError {
        log::warn!("{action:?} rejected: {reason}");
        self.events.push(Event::ActionRejected { action, reason });
        reason
    }
}

impl Lifecycle for Session {
    fn initialize(&mut self) {
        self.commands.clear();
        self.streams.rewind();
        self.summoning.reset();
        self.merging.reset();
        self.targeting.reset();
        self.combat.reset();
        self.scheduler.reset();
        self.round_timer.reset();
        self.speed = MIN_SPEED;

        self.apply(Command::ResetSession);
        self.round_timer.start();
        self.scheduler.start(0, &mut self.commands);
        self.flush_commands();
        log::info!(
            "session started: {:?}, {} waves",
            self.config.difficulty,
            self.scheduler.table().len()
        );
    }

    fn teardown(&mut self) {
        self.summoning.teardown();
        self.merging.teardown();
        self.targeting.teardown();
        self.combat.teardown();
        self.scheduler.teardown();
        self.round_timer.teardown();
        self.apply(Command::ResetSession);
        self.commands = Vec::new();
        self.events = Vec::new();
    }
}
