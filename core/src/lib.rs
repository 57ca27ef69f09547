#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Loop Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and the session façade
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values for systems and presentation layers to react to. Systems consume
//! immutable snapshots such as [`UnitView`] and [`EnemyView`] and respond
//! exclusively with new command batches.

pub mod config;
pub mod layout;
pub mod random;
pub mod tables;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{Balance, Difficulty, GameConfig, PermanentUpgradeTrack};
pub use layout::{GridLayout, GridParams, Layout, Rect};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use tables::{
    PacingCurve, SkillDefinition, SkillEffect, SkillTable, UnitArchetype, UnitTable,
    WaveDefinition, WaveTable,
};

/// Maximum number of units a single grid cell can hold.
pub const CELL_CAPACITY: usize = 3;

/// Session-boundary hooks implemented by every stateful engine component.
///
/// Hosts call these explicitly; components keep no implicit global state.
pub trait Lifecycle {
    /// Prepares the component for a fresh session.
    fn initialize(&mut self);

    /// Returns the component to the state produced by [`Lifecycle::initialize`].
    fn reset(&mut self) {
        self.initialize();
    }

    /// Drops per-session state and releases scratch allocations.
    fn teardown(&mut self);
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Clears every runtime entity and restores the starting ledger.
    ///
    /// The grid layout survives; only occupancy is cleared.
    ResetSession,
    /// Advances unit clocks: attack timers, retarget stickiness and buffs.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records the target a unit should track from now on.
    AssignTarget {
        /// Unit whose target changes.
        unit: UnitId,
        /// Newly selected enemy, or `None` when nothing is in range.
        target: Option<EnemyId>,
    },
    /// Launches a projectile from a ready unit toward its target.
    FireProjectile {
        /// Unit that fires.
        unit: UnitId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
        /// Damage zone released where the projectile lands, if any.
        zone: Option<DamageZonePayload>,
    },
    /// Applies a temporary attack-speed buff to a unit.
    ActivateBuff {
        /// Unit receiving the buff.
        unit: UnitId,
        /// Magnitude and duration of the buff.
        buff: AttackSpeedBuff,
    },
    /// Moves enemies, resolves projectiles and ticks damage zones.
    StepField {
        /// Duration of simulated time covered by the step.
        dt: Duration,
    },
    /// Announces that a wave became active.
    BeginWave {
        /// Index of the wave within the wave table.
        wave: WaveIndex,
        /// Whether the wave is a boss wave.
        boss: bool,
    },
    /// Requests that the spawner create one enemy for the active wave.
    SpawnEnemy {
        /// Wave the enemy belongs to.
        wave: WaveIndex,
        /// Stats applied to the spawned enemy.
        template: EnemyTemplate,
        /// Positional jitter added to the seat position.
        offset: WorldPoint,
    },
    /// Marks a wave as cleared and pays the wave-clear bonus.
    ClearWave {
        /// Wave that was cleared.
        wave: WaveIndex,
    },
    /// Ends the session with the provided outcome.
    EndSession {
        /// Final result of the session.
        outcome: SessionOutcome,
    },
    /// Credits gold to the ledger, typically a kill bounty.
    GrantGold {
        /// Amount of gold to add.
        amount: u32,
    },
    /// Summons a unit of the provided kind onto the grid.
    SummonUnit {
        /// Concrete unit identity selected by the summoning system.
        kind: UnitKind,
    },
    /// Moves or swaps the occupants of two cells.
    MoveUnits {
        /// Cell whose occupants are moved.
        from: CellCoord,
        /// Destination cell.
        to: CellCoord,
    },
    /// Combines three identical units in a cell into one unit of the next tier.
    CombineCell {
        /// Cell holding the three units.
        cell: CellCoord,
        /// Identity of the unit created by the merge.
        result: UnitKind,
    },
    /// Sells a unit for a partial refund.
    SellUnit {
        /// Unit to sell.
        unit: UnitId,
    },
    /// Raises the local level of a unit.
    LevelUpUnit {
        /// Unit to level up.
        unit: UnitId,
    },
    /// Purchases one level of the permanent upgrade for a rarity group.
    PurchasePermanentUpgrade {
        /// Rarity group to upgrade.
        group: RarityGroup,
    },
    /// Raises the summon progression level by one.
    UpgradeSummonLevel,
    /// Raises the level of one of a unit's skills.
    UpgradeSkill {
        /// Unit that owns the skill.
        unit: UnitId,
        /// Skill to upgrade.
        skill: SkillId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that every runtime entity was cleared.
    SessionReset,
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Unit that fired.
        unit: UnitId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
    },
    /// Reports that a projectile left the playfield without hitting anything.
    ProjectileExpired {
        /// Projectile that was discarded.
        projectile: ProjectileId,
    },
    /// Reports that a unit gained a temporary attack-speed buff.
    BuffActivated {
        /// Buffed unit.
        unit: UnitId,
        /// Buff applied to the unit.
        buff: AttackSpeedBuff,
    },
    /// Confirms that an enemy entered the loop.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Wave the enemy belongs to.
        wave: WaveIndex,
        /// Spawn position.
        position: WorldPoint,
        /// Hit points assigned at spawn.
        max_hp: u32,
    },
    /// Reports damage dealt to an enemy that survived the hit.
    EnemyDamaged {
        /// Damaged enemy.
        enemy: EnemyId,
        /// Damage applied.
        damage: u32,
        /// Hit points left after the hit.
        remaining: u32,
    },
    /// Reports that an enemy died and the bounty it pays out.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Position where the enemy died.
        position: WorldPoint,
        /// Hit points the enemy spawned with.
        max_hp: u32,
        /// Gold owed for the kill.
        bounty: u32,
    },
    /// Announces that a damage zone was placed on the field.
    DamageZoneCreated {
        /// Identifier assigned to the zone.
        zone: ZoneId,
        /// Center of the zone.
        position: WorldPoint,
        /// Radius of the zone.
        radius: f32,
    },
    /// Announces that a damage zone burned out.
    DamageZoneExpired {
        /// Zone that expired.
        zone: ZoneId,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// Wave that started.
        wave: WaveIndex,
    },
    /// Announces the start of a boss wave, in addition to [`Event::WaveStarted`].
    BossWaveStarted {
        /// Boss wave that started.
        wave: WaveIndex,
    },
    /// Announces that a wave was cleared.
    WaveCleared {
        /// Wave that was cleared.
        wave: WaveIndex,
        /// Gold bonus credited for the clear.
        bonus: u32,
    },
    /// Announces the end of the session.
    SessionEnded {
        /// Final result of the session.
        outcome: SessionOutcome,
    },
    /// Reports a change of the gold balance.
    GoldChanged {
        /// Balance after the change.
        balance: u32,
        /// Signed change applied to the balance.
        delta: i64,
    },
    /// Confirms that a unit was summoned onto the grid.
    UnitSummoned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Identity of the unit.
        kind: UnitKind,
        /// Cell the unit was placed into.
        cell: CellCoord,
    },
    /// Confirms that a unit was sold.
    UnitSold {
        /// Unit that was sold.
        unit: UnitId,
        /// Identity of the sold unit.
        kind: UnitKind,
        /// Gold refunded for the sale.
        refund: u32,
    },
    /// Confirms that three units were merged into one of the next tier.
    UnitsMerged {
        /// Units consumed by the merge.
        consumed: [UnitId; 3],
        /// Unit created by the merge.
        created: UnitId,
        /// Identity of the created unit.
        kind: UnitKind,
        /// Tier of the consumed units.
        tier_before: Tier,
        /// Tier of the created unit.
        tier_after: Tier,
        /// Cell the created unit was placed into.
        cell: CellCoord,
    },
    /// Confirms that a unit gained a level.
    UnitLeveled {
        /// Unit that levelled up.
        unit: UnitId,
        /// Level reached.
        level: u8,
        /// Attack value after the level-up.
        attack: u32,
    },
    /// Confirms that a unit's skill gained a level.
    SkillUpgraded {
        /// Unit owning the skill.
        unit: UnitId,
        /// Upgraded skill.
        skill: SkillId,
        /// Level reached.
        level: u8,
    },
    /// Confirms the purchase of a permanent upgrade level.
    PermanentUpgradePurchased {
        /// Upgraded rarity group.
        group: RarityGroup,
        /// Level reached by the group.
        level: u32,
        /// Gold spent on the purchase.
        cost: u32,
    },
    /// Confirms that the summon progression level increased.
    SummonLevelRaised {
        /// Level reached.
        level: u32,
        /// Gold spent on the upgrade.
        cost: u32,
    },
    /// Confirms that the occupants of two cells were moved or swapped.
    UnitsMoved {
        /// Source cell of the request.
        from: CellCoord,
        /// Target cell of the request.
        to: CellCoord,
        /// Whether the two cells exchanged occupants.
        swapped: bool,
    },
    /// Reports the occupancy of a cell after it changed.
    CellOccupancyChanged {
        /// Cell whose occupancy changed.
        cell: CellCoord,
        /// Identity held by the cell, if any.
        kind: Option<UnitKind>,
        /// Number of occupants after the change.
        occupants: usize,
    },
    /// Reports that a player action was rejected without mutating state.
    ActionRejected {
        /// Action that was attempted.
        action: PlayerAction,
        /// Specific reason the action failed.
        reason: ActionError,
    },
}

/// Discrete player actions the world validates before executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Summoning a new unit.
    Summon,
    /// Moving or swapping cell occupants.
    Move,
    /// Merging three identical units.
    Merge,
    /// Selling a unit.
    Sell,
    /// Levelling up a unit.
    LevelUp,
    /// Buying a permanent upgrade level.
    PermanentUpgrade,
    /// Raising the summon progression level.
    SummonUpgrade,
    /// Raising a unit's skill level.
    SkillUpgrade,
}

/// Reasons a player action may be rejected.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum ActionError {
    /// The ledger cannot cover the cost of the action.
    #[error("not enough gold: {required} required, {available} available")]
    InsufficientGold {
        /// Gold the action costs.
        required: u32,
        /// Gold currently held.
        available: u32,
    },
    /// The live-unit cap is reached.
    #[error("unit limit of {limit} reached")]
    UnitLimitReached {
        /// Configured maximum number of live units.
        limit: u32,
    },
    /// No cell can accept the unit.
    #[error("no eligible cell for placement")]
    NoEligibleCell,
    /// The referenced cell lies outside the grid.
    #[error("cell ({}, {}) lies outside the grid", .cell.column(), .cell.row())]
    UnknownCell {
        /// Offending cell coordinate.
        cell: CellCoord,
    },
    /// The source cell of a move holds no units.
    #[error("source cell is empty")]
    EmptyCell,
    /// Source and target of a move are the same cell.
    #[error("source and target are the same cell")]
    SameCell,
    /// The move exceeds the configured move range.
    #[error("target is {distance} cells away, beyond the move range of {range}")]
    OutOfMoveRange {
        /// Manhattan distance between source and target.
        distance: u32,
        /// Configured move range.
        range: u32,
    },
    /// The cell does not hold three identical units below the top tier.
    #[error("cell does not hold three mergeable units")]
    CellNotMergeable,
    /// The proposed merge result does not belong to the next tier.
    #[error("merge result does not belong to the next tier")]
    InvalidMergeResult,
    /// No unit with the provided identifier exists.
    #[error("unknown unit")]
    UnknownUnit,
    /// The unit kind is missing from the unit table.
    #[error("unknown unit kind")]
    UnknownKind,
    /// The unit does not carry the requested skill.
    #[error("unit does not have that skill")]
    UnknownSkill,
    /// The unit, skill or progression is already at its maximum level.
    #[error("already at maximum level")]
    MaxLevel,
    /// The session has ended and accepts no further actions.
    #[error("session has ended")]
    SessionOver,
}

/// Reasons a grid cell refuses a new occupant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum OccupancyError {
    /// The cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The cell already holds the maximum number of units.
    #[error("cell is full")]
    Full,
    /// The cell holds units of a different identity.
    #[error("cell holds a different unit identity")]
    IdentityMismatch,
}

/// Final result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The final wave of the table was cleared.
    Victory,
    /// The session was lost.
    Defeat {
        /// Condition that ended the session.
        cause: DefeatCause,
    },
}

/// Conditions that end a session in defeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefeatCause {
    /// The live enemy count reached the field cap.
    FieldOverrun,
    /// A boss wave ran out of time.
    BossTimeout,
    /// A normal wave ran out of time with enemies alive under a strict policy.
    WaveTimeout,
    /// The round time limit elapsed.
    RoundTimeExpired,
}

/// One of the five power levels a unit can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Rank 1.
    Normal,
    /// Rank 2.
    Rare,
    /// Rank 3.
    Epic,
    /// Rank 4.
    Legendary,
    /// Rank 5.
    Mythical,
}

impl Tier {
    /// Every tier from lowest to highest.
    pub const ALL: [Tier; 5] = [
        Tier::Normal,
        Tier::Rare,
        Tier::Epic,
        Tier::Legendary,
        Tier::Mythical,
    ];

    /// Rank of the tier, starting at 1.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Zero-based position of the tier within [`Tier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legendary => 3,
            Self::Mythical => 4,
        }
    }

    /// Resolves a tier from its rank.
    #[must_use]
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank).checked_sub(1)?).copied()
    }

    /// Tier produced by merging three units of this tier.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Rarity group sharing the permanent-upgrade track of this tier.
    #[must_use]
    pub const fn rarity_group(self) -> RarityGroup {
        match self {
            Self::Normal | Self::Rare => RarityGroup::NormalRare,
            Self::Epic => RarityGroup::Epic,
            Self::Legendary | Self::Mythical => RarityGroup::LegendaryMythical,
        }
    }
}

/// Grouping of tiers that share one permanent-upgrade progression track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RarityGroup {
    /// Tiers 1 and 2.
    NormalRare,
    /// Tier 3.
    Epic,
    /// Tiers 4 and 5.
    LegendaryMythical,
}

impl RarityGroup {
    /// Every rarity group in track order.
    pub const ALL: [RarityGroup; 3] = [
        RarityGroup::NormalRare,
        RarityGroup::Epic,
        RarityGroup::LegendaryMythical,
    ];

    /// Zero-based position of the group within [`RarityGroup::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::NormalRare => 0,
            Self::Epic => 1,
            Self::LegendaryMythical => 2,
        }
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a damage zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Creates a new zone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Concrete unit identity: one named variant within a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKind(u16);

impl UnitKind {
    /// Creates a unit kind from its table identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the table identifier of the kind.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a skill within the skill table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(u16);

impl SkillId {
    /// Creates a skill identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Zero-based position of a wave within the wave table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Creates a wave index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the following wave.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Continuous position on the playfield measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate, growing downwards.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the point shifted by the provided offset.
    #[must_use]
    pub fn offset_by(self, offset: WorldPoint) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Stats handed to the spawner for every enemy of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Multiplier applied to the base enemy hit points.
    pub hp_scale: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Whether the enemy is a boss.
    pub boss: bool,
}

/// Temporary attack-speed buff granted by a skill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackSpeedBuff {
    /// Fractional speed bonus, `0.2` meaning 20% faster attacks.
    pub bonus: f32,
    /// Remaining duration in seconds.
    pub duration: f32,
}

/// Damage zone carried by a projectile and released on impact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageZonePayload {
    /// Radius of the zone in world units.
    pub radius: f32,
    /// Lifetime of the zone in seconds.
    pub duration: f32,
    /// Damage applied to every enemy inside the zone per tick.
    pub tick_damage: f32,
    /// Seconds between two damage ticks.
    pub tick_interval: f32,
}

/// Result of resolving a pointer position against the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selection {
    /// The pointer rests on a unit.
    Unit {
        /// Selected unit.
        unit: UnitId,
        /// Cell holding the unit.
        cell: CellCoord,
    },
    /// The pointer rests on a cell but not on a unit.
    Cell {
        /// Selected cell.
        cell: CellCoord,
    },
}

/// Skill carried by a unit together with its current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillSlot {
    /// Skill identifier.
    pub skill: SkillId,
    /// Current level, starting at 1.
    pub level: u8,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Concrete identity of the unit.
    pub kind: UnitKind,
    /// Tier of the unit.
    pub tier: Tier,
    /// Local level of the unit.
    pub level: u8,
    /// Damage dealt per projectile.
    pub attack: u32,
    /// Attacking range in world units.
    pub range: f32,
    /// Cell currently holding the unit.
    pub cell: Option<CellCoord>,
    /// World position of the unit within its cell.
    pub position: WorldPoint,
    /// Enemy the unit currently tracks.
    pub target: Option<EnemyId>,
    /// Whether the retarget stickiness delay has elapsed.
    pub retarget_ready: bool,
    /// Whether enough time elapsed since the last attack.
    pub attack_ready: bool,
    /// Skills carried by the unit.
    pub skills: Vec<SkillSlot>,
}

/// Read-only snapshot describing all units on the grid.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a unit.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of units captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy by the world.
    pub id: EnemyId,
    /// Current world position.
    pub position: WorldPoint,
    /// Index of the loop waypoint the enemy walks toward.
    pub waypoint_index: usize,
    /// Remaining hit points.
    pub hp: u32,
    /// Hit points the enemy spawned with.
    pub max_hp: u32,
    /// Whether the enemy is a boss.
    pub boss: bool,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of an enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of one grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSnapshot {
    /// Coordinate of the cell.
    pub coord: CellCoord,
    /// World-space center of the cell.
    pub center: WorldPoint,
    /// Identity shared by the occupants, if any.
    pub kind: Option<UnitKind>,
    /// Occupants in slot order.
    pub occupants: Vec<UnitId>,
}

impl CellSnapshot {
    /// Reports whether the cell holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Reports whether the cell holds the maximum number of units.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.occupants.len() >= CELL_CAPACITY
    }
}
