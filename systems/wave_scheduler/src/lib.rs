#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling system: pacing, spawning, completion and session outcome.
//!
//! The scheduler walks the wave table in order. Each tick it advances the
//! active wave's timers, emits `Command::SpawnEnemy` at the computed cadence
//! and decides whether the wave was cleared, the session was lost, or the
//! final wave was beaten.

mod round_timer;

use std::time::Duration;

use loop_defence_core::{
    Balance, Command, DefeatCause, GameConfig, Lifecycle, RandomSource, SessionOutcome,
    WaveDefinition, WaveIndex, WaveTable, WorldPoint,
};

pub use round_timer::RoundTimer;

/// Slack allowed when comparing the spawn timer with the interval.
///
/// The final spawn of a wave is due exactly when its timer runs out, and
/// accumulated `f32` rounding must not push it past the wave's end.
const SPAWN_TIMER_SLACK: f32 = 1e-3;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    wave_duration_scale: f32,
    spawn_interval_scale: f32,
    wave_timeout_fails: bool,
    min_interval: f32,
    empty_wave_interval: f32,
    field_cap: u32,
    spawn_offset_spread: f32,
}

impl Config {
    /// Derives the scheduler parameters from the session configuration.
    #[must_use]
    pub fn new(game: &GameConfig, balance: &Balance) -> Self {
        Self {
            wave_duration_scale: game.wave_duration_scale,
            spawn_interval_scale: game.spawn_interval_scale,
            wave_timeout_fails: game.wave_timeout_fails,
            min_interval: balance.min_spawn_interval,
            empty_wave_interval: balance.empty_wave_interval,
            field_cap: balance.field_cap,
            spawn_offset_spread: balance.spawn_offset_spread,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(&GameConfig::default(), &Balance::default())
    }
}

/// Lifecycle of the active wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// No wave has been started.
    #[default]
    Idle,
    /// Enemies remain to be spawned.
    Spawning,
    /// Every enemy was spawned; waiting for the field to clear.
    Draining,
    /// The session reached an outcome.
    Complete,
}

/// Runtime state of the active wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveRuntime {
    index: WaveIndex,
    duration: f32,
    time_left: f32,
    spawn_left: u32,
    spawn_timer: f32,
    interval: f32,
}

impl WaveRuntime {
    /// Index of the wave within the table.
    #[must_use]
    pub fn index(&self) -> WaveIndex {
        self.index
    }

    /// Scaled duration of the wave in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds left before the wave times out.
    #[must_use]
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// Enemies that remain to be spawned.
    #[must_use]
    pub fn spawn_left(&self) -> u32 {
        self.spawn_left
    }

    /// Spawn interval computed on the most recent tick.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.time_left / self.duration).clamp(0.0, 1.0)
    }
}

/// Computes the spawn interval of a wave at `progress` in `[0, 1]`.
///
/// Boss waves spawn without delay. A positive override wins over the
/// automatic cadence, which spreads the wave's enemies over its duration and
/// is shaped by the pacing curve. Every non-boss interval is floored.
#[must_use]
pub fn compute_interval(
    wave: &WaveDefinition,
    duration: f32,
    progress: f32,
    config: &Config,
) -> f32 {
    if wave.boss {
        return 0.0;
    }
    if let Some(interval) = wave.spawn_interval.filter(|interval| *interval > 0.0) {
        return (interval * config.spawn_interval_scale).max(config.min_interval);
    }

    let automatic = if wave.count == 0 {
        config.empty_wave_interval
    } else {
        duration / wave.count as f32
    };
    let paced = automatic * wave.pacing.unwrap_or_default().factor(progress);
    (paced * config.spawn_interval_scale).max(config.min_interval)
}

/// Wave scheduler that owns the wave table and the active wave's runtime.
#[derive(Debug)]
pub struct WaveScheduler {
    table: WaveTable,
    config: Config,
    runtime: Option<WaveRuntime>,
    phase: WavePhase,
}

impl WaveScheduler {
    /// Creates an idle scheduler for the provided table.
    #[must_use]
    pub fn new(table: WaveTable, config: Config) -> Self {
        Self {
            table,
            config,
            runtime: None,
            phase: WavePhase::Idle,
        }
    }

    /// Current phase of the scheduler.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Runtime of the active wave, if any.
    #[must_use]
    pub fn runtime(&self) -> Option<&WaveRuntime> {
        self.runtime.as_ref()
    }

    /// Wave table driving the scheduler.
    #[must_use]
    pub fn table(&self) -> &WaveTable {
        &self.table
    }

    /// Starts the wave at `index`, emitting `Command::BeginWave`.
    ///
    /// An index past the end of the table ends the session in victory.
    pub fn start(&mut self, index: usize, out: &mut Vec<Command>) {
        let Some(wave) = self.table.get(index) else {
            self.finish(SessionOutcome::Victory, out);
            return;
        };

        let duration = (wave.duration * self.config.wave_duration_scale).max(1.0);
        let mut runtime = WaveRuntime {
            index: WaveIndex::new(u32::try_from(index).unwrap_or(u32::MAX)),
            duration,
            time_left: duration,
            spawn_left: wave.count,
            spawn_timer: 0.0,
            interval: 0.0,
        };
        runtime.interval = compute_interval(wave, duration, 0.0, &self.config);

        out.push(Command::BeginWave {
            wave: runtime.index,
            boss: wave.boss,
        });
        self.runtime = Some(runtime);
        self.phase = WavePhase::Spawning;
    }

    /// Advances the active wave by `dt`.
    ///
    /// `alive` is the number of live enemies before this tick's spawns.
    pub fn handle(
        &mut self,
        dt: Duration,
        alive: usize,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Command>,
    ) {
        if matches!(self.phase, WavePhase::Idle | WavePhase::Complete) {
            return;
        }
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };
        let index = usize::try_from(runtime.index.get()).unwrap_or(usize::MAX);
        let Some(wave) = self.table.get(index) else {
            return;
        };

        let seconds = dt.as_secs_f32();
        runtime.time_left = (runtime.time_left - seconds).max(0.0);
        let spawned = if wave.boss {
            spawn_boss(runtime, wave, out)
        } else {
            spawn_paced(runtime, wave, seconds, &self.config, rng, out)
        };
        if runtime.spawn_left == 0 {
            self.phase = WavePhase::Draining;
        }

        let alive = alive.saturating_add(spawned);
        let boss = wave.boss;
        let wave_index = runtime.index;
        let timed_out = runtime.time_left <= 0.0;
        let last = index + 1 >= self.table.len();

        if alive >= self.config.field_cap as usize {
            self.finish(
                SessionOutcome::Defeat {
                    cause: DefeatCause::FieldOverrun,
                },
                out,
            );
        } else if self.phase == WavePhase::Draining && alive == 0 {
            self.clear(wave_index, index, out);
        } else if timed_out {
            if boss {
                self.finish(
                    SessionOutcome::Defeat {
                        cause: DefeatCause::BossTimeout,
                    },
                    out,
                );
            } else if self.config.wave_timeout_fails && alive > 0 {
                self.finish(
                    SessionOutcome::Defeat {
                        cause: DefeatCause::WaveTimeout,
                    },
                    out,
                );
            } else if !last {
                self.clear(wave_index, index, out);
            }
        }
    }

    fn clear(&mut self, wave: WaveIndex, index: usize, out: &mut Vec<Command>) {
        out.push(Command::ClearWave { wave });
        self.start(index + 1, out);
    }

    fn finish(&mut self, outcome: SessionOutcome, out: &mut Vec<Command>) {
        log::info!("wave scheduler finished with {outcome:?}");
        out.push(Command::EndSession { outcome });
        self.phase = WavePhase::Complete;
    }
}

impl Lifecycle for WaveScheduler {
    fn initialize(&mut self) {
        self.runtime = None;
        self.phase = WavePhase::Idle;
    }

    fn teardown(&mut self) {
        self.initialize();
    }
}

fn spawn_boss(runtime: &mut WaveRuntime, wave: &WaveDefinition, out: &mut Vec<Command>) -> usize {
    runtime.interval = 0.0;
    if runtime.spawn_left == 0 {
        return 0;
    }
    runtime.spawn_left -= 1;
    out.push(Command::SpawnEnemy {
        wave: runtime.index,
        template: wave.enemy_template(),
        offset: WorldPoint::default(),
    });
    1
}

fn spawn_paced(
    runtime: &mut WaveRuntime,
    wave: &WaveDefinition,
    seconds: f32,
    config: &Config,
    rng: &mut dyn RandomSource,
    out: &mut Vec<Command>,
) -> usize {
    runtime.interval = compute_interval(wave, runtime.duration, runtime.progress(), config);
    runtime.spawn_timer += seconds;

    let batch_size = wave.batch_size.unwrap_or(1).max(1);
    let jitter = wave.jitter.unwrap_or(0.0).max(0.0);
    let mut spawned = 0;
    while runtime.spawn_left > 0 && runtime.spawn_timer + SPAWN_TIMER_SLACK >= runtime.interval {
        let batch = batch_size.min(runtime.spawn_left);
        for _ in 0..batch {
            let offset = WorldPoint::new(
                (rng.next_unit() as f32 - 0.5) * config.spawn_offset_spread,
                (rng.next_unit() as f32 - 0.5) * config.spawn_offset_spread,
            );
            out.push(Command::SpawnEnemy {
                wave: runtime.index,
                template: wave.enemy_template(),
                offset,
            });
        }
        runtime.spawn_left -= batch;
        spawned += batch as usize;

        let noise = if jitter > 0.0 {
            rng.next_signed() as f32 * jitter
        } else {
            0.0
        };
        runtime.spawn_timer -= (runtime.interval + noise).max(config.min_interval);
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_defence_core::{PacingCurve, ScriptedRandom};

    fn single_wave(wave: WaveDefinition) -> WaveScheduler {
        WaveScheduler::new(WaveTable::new(vec![wave]), Config::default())
    }

    #[test]
    fn boss_interval_is_zero() {
        let mut boss = WaveDefinition::boss(60.0, 1, 150.0, 100.0);
        boss.spawn_interval = Some(3.0);
        boss.pacing = Some(PacingCurve::EaseIn);
        assert_eq!(compute_interval(&boss, 60.0, 0.5, &Config::default()), 0.0);
    }

    #[test]
    fn override_beats_pacing_curve() {
        let mut wave = WaveDefinition::new(20.0, 10, 1.0, 80.0);
        wave.spawn_interval = Some(0.8);
        wave.pacing = Some(PacingCurve::EaseOut);
        for progress in [0.0, 0.5, 1.0] {
            assert!((compute_interval(&wave, 20.0, progress, &Config::default()) - 0.8).abs() < 1e-6);
        }
    }

    #[test]
    fn automatic_interval_follows_pacing() {
        let mut wave = WaveDefinition::new(20.0, 10, 1.0, 80.0);
        let config = Config::default();
        assert!((compute_interval(&wave, 20.0, 0.3, &config) - 2.0).abs() < 1e-6);
        wave.pacing = Some(PacingCurve::EaseIn);
        assert!((compute_interval(&wave, 20.0, 1.0, &config) - 1.0).abs() < 1e-6);
        wave.pacing = Some(PacingCurve::EaseOut);
        assert!((compute_interval(&wave, 20.0, 0.0, &config) - 1.0).abs() < 1e-6);
        let empty = WaveDefinition::new(20.0, 0, 1.0, 80.0);
        assert!((compute_interval(&empty, 20.0, 0.0, &config) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn intervals_are_floored() {
        let mut wave = WaveDefinition::new(1.0, 1_000, 1.0, 80.0);
        let config = Config::default();
        assert!((compute_interval(&wave, 1.0, 0.0, &config) - 0.05).abs() < 1e-6);
        wave.spawn_interval = Some(0.01);
        assert!((compute_interval(&wave, 1.0, 0.0, &config) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn non_positive_override_falls_back_to_automatic_cadence() {
        let mut wave = WaveDefinition::new(20.0, 10, 1.0, 80.0);
        let config = Config::default();
        for interval in [0.0, -1.0] {
            wave.spawn_interval = Some(interval);
            assert!((compute_interval(&wave, 20.0, 0.3, &config) - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn start_scales_duration_and_announces_wave() {
        let mut game = GameConfig::default();
        game.wave_duration_scale = 0.01;
        let mut scheduler = WaveScheduler::new(
            WaveTable::new(vec![WaveDefinition::boss(60.0, 1, 150.0, 100.0)]),
            Config::new(&game, &Balance::default()),
        );
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        assert_eq!(
            out,
            vec![Command::BeginWave {
                wave: WaveIndex::new(0),
                boss: true
            }]
        );
        let runtime = scheduler.runtime().expect("active wave");
        assert_eq!(runtime.duration(), 1.0);
        assert_eq!(runtime.spawn_left(), 1);
        assert_eq!(scheduler.phase(), WavePhase::Spawning);
    }

    #[test]
    fn field_cap_ends_the_session() {
        let mut scheduler = single_wave(WaveDefinition::new(20.0, 5, 1.0, 80.0));
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();

        scheduler.handle(Duration::from_millis(10), 99, &mut rng, &mut out);
        assert!(out.is_empty());

        scheduler.handle(Duration::from_millis(10), 100, &mut rng, &mut out);
        assert_eq!(
            out,
            vec![Command::EndSession {
                outcome: SessionOutcome::Defeat {
                    cause: DefeatCause::FieldOverrun
                }
            }]
        );
        assert_eq!(scheduler.phase(), WavePhase::Complete);
    }

    #[test]
    fn empty_wave_clears_without_spawning() {
        let mut scheduler = single_wave(WaveDefinition::new(20.0, 0, 1.0, 80.0));
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();
        scheduler.handle(Duration::from_millis(16), 0, &mut rng, &mut out);
        assert_eq!(
            out,
            vec![
                Command::ClearWave {
                    wave: WaveIndex::new(0)
                },
                Command::EndSession {
                    outcome: SessionOutcome::Victory
                },
            ]
        );
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn boss_timeout_is_a_loss() {
        let mut scheduler = single_wave(WaveDefinition::boss(60.0, 1, 150.0, 100.0));
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();

        scheduler.handle(Duration::from_millis(16), 0, &mut rng, &mut out);
        assert!(matches!(out.as_slice(), [Command::SpawnEnemy { .. }]));
        out.clear();

        scheduler.handle(Duration::from_secs(61), 1, &mut rng, &mut out);
        assert_eq!(
            out,
            vec![Command::EndSession {
                outcome: SessionOutcome::Defeat {
                    cause: DefeatCause::BossTimeout
                }
            }]
        );
    }

    #[test]
    fn tolerated_timeout_advances_to_next_wave() {
        let table = WaveTable::new(vec![
            WaveDefinition::new(2.0, 1, 1.0, 80.0),
            WaveDefinition::new(2.0, 1, 1.0, 80.0),
        ]);
        let mut scheduler = WaveScheduler::new(table, Config::default());
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();

        scheduler.handle(Duration::from_secs(3), 1, &mut rng, &mut out);
        assert_eq!(
            out[1..],
            [
                Command::ClearWave {
                    wave: WaveIndex::new(0)
                },
                Command::BeginWave {
                    wave: WaveIndex::new(1),
                    boss: false
                },
            ]
        );

        out.clear();
        scheduler.handle(Duration::from_secs(3), 2, &mut rng, &mut out);
        assert_eq!(out.len(), 1, "final wave drains instead of clearing");
        assert_eq!(scheduler.phase(), WavePhase::Draining);
    }

    #[test]
    fn strict_timeout_is_a_loss_with_enemies_alive() {
        let mut game = GameConfig::default();
        game.wave_timeout_fails = true;
        let mut scheduler = WaveScheduler::new(
            WaveTable::new(vec![
                WaveDefinition::new(2.0, 0, 1.0, 80.0),
                WaveDefinition::new(2.0, 0, 1.0, 80.0),
            ]),
            Config::new(&game, &Balance::default()),
        );
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();
        scheduler.handle(Duration::from_secs(3), 4, &mut rng, &mut out);
        assert_eq!(
            out,
            vec![Command::EndSession {
                outcome: SessionOutcome::Defeat {
                    cause: DefeatCause::WaveTimeout
                }
            }]
        );
    }

    #[test]
    fn batches_release_several_enemies_per_trigger() {
        let mut wave = WaveDefinition::new(10.0, 5, 1.0, 80.0);
        wave.spawn_interval = Some(1.0);
        wave.batch_size = Some(2);
        let mut scheduler = single_wave(wave);
        let mut rng = ScriptedRandom::constant(0.5);
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        out.clear();

        scheduler.handle(Duration::from_secs(1), 1, &mut rng, &mut out);
        assert_eq!(out.len(), 2);
        scheduler.handle(Duration::from_secs(2), 1, &mut rng, &mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(scheduler.runtime().map(WaveRuntime::spawn_left), Some(0));
    }

    #[test]
    fn lifecycle_reset_returns_to_idle() {
        let mut scheduler = single_wave(WaveDefinition::new(20.0, 5, 1.0, 80.0));
        let mut out = Vec::new();
        scheduler.start(0, &mut out);
        scheduler.reset();
        assert_eq!(scheduler.phase(), WavePhase::Idle);
        assert!(scheduler.runtime().is_none());
        out.clear();
        scheduler.handle(
            Duration::from_secs(1),
            0,
            &mut ScriptedRandom::constant(0.5),
            &mut out,
        );
        assert!(out.is_empty());
    }
}
