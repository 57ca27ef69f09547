#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Loop Defence session.

mod autoplay;
mod settings;
mod summary;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use loop_defence_core::Difficulty;
use loop_defence_session::{Session, SessionSetup};

use crate::{autoplay::Autoplay, summary::RunSummary};

/// Difficulty presets selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Normal,
    Hard,
    Extreme,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Extreme => Difficulty::Extreme,
        }
    }
}

/// Runs a seeded Loop Defence session without a window.
#[derive(Debug, Parser)]
#[command(name = "loop-defence", version, about)]
struct Cli {
    /// Master seed for every random stream.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Difficulty preset, ignored when the settings file has a [game] section.
    #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
    difficulty: DifficultyArg,
    /// Game speed multiplier between 1 and 4.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Stop after this many seconds of real time.
    #[arg(long, default_value_t = 900.0)]
    duration: f32,
    /// Real time covered by one frame, in milliseconds.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,
    /// Let a scripted player summon, merge and upgrade.
    #[arg(long)]
    autoplay: bool,
    /// Gold above which the scripted player buys permanent upgrades.
    #[arg(long, default_value_t = 400)]
    upgrade_threshold: u32,
    /// TOML file with optional [game] and [balance] sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// TOML file with a [[waves]] table.
    #[arg(long)]
    waves: Option<PathBuf>,
}

/// Entry point for the Loop Defence command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let summary = run(&cli)?;
    println!("{summary}");
    Ok(())
}

fn run(cli: &Cli) -> Result<RunSummary> {
    if cli.frame_ms == 0 {
        bail!("--frame-ms must be at least 1");
    }

    let (config, balance) = settings::load_settings(cli.config.as_deref(), cli.difficulty.into())?;
    let wave_table = settings::load_waves(cli.waves.as_deref())?;

    let mut setup = SessionSetup::standard(config, cli.seed);
    setup.balance = balance;
    setup.wave_table = wave_table;
    let mut session = Session::from_setup(setup);
    session.set_speed(cli.speed);

    let policy = cli.autoplay.then(|| Autoplay::new(cli.upgrade_threshold));
    let frame = Duration::from_millis(cli.frame_ms);
    let limit = Duration::from_secs_f32(cli.duration.max(0.0));
    let mut summary = RunSummary::default();
    let mut elapsed = Duration::ZERO;

    log::info!(
        "running seed {} on {:?} for up to {:.0}s",
        cli.seed,
        session.config().difficulty,
        limit.as_secs_f32()
    );
    while session.outcome().is_none() && elapsed < limit {
        if let Some(policy) = policy {
            let _ = policy.act(&mut session);
        }
        session.advance(frame);
        elapsed += frame;

        for event in session.drain_events() {
            log::debug!("{event:?}");
            summary.record(&event);
        }
    }

    summary.elapsed = loop_defence_world::query::elapsed(session.world());
    summary.gold = loop_defence_world::query::gold(session.world());
    Ok(summary)
}
