//! TOML loading for session settings and wave tables.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use loop_defence_core::{Balance, Difficulty, GameConfig, WaveTable};
use serde::Deserialize;

/// Contents of a `--config` file. Missing sections keep the shipped values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SettingsFile {
    /// Session configuration; the difficulty flag picks the preset when absent.
    pub(crate) game: Option<GameConfig>,
    /// Balance constants.
    pub(crate) balance: Balance,
}

/// Loads the settings file, or the shipped settings when no path is given.
pub(crate) fn load_settings(
    path: Option<&Path>,
    difficulty: Difficulty,
) -> Result<(GameConfig, Balance)> {
    let file = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings at {}", path.display()))?;
            parse_settings(&contents)
                .with_context(|| format!("invalid settings in {}", path.display()))?
        }
        None => SettingsFile::default(),
    };

    let config = file
        .game
        .unwrap_or_else(|| GameConfig::for_difficulty(difficulty));
    Ok((config, file.balance))
}

/// Loads a wave table, or the shipped eighty waves when no path is given.
pub(crate) fn load_waves(path: Option<&Path>) -> Result<WaveTable> {
    let Some(path) = path else {
        return Ok(WaveTable::standard());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read wave table at {}", path.display()))?;
    parse_waves(&contents).with_context(|| format!("invalid wave table in {}", path.display()))
}

fn parse_settings(contents: &str) -> Result<SettingsFile> {
    let file: SettingsFile =
        toml::from_str(contents).context("failed to parse settings toml contents")?;

    if let Some(game) = &file.game {
        if !positive(game.round_time_limit) {
            bail!("round_time_limit must be positive");
        }
        if !positive(game.wave_duration_scale) || !positive(game.spawn_interval_scale) {
            bail!("wave_duration_scale and spawn_interval_scale must be positive");
        }
        if game.time_scale < 0.0 || game.time_scale.is_nan() {
            bail!("time_scale must not be negative");
        }
    }
    if file.balance.field_cap == 0 {
        bail!("field_cap must be at least 1");
    }
    Ok(file)
}

fn parse_waves(contents: &str) -> Result<WaveTable> {
    let table: WaveTable =
        toml::from_str(contents).context("failed to parse wave table toml contents")?;
    if table.is_empty() {
        bail!("wave table contains no waves");
    }
    for (index, wave) in table.iter().enumerate() {
        if !positive(wave.duration) {
            bail!("wave {} has a non-positive duration", index + 1);
        }
        if wave.hp_scale < 0.0 || wave.speed < 0.0 {
            bail!("wave {} has negative stats", index + 1);
        }
    }
    Ok(table)
}

fn positive(value: f32) -> bool {
    value > 0.0
}
