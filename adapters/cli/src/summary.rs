//! Tally of a headless run, printed when the session ends.

use std::{fmt, time::Duration};

use loop_defence_core::{Event, SessionOutcome};

/// Counters accumulated from the event stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) summons: u32,
    pub(crate) merges: u32,
    pub(crate) sales: u32,
    pub(crate) upgrades: u32,
    pub(crate) rejections: u32,
    pub(crate) spawned: u32,
    pub(crate) kills: u32,
    pub(crate) bounty: u64,
    pub(crate) wave_bonus: u64,
    pub(crate) waves_cleared: u32,
    pub(crate) gold: u32,
    pub(crate) elapsed: Duration,
    pub(crate) outcome: Option<SessionOutcome>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::UnitSummoned { .. } => self.summons += 1,
            Event::UnitsMerged { .. } => self.merges += 1,
            Event::UnitSold { .. } => self.sales += 1,
            Event::PermanentUpgradePurchased { .. }
            | Event::SummonLevelRaised { .. }
            | Event::UnitLeveled { .. }
            | Event::SkillUpgraded { .. } => self.upgrades += 1,
            Event::ActionRejected { .. } => self.rejections += 1,
            Event::EnemySpawned { .. } => self.spawned += 1,
            Event::EnemyKilled { bounty, .. } => {
                self.kills += 1;
                self.bounty += u64::from(*bounty);
            }
            Event::WaveCleared { bonus, .. } => {
                self.waves_cleared += 1;
                self.wave_bonus += u64::from(*bonus);
            }
            Event::GoldChanged { balance, .. } => self.gold = *balance,
            Event::SessionEnded { outcome } => self.outcome = Some(*outcome),
            _ => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(SessionOutcome::Victory) => "victory".to_owned(),
            Some(SessionOutcome::Defeat { cause }) => format!("defeat ({cause:?})"),
            None => "unfinished".to_owned(),
        };
        writeln!(f, "outcome:       {outcome}")?;
        writeln!(f, "time:          {:.1}s", self.elapsed.as_secs_f32())?;
        writeln!(f, "waves cleared: {}", self.waves_cleared)?;
        writeln!(f, "enemies:       {} spawned, {} killed", self.spawned, self.kills)?;
        writeln!(
            f,
            "gold:          {} held, {} from kills, {} from waves",
            self.gold, self.bounty, self.wave_bonus
        )?;
        write!(
            f,
            "actions:       {} summons, {} merges, {} sales, {} upgrades, {} rejected",
            self.summons, self.merges, self.sales, self.upgrades, self.rejections
        )
    }
}
