//! Scripted player used by headless runs.

use loop_defence_core::{CellCoord, RarityGroup};
use loop_defence_session::Session;
use loop_defence_system_merging::find_mergeable;
use loop_defence_world::query;

/// Greedy policy: summon whenever affordable, merge whenever possible and
/// spend surplus gold on permanent upgrades.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Autoplay {
    upgrade_threshold: u32,
}

impl Autoplay {
    pub(crate) fn new(upgrade_threshold: u32) -> Self {
        Self { upgrade_threshold }
    }

    /// Performs every action the policy wants this frame; returns how many succeeded.
    pub(crate) fn act(&self, session: &mut Session) -> usize {
        let mut performed = 0;

        while let Some(cell) = mergeable(session) {
            if session.request_merge(cell).is_err() {
                break;
            }
            performed += 1;
        }

        while can_afford_summon(session) {
            if session.request_summon().is_err() {
                break;
            }
            performed += 1;
            if let Some(cell) = mergeable(session) {
                if session.request_merge(cell).is_ok() {
                    performed += 1;
                }
            }
        }

        if query::gold(session.world()) > self.upgrade_threshold {
            if let Some(group) = cheapest_upgrade(session) {
                if session.request_permanent_upgrade(group).is_ok() {
                    performed += 1;
                }
            }
        }

        performed
    }
}

fn mergeable(session: &Session) -> Option<CellCoord> {
    let world = session.world();
    find_mergeable(&query::cells(world), query::unit_table(world))
}

fn can_afford_summon(session: &Session) -> bool {
    let world = session.world();
    query::gold(world) >= query::balance(world).summon_cost
        && query::unit_count(world) < query::balance(world).max_units as usize
}

fn cheapest_upgrade(session: &Session) -> Option<RarityGroup> {
    let world = session.world();
    let balance = query::balance(world);
    let gold = query::gold(world);
    RarityGroup::ALL
        .into_iter()
        .map(|group| {
            let cost = balance
                .permanent_track(group)
                .cost_at(query::permanent_level(world, group));
            (group, cost)
        })
        .filter(|(_, cost)| *cost <= gold)
        .min_by_key(|(_, cost)| *cost)
        .map(|(group, _)| group)
}
