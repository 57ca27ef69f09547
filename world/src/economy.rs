//! Gold ledger, upgrade progression and price formulas.

use loop_defence_core::{Balance, RarityGroup, Tier};

/// Gold balance and upgrade levels of the running session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EconomyLedger {
    gold: u32,
    permanent_levels: [u32; 3],
    summon_level: u32,
}

impl EconomyLedger {
    pub(crate) fn new(starting_gold: u32) -> Self {
        Self {
            gold: starting_gold,
            permanent_levels: [0; 3],
            summon_level: 1,
        }
    }

    pub(crate) fn gold(&self) -> u32 {
        self.gold
    }

    /// Deducts `amount` if the balance covers it; never partially applies.
    pub(crate) fn spend(&mut self, amount: u32) -> bool {
        match self.gold.checked_sub(amount) {
            Some(remaining) => {
                self.gold = remaining;
                true
            }
            None => false,
        }
    }

    pub(crate) fn add(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub(crate) fn permanent_level(&self, group: RarityGroup) -> u32 {
        self.permanent_levels[group.index()]
    }

    pub(crate) fn raise_permanent_level(&mut self, group: RarityGroup) -> u32 {
        let level = &mut self.permanent_levels[group.index()];
        *level = level.saturating_add(1);
        *level
    }

    pub(crate) fn summon_level(&self) -> u32 {
        self.summon_level
    }

    pub(crate) fn raise_summon_level(&mut self) -> u32 {
        self.summon_level = self.summon_level.saturating_add(1);
        self.summon_level
    }
}

/// Bonus paid for clearing the zero-based wave `index`.
pub(crate) fn wave_clear_bonus(balance: &Balance, index: u32) -> u32 {
    let exponent = i32::try_from(index).unwrap_or(i32::MAX);
    let bonus = balance.wave_clear_base * (1.0 + balance.wave_clear_growth).powi(exponent);
    (bonus.floor() as u32).max(1)
}

/// Gold owed for killing an enemy spawned with `max_hp` hit points.
pub(crate) fn kill_bounty(balance: &Balance, max_hp: u32) -> u32 {
    ((max_hp as f32 * balance.gold_per_hp).floor() as u32).max(1)
}

/// Gold refunded when selling a unit of `tier`.
pub(crate) fn sell_refund(balance: &Balance, tier: Tier) -> u32 {
    let value = balance.summon_cost as f32 * 3f32.powi(i32::from(tier.rank()) - 1);
    (value * balance.sell_return_rate).floor() as u32
}

/// Price of raising a unit of `tier` from `level` to the next level.
pub(crate) fn level_up_cost(balance: &Balance, tier: Tier, level: u8) -> u32 {
    balance
        .level_up_base_cost
        .saturating_mul(u32::from(tier.rank()))
        .saturating_mul(u32::from(level))
}

/// Price of raising the summon progression from `level` to the next level.
pub(crate) fn summon_upgrade_cost(balance: &Balance, level: u32) -> u32 {
    balance.summon_level_base_cost.saturating_add(
        balance
            .summon_level_cost_increase
            .saturating_mul(level.saturating_sub(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_is_atomic() {
        let mut ledger = EconomyLedger::new(200);
        assert!(ledger.spend(100));
        assert!(ledger.spend(100));
        assert!(!ledger.spend(100));
        assert_eq!(ledger.gold(), 0);
        ledger.add(40);
        assert!(!ledger.spend(41));
        assert_eq!(ledger.gold(), 40);
    }

    #[test]
    fn wave_bonus_compounds() {
        let balance = Balance::default();
        assert_eq!(wave_clear_bonus(&balance, 0), 50);
        assert_eq!(wave_clear_bonus(&balance, 1), 60);
        assert_eq!(wave_clear_bonus(&balance, 2), 72);
        let mut stingy = balance.clone();
        stingy.wave_clear_base = 0.0;
        assert_eq!(wave_clear_bonus(&stingy, 3), 1);
    }

    #[test]
    fn bounty_is_five_percent_with_floor_of_one() {
        let balance = Balance::default();
        assert_eq!(kill_bounty(&balance, 200), 10);
        assert_eq!(kill_bounty(&balance, 150), 7);
        assert_eq!(kill_bounty(&balance, 10), 1);
    }

    #[test]
    fn prices_follow_tier_and_level() {
        let balance = Balance::default();
        assert_eq!(sell_refund(&balance, Tier::Normal), 50);
        assert_eq!(sell_refund(&balance, Tier::Epic), 450);
        assert_eq!(level_up_cost(&balance, Tier::Rare, 3), 300);
        assert_eq!(summon_upgrade_cost(&balance, 1), 200);
        assert_eq!(summon_upgrade_cost(&balance, 4), 500);
    }

    #[test]
    fn upgrade_levels_are_tracked_per_group() {
        let mut ledger = EconomyLedger::new(0);
        assert_eq!(ledger.raise_permanent_level(RarityGroup::Epic), 1);
        assert_eq!(ledger.raise_permanent_level(RarityGroup::Epic), 2);
        assert_eq!(ledger.permanent_level(RarityGroup::NormalRare), 0);
        assert_eq!(ledger.summon_level(), 1);
        assert_eq!(ledger.raise_summon_level(), 2);
    }
}
