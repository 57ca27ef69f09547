#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns summon requests into concrete unit identities.
//!
//! A summon first draws a tier from weights that shift toward the higher tiers
//! as the summon level grows, then picks one variant of that tier uniformly.

use loop_defence_core::{Command, Lifecycle, RandomSource, Tier, UnitKind, UnitTable};

/// Tier weights at summon level 1, lowest tier first. They sum to 100.
pub const BASE_WEIGHTS: [f64; 5] = [78.7, 20.0, 1.0, 0.25, 0.05];

const SHIFT_PER_LEVEL: f64 = 0.5;
const NORMAL_SHARE: f64 = 0.7;
const RARE_SHARE: f64 = 0.3;
const HIGH_TIER_RATIO: [(usize, f64); 3] = [(2, 20.0), (3, 5.0), (4, 1.0)];

/// Computes the tier weights for a summon level.
///
/// Each level past the first moves half a point of weight out of the two
/// lowest tiers, split 70:30 between them and capped at what they hold, and
/// hands it to tiers 3, 4 and 5 in a 20:5:1 ratio.
#[must_use]
pub fn weights_for_level(level: u32) -> [f64; 5] {
    let shift = ((f64::from(level) - 1.0) * SHIFT_PER_LEVEL).max(0.0);
    let mut weights = BASE_WEIGHTS;

    let from_normal = (NORMAL_SHARE * shift).min(weights[0]);
    let from_rare = (RARE_SHARE * shift).min(weights[1]);
    weights[0] -= from_normal;
    weights[1] -= from_rare;

    let taken = from_normal + from_rare;
    let ratio_total: f64 = HIGH_TIER_RATIO.iter().map(|(_, ratio)| ratio).sum();
    for (slot, ratio) in HIGH_TIER_RATIO {
        weights[slot] += taken * ratio / ratio_total;
    }
    weights
}

/// Memoised weighted tier draw.
#[derive(Debug, Default)]
pub struct SummonProbabilityEngine {
    cache: Option<(u32, [f64; 5])>,
    recomputations: u64,
}

impl SummonProbabilityEngine {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights for `level`, recomputed only when the level changed.
    pub fn weights(&mut self, level: u32) -> [f64; 5] {
        match self.cache {
            Some((cached, weights)) if cached == level => weights,
            _ => {
                let weights = weights_for_level(level);
                self.cache = Some((level, weights));
                self.recomputations += 1;
                weights
            }
        }
    }

    /// Draws a tier with a cumulative-weight roll.
    pub fn draw(&mut self, level: u32, rng: &mut dyn RandomSource) -> Tier {
        let weights = self.weights(level);
        let total: f64 = weights.iter().sum();
        let roll = rng.next_unit() * total;

        let mut cumulative = 0.0;
        for (tier, weight) in Tier::ALL.into_iter().zip(weights) {
            cumulative += weight;
            if roll < cumulative {
                return tier;
            }
        }
        Tier::Mythical
    }

    /// Number of times the weights were derived from scratch.
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

/// Summoning system that emits `Command::SummonUnit` for a drawn identity.
#[derive(Debug, Default)]
pub struct Summoning {
    engine: SummonProbabilityEngine,
    candidates: Vec<UnitKind>,
}

impl Summoning {
    /// Creates a summoning system with an empty weight cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a tier and a variant within it, queueing the summon command.
    ///
    /// Nothing is emitted when the table has no variant for the drawn tier.
    pub fn handle(
        &mut self,
        summon_level: u32,
        table: &UnitTable,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Command>,
    ) {
        let tier = self.engine.draw(summon_level, rng);

        self.candidates.clear();
        self.candidates.extend(table.kinds_in_tier(tier));
        let Some(index) = rng.next_index(self.candidates.len()) else {
            log::warn!("unit table has no {tier:?} variant to summon");
            return;
        };

        out.push(Command::SummonUnit {
            kind: self.candidates[index],
        });
    }

    /// Read-only access to the probability engine.
    #[must_use]
    pub fn engine(&self) -> &SummonProbabilityEngine {
        &self.engine
    }
}

impl Lifecycle for Summoning {
    fn initialize(&mut self) {
        self.engine = SummonProbabilityEngine::new();
        self.candidates.clear();
    }

    fn teardown(&mut self) {
        self.initialize();
        self.candidates.shrink_to_fit();
    }
}
