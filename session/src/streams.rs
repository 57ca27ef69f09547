//! Independent random streams derived from one master seed.

use loop_defence_core::{RandomSource, SeededRandom};
use sha2::{Digest, Sha256};

const STREAM_SUMMON: &str = "summon";
const STREAM_MERGE: &str = "merge";
const STREAM_COMBAT: &str = "combat";
const STREAM_WAVES: &str = "waves";

/// One random source per concern so that, for example, skill rolls never
/// shift the sequence of summon draws.
#[derive(Debug)]
pub struct RandomStreams {
    seed: Option<u64>,
    pub(crate) summon: Box<dyn RandomSource>,
    pub(crate) merge: Box<dyn RandomSource>,
    pub(crate) combat: Box<dyn RandomSource>,
    pub(crate) waves: Box<dyn RandomSource>,
}

impl RandomStreams {
    /// Seeds every stream from `seed` and the stream's label.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let stream = |label: &str| -> Box<dyn RandomSource> {
            Box::new(SeededRandom::new(derive_labeled_seed(seed, label)))
        };
        Self {
            seed: Some(seed),
            summon: stream(STREAM_SUMMON),
            merge: stream(STREAM_MERGE),
            combat: stream(STREAM_COMBAT),
            waves: stream(STREAM_WAVES),
        }
    }

    /// Uses explicit sources, typically scripted ones in tests.
    #[must_use]
    pub fn new(
        summon: Box<dyn RandomSource>,
        merge: Box<dyn RandomSource>,
        combat: Box<dyn RandomSource>,
        waves: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            seed: None,
            summon,
            merge,
            combat,
            waves,
        }
    }

    /// Master seed the streams were derived from, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Re-derives seeded streams so they replay from their first draw.
    ///
    /// Explicit sources are left where they are.
    pub(crate) fn rewind(&mut self) {
        if let Some(seed) = self.seed {
            *self = Self::from_seed(seed);
        }
    }
}

/// Derives the seed of a labelled stream from the master seed.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
