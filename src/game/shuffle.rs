use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

const STREAM_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeded shuffle source carried inside the game state.
///
/// Each shuffle draws from a fresh PCG stream keyed by `(seed, shuffles)`, so a
/// state restored from JSON continues the exact sequence it would have produced
/// in the original process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shuffler {
    pub seed: u64,
    #[serde(default)]
    pub shuffles: u64,
}

impl Shuffler {
    pub fn new(seed: u64) -> Self {
        Self { seed, shuffles: 0 }
    }

    fn stream(&self) -> Pcg64Mcg {
        Pcg64Mcg::seed_from_u64(self.seed ^ self.shuffles.wrapping_mul(STREAM_STEP))
    }

    /// Fisher-Yates over the slice. Bounds are drawn as `u64` so wasm32 and
    /// 64-bit hosts produce the same permutation.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        self.shuffles = self.shuffles.wrapping_add(1);
        let mut rng = self.stream();
        for i in (1..items.len()).rev() {
            let j = rng.gen_range(0..=i as u64) as usize;
            items.swap(i, j);
        }
        log::trace!(
            "shuffle #{} over {} cards (seed {})",
            self.shuffles,
            items.len(),
            self.seed
        );
    }
}
