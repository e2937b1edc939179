use std::path::PathBuf;

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

/// Hands out backgrounds in shuffled order, reshuffling once every clip has been used.
pub struct BackgroundRotation {
    pool: Vec<PathBuf>,
    next: usize,
    rng: StdRng,
}

impl BackgroundRotation {
    /// Rotation over `pool`; a fixed `seed` makes the order reproducible.
    pub fn new(pool: Vec<PathBuf>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut out = Self { pool, next: 0, rng };
        out.pool.shuffle(&mut out.rng);
        out
    }

    /// Number of backgrounds in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Return `true` when there is nothing to hand out.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Next background, or `None` for an empty pool.
    pub fn next_background(&mut self) -> Option<PathBuf> {
        let picked = self.pool.get(self.next)?.clone();
        self.next += 1;
        if self.next >= self.pool.len() {
            self.pool.shuffle(&mut self.rng);
            self.next = 0;
        }
        Some(picked)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/rotation.rs"]
mod tests;
