#![forbid(unsafe_code)]

//! Seedable pseudo-random source with pick, weighted-pick and shuffle.
//!
//! # Invariants
//!
//! 1. Two sources built with the same seed produce identical draws for the
//!    same call sequence.
//! 2. Degenerate inputs never panic: empty ranges return their lower bound,
//!    empty slices and zero total weight yield `None`.

use std::fmt;

use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A per-instance random source.
///
/// Cloning forks the stream: the clone continues from the same state and
/// then evolves independently.
#[derive(Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}

impl RandomSource {
    /// Deterministic source for a given seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn value(&mut self) -> f32 {
        self.rng.gen_range(0.0f32..1.0)
    }

    /// Fair coin flip.
    pub fn bool(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Fair coin flip as `0` or `1`.
    pub fn flag(&mut self) -> u8 {
        u8::from(self.bool())
    }

    /// Uniform integer in `0..max`. Returns `0` when `max == 0`.
    pub fn below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }

    /// Uniform draw from the half-open range `[min, max)`.
    ///
    /// Returns `min` when the range is empty (`min >= max`).
    pub fn range<X>(&mut self, min: X, max: X) -> X
    where
        X: SampleUniform + PartialOrd + Copy,
    {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.below(items.len()))
    }

    /// Element chosen with probability proportional to `weight`.
    ///
    /// Draws `r` uniformly from `0..total` and returns the first element whose
    /// cumulative weight exceeds `r`. Elements of weight zero are never
    /// chosen; a zero total yields `None`.
    pub fn pick_weighted<'a, T>(
        &mut self,
        items: &'a [T],
        weight: impl Fn(&T) -> u32,
    ) -> Option<&'a T> {
        let total: u64 = items.iter().map(|item| u64::from(weight(item))).sum();
        if total == 0 {
            return None;
        }
        let rate = self.rng.gen_range(0..total);
        let mut current = 0u64;
        items.iter().find(|item| {
            current += u64::from(weight(*item));
            rate < current
        })
    }

    /// Shuffle in place (Fisher–Yates, walking down from the last index).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for n in (1..items.len()).rev() {
            let k = self.rng.gen_range(0..=n);
            items.swap(k, n);
        }
    }

    /// Shuffle an owned vector and hand it back.
    #[must_use]
    pub fn shuffled<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        self.shuffle(&mut items);
        items
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
