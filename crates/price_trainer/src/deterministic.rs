//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG, seeded permutations for the train/test split
//! and row subsampling, and tie-breaking for split selection, so the same
//! seed and data always produce the same artifact.

use std::cmp::Ordering;
use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    // LCG constants (compatible with glibc)
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.wrapping_abs() % Self::MODULUS),
        }
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by the high bits; the low bits of a power-of-two LCG have short periods.
    pub fn next_range(&mut self, max: i64) -> i64 {
        if max <= 0 {
            return 0;
        }
        ((self.next_i64() as i128 * max as i128) >> 31) as i64
    }

    /// Uniform index in [0, len)
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_range(len as i64) as usize
    }
}

/// Fisher-Yates shuffle of `0..n` driven by `rng`
pub fn permutation(n: usize, rng: &mut LcgRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.next_index(i + 1);
        indices.swap(i, j);
    }
    indices
}

/// Shuffled `(train, test)` row indices.
///
/// The test side takes `ceil(n * test_size)` rows, clamped so that both
/// sides keep at least one row whenever `n >= 2`.
pub fn train_test_indices(n: usize, test_size: f64, seed: i64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = LcgRng::new(seed);
    let shuffled = permutation(n, &mut rng);

    let n_test = if n < 2 {
        0
    } else {
        ((n as f64 * test_size).ceil() as usize).clamp(1, n - 1)
    };

    let test = shuffled[..n_test].to_vec();
    let train = shuffled[n_test..].to_vec();
    (train, test)
}

/// `k` distinct indices from `0..n`, in ascending order
pub fn sample_without_replacement(n: usize, k: usize, rng: &mut LcgRng) -> Vec<usize> {
    let mut sample = permutation(n, rng);
    sample.truncate(k.min(n));
    sample.sort_unstable();
    sample
}

/// Deterministic tie-breaker for split selection
/// Lower feature index wins, then lower threshold.
#[derive(Debug, Clone, Copy)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}

impl PartialEq for SplitTieBreaker {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SplitTieBreaker {}

impl PartialOrd for SplitTieBreaker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SplitTieBreaker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }
}
