//! Deterministic utilities for reproducible training
//!
//! A seeded LCG drives the train/holdout shuffle and split ties are broken by
//! a total order, so the same dataset and seed always give the same model.

use std::num::Wrapping;

use crate::errors::TrainerError;

/// Linear congruential generator (Knuth MMIX constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: Wrapping(seed),
        };
        // Decorrelate small seeds
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 >> 32) as u32
    }

    /// Uniform value in `[0, bound)` (Lemire's multiply-shift, rejection free
    /// bias is below 2^-32 for the row counts handled here).
    pub fn next_below(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        let wide = u64::from(self.next_u32()) << 32 | u64::from(self.next_u32());
        ((u128::from(wide) * bound as u128) >> 64) as usize
    }

    /// Fisher-Yates permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.next_below(i + 1);
            indices.swap(i, j);
        }
        indices
    }
}

/// Row indices of the two partitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainHoldoutSplit {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Shuffle `0..rows` with `seed` and hold out `ceil(rows * holdout_fraction)`.
pub fn train_holdout_split(
    rows: usize,
    holdout_fraction: f64,
    seed: u64,
) -> Result<TrainHoldoutSplit, TrainerError> {
    let holdout_rows = (rows as f64 * holdout_fraction).ceil() as usize;
    if holdout_rows == 0 || holdout_rows >= rows {
        return Err(TrainerError::InsufficientRows { rows });
    }

    let mut shuffled = LcgRng::new(seed).permutation(rows);
    let train = shuffled.split_off(holdout_rows);
    Ok(TrainHoldoutSplit {
        train,
        holdout: shuffled,
    })
}

/// Deterministic tie-breaker for split selection
///
/// Among equal-gain candidates the smallest key wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub position: usize,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, position: usize, node_id: usize) -> Self {
        Self {
            feature_idx,
            position,
            node_id,
        }
    }
}
