//! Cross-validation and hold-out splitting

use crate::error::{KnnError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/validation split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub fold_idx: usize,
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

/// K-Fold splitter.
///
/// Without a seed the folds are contiguous blocks of `0..n`. With a seed the
/// indices are shuffled by a `ChaCha8Rng` first, so the same seed always
/// yields the same folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle_seed: Option<u64>,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle_seed: None,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle_seed: None,
        }
    }

    /// Shuffle indices with the given seed before cutting folds
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Generate one fold per split.
    ///
    /// Fold sizes differ by at most one; the first `n_samples % n_splits`
    /// folds carry the extra sample.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        let n_splits = self.n_splits;
        if n_splits < 2 || n_splits > n_samples {
            return Err(KnnError::InvalidFoldCount { n_splits, n_samples });
        }

        let indices = self.ordered_indices(n_samples);

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut folds = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let validation_indices = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            folds.push(Fold {
                fold_idx,
                train_indices,
                validation_indices,
            });

            current += fold_size;
        }

        Ok(folds)
    }

    fn ordered_indices(&self, n_samples: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }
        indices
    }
}

/// Indices for a single hold-out split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle `0..n_samples` with `seed` and hold out `ceil(test_size * n)` rows.
///
/// `test_size` must be in `(0, 1)` and both sides must end up non-empty.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(KnnError::ConfigError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(KnnError::ConfigError(format!(
            "test_size {} leaves an empty side for {} samples",
            test_size, n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(folds: &[Fold], n: usize) {
        let mut all_validation: Vec<usize> = folds.iter().flat_map(|f| f.validation_indices.clone()).collect();
        all_validation.sort();
        assert_eq!(all_validation, (0..n).collect::<Vec<_>>());

        for fold in folds {
            assert_eq!(fold.train_indices.len() + fold.validation_indices.len(), n);
            for idx in &fold.validation_indices {
                assert!(!fold.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_k_fold() {
        let folds = KFold::new(5).split(100).unwrap();

        assert_eq!(folds.len(), 5);
        for fold in &folds {
            assert_eq!(fold.validation_indices.len(), 20);
            assert_eq!(fold.train_indices.len(), 80);
        }
        assert_partition(&folds, 100);
    }

    #[test]
    fn test_k_fold_is_contiguous_without_seed() {
        let folds = KFold::new(2).split(4).unwrap();

        assert_eq!(folds[0].validation_indices, vec![0, 1]);
        assert_eq!(folds[1].validation_indices, vec![2, 3]);
        assert_eq!(folds[0].train_indices, vec![2, 3]);
    }

    #[test]
    fn test_uneven_fold_sizes() {
        let folds = KFold::new(3).split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.validation_indices.len()).collect();

        assert_eq!(sizes, vec![4, 3, 3]);
        assert_partition(&folds, 10);
    }

    #[test]
    fn test_each_index_trains_k_minus_one_times() {
        let folds = KFold::new(4).with_shuffle(7).split(13).unwrap();

        let mut train_counts = vec![0; 13];
        for fold in &folds {
            for &i in &fold.train_indices {
                train_counts[i] += 1;
            }
        }
        assert!(train_counts.iter().all(|&c| c == 3));
        assert_partition(&folds, 13);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let a = KFold::new(3).with_shuffle(42).split(30).unwrap();
        let b = KFold::new(3).with_shuffle(42).split(30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_fold_count() {
        assert!(matches!(
            KFold::new(1).split(10),
            Err(KnnError::InvalidFoldCount { n_splits: 1, n_samples: 10 })
        ));
        assert!(matches!(
            KFold::new(11).split(10),
            Err(KnnError::InvalidFoldCount { .. })
        ));
    }

    #[test]
    fn test_train_test_split() {
        let split = train_test_split(100, 0.25, 1).unwrap();
        assert_eq!(split.test_indices.len(), 25);
        assert_eq!(split.train_indices.len(), 75);

        let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());

        assert_eq!(split, train_test_split(100, 0.25, 1).unwrap());
    }

    #[test]
    fn test_train_test_split_rejects_bad_sizes() {
        assert!(train_test_split(10, 0.0, 1).is_err());
        assert!(train_test_split(10, 1.0, 1).is_err());
        assert!(train_test_split(1, 0.5, 1).is_err());
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.5, 1.0]);
        assert!((results.mean_score - 0.75).abs() < 1e-12);
        assert!((results.std_score - 0.25).abs() < 1e-12);
        assert_eq!(results.n_folds, 2);
    }
}
