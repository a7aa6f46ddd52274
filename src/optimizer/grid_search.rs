//! Exhaustive grid search with k-fold cross-validation
//!
//! Every (combination, fold) pair is evaluated with a freshly built
//! estimator, so evaluations share no state and may run on a rayon pool.
//! Scores are always gathered in enumeration order, which keeps the result
//! table, the winner and the reported error identical to a sequential run.

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::param_grid::{ParamGrid, ParamSet};
use crate::error::{KnnError, Result};
use crate::training::cross_validation::{CVResults, Fold, KFold};
use crate::training::models::select_labels;
use crate::training::{Classifier, Estimator};

/// Configuration for grid search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearchConfig {
    /// Number of cross-validation folds
    pub cv_folds: usize,

    /// Shuffle seed for fold assignment (None = contiguous folds)
    pub shuffle_seed: Option<u64>,

    /// Number of parallel workers (1 = sequential, 0 = all cores)
    pub n_jobs: usize,

    /// Refit the winning combination on the full input
    pub refit: bool,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            shuffle_seed: None,
            n_jobs: 1,
            refit: true,
        }
    }
}

impl GridSearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn with_refit(mut self, refit: bool) -> Self {
        self.refit = refit;
        self
    }
}

/// Cross-validated scores of one combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    /// 1 = best; equal means share the lower rank
    pub rank: usize,
}

/// Result of a grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult<F> {
    pub best_params: ParamSet,
    pub best_score: f64,
    /// Position of the winner in `cv_results`
    pub best_index: usize,
    /// Winner refit on the full input (None when refit is disabled)
    pub best_estimator: Option<F>,
    /// One row per combination, in enumeration order
    pub cv_results: Vec<CandidateResult>,
    pub n_folds: usize,
    pub duration_secs: f64,
}

impl<F> SearchResult<F> {
    pub fn best_candidate(&self) -> &CandidateResult {
        &self.cv_results[self.best_index]
    }
}

/// Materialized train/validation data of one fold
struct FoldData<L> {
    x_train: Array2<f64>,
    y_train: Vec<L>,
    x_val: Array2<f64>,
    y_val: Vec<L>,
}

impl<L: Clone> FoldData<L> {
    fn from_fold(fold: &Fold, x: &Array2<f64>, y: &[L]) -> Self {
        Self {
            x_train: x.select(Axis(0), &fold.train_indices),
            y_train: select_labels(y, &fold.train_indices),
            x_val: x.select(Axis(0), &fold.validation_indices),
            y_val: select_labels(y, &fold.validation_indices),
        }
    }
}

/// Grid search cross-validation
#[derive(Debug, Clone, Default)]
pub struct GridSearchCV {
    config: GridSearchConfig,
}

impl GridSearchCV {
    pub fn new(config: GridSearchConfig) -> Self {
        Self { config }
    }

    /// Default configuration with `k` folds
    pub fn with_folds(k: usize) -> Self {
        Self::new(GridSearchConfig::default().with_cv_folds(k))
    }

    pub fn config(&self) -> &GridSearchConfig {
        &self.config
    }

    /// Evaluate every combination of `grid` on every fold and pick the best
    /// mean validation score (first in enumeration order on ties).
    ///
    /// `factory` builds a fresh unfitted estimator for a combination. The
    /// first failing (combination, fold) in enumeration order aborts the
    /// search with `KnnError::SearchFailed`.
    pub fn search<L, E, B>(
        &self,
        factory: B,
        grid: &ParamGrid,
        x: &Array2<f64>,
        y: &[L],
    ) -> Result<SearchResult<E::Fitted>>
    where
        L: Clone + PartialEq + Sync,
        E: Estimator<L>,
        B: Fn(&ParamSet) -> Result<E> + Sync,
    {
        let start = Instant::now();
        let candidates = grid.combinations()?;
        if x.nrows() != y.len() {
            return Err(KnnError::shape_mismatch("x", x.nrows(), "y", y.len()));
        }

        let splitter = KFold {
            n_splits: self.config.cv_folds,
            shuffle_seed: self.config.shuffle_seed,
        };
        let folds = splitter.split(x.nrows())?;
        let fold_data: Vec<FoldData<L>> = folds.iter().map(|f| FoldData::from_fold(f, x, y)).collect();
        let n_folds = fold_data.len();

        debug!(
            n_candidates = candidates.len(),
            n_folds,
            n_samples = x.nrows(),
            n_jobs = self.config.n_jobs,
            "Starting grid search"
        );

        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..n_folds).map(move |f| (c, f)))
            .collect();

        let evaluate = |&(c, f): &(usize, usize)| -> Result<f64> {
            let params = &candidates[c];
            evaluate_fold(&factory, params, &fold_data[f]).map_err(|e| KnnError::SearchFailed {
                params: params.to_string(),
                fold: f,
                source: Box::new(e),
            })
        };

        let scores: Vec<f64> = if self.config.n_jobs == 1 {
            tasks.iter().map(&evaluate).collect::<Result<Vec<_>>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.n_jobs)
                .build()
                .map_err(|e| KnnError::ConfigError(format!("failed to build thread pool: {}", e)))?;
            // Waves of one task per worker, in enumeration order: a failing wave
            // stops the search and its first error is the first overall.
            let wave = pool.current_num_threads().max(1);
            let mut scores = Vec::with_capacity(tasks.len());
            for chunk in tasks.chunks(wave) {
                let outcomes: Vec<Result<f64>> = pool.install(|| chunk.par_iter().map(&evaluate).collect());
                for outcome in outcomes {
                    scores.push(outcome?);
                }
            }
            scores
        };

        let mut cv_results: Vec<CandidateResult> = candidates
            .into_iter()
            .zip(scores.chunks(n_folds))
            .map(|(params, fold_scores)| {
                let summary = CVResults::from_scores(fold_scores.to_vec());
                debug!(params = %params, mean = summary.mean_score, std = summary.std_score, "Candidate scored");
                CandidateResult {
                    params,
                    fold_scores: summary.scores,
                    mean_score: summary.mean_score,
                    std_score: summary.std_score,
                    rank: 0,
                }
            })
            .collect();

        let best_index = best_candidate_index(&cv_results);
        assign_ranks(&mut cv_results);

        let best_params = cv_results[best_index].params.clone();
        let best_score = cv_results[best_index].mean_score;

        let best_estimator = if self.config.refit {
            debug!(params = %best_params, "Refitting best candidate on full input");
            Some(factory(&best_params)?.fit(x, y)?)
        } else {
            None
        };

        Ok(SearchResult {
            best_params,
            best_score,
            best_index,
            best_estimator,
            cv_results,
            n_folds,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

fn evaluate_fold<L, E, B>(factory: &B, params: &ParamSet, data: &FoldData<L>) -> Result<f64>
where
    L: Clone + PartialEq,
    E: Estimator<L>,
    B: Fn(&ParamSet) -> Result<E>,
{
    let estimator = factory(params)?;
    let fitted = estimator.fit(&data.x_train, &data.y_train)?;
    fitted.score(&data.x_val, &data.y_val)
}

/// First candidate holding the maximum mean score
fn best_candidate_index(results: &[CandidateResult]) -> usize {
    let mut best = 0;
    for (i, r) in results.iter().enumerate().skip(1) {
        if r.mean_score > results[best].mean_score {
            best = i;
        }
    }
    best
}

fn assign_ranks(results: &mut [CandidateResult]) {
    let means: Vec<f64> = results.iter().map(|r| r.mean_score).collect();
    for r in results.iter_mut() {
        r.rank = 1 + means.iter().filter(|&&m| m > r.mean_score).count();
    }
}
