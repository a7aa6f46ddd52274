//! K-Nearest Neighbors classifier
//!
//! `KNNClassifier` is the unfitted estimator: a configuration only. Fitting
//! produces an immutable `FittedKNNClassifier` holding the reference set.
//!
//! Determinism rules:
//! - among equally distant reference rows the lower row index wins a
//!   neighbor slot;
//! - among labels with equal vote weight the label that appears first in the
//!   training labels wins.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::str::FromStr;

use super::distance::{pairwise_distances, DistanceMetric};
use super::models::{Classifier, Estimator};
use crate::error::{KnnError, Result};
use crate::optimizer::ParamSet;

/// Weighting scheme for neighbors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightScheme {
    /// All neighbors have equal weight
    Uniform,
    /// Closer neighbors have more weight (inverse distance)
    Distance,
}

impl Default for WeightScheme {
    fn default() -> Self {
        Self::Uniform
    }
}

impl FromStr for WeightScheme {
    type Err = KnnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "distance" => Ok(Self::Distance),
            other => Err(KnnError::invalid_param("weights", other, "expected 'uniform' or 'distance'")),
        }
    }
}

/// KNN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Weighting scheme
    pub weights: WeightScheme,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
        }
    }
}

impl KNNConfig {
    pub fn with_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_weights(mut self, weights: WeightScheme) -> Self {
        self.weights = weights;
        self
    }

    /// Build a configuration from a grid-search combination, starting from defaults.
    pub fn from_params(params: &ParamSet) -> Result<Self> {
        Self::default().with_params(params)
    }

    /// Override fields of this configuration with a grid-search combination.
    ///
    /// Recognized names: `n_neighbors`, `weights`, `metric`, `p`.
    pub fn with_params(mut self, params: &ParamSet) -> Result<Self> {
        let mut metric_name: Option<String> = None;
        let mut p: Option<f64> = None;

        for (name, value) in params.iter() {
            match name.as_str() {
                "n_neighbors" => {
                    self.n_neighbors = value.as_usize().ok_or_else(|| {
                        KnnError::invalid_param(name, value, "expected a non-negative integer")
                    })?;
                }
                "weights" => {
                    let s = value
                        .as_str()
                        .ok_or_else(|| KnnError::invalid_param(name, value, "expected a string"))?;
                    self.weights = s.parse()?;
                }
                "metric" => {
                    let s = value
                        .as_str()
                        .ok_or_else(|| KnnError::invalid_param(name, value, "expected a string"))?;
                    metric_name = Some(s.to_ascii_lowercase());
                }
                "p" => {
                    p = Some(value.as_f64().ok_or_else(|| {
                        KnnError::invalid_param(name, value, "expected a number")
                    })?);
                }
                _ => return Err(KnnError::invalid_param(name, value, "unknown KNN hyperparameter")),
            }
        }

        match (metric_name.as_deref(), p) {
            (None, None) => {}
            (Some("euclidean"), None) => self.metric = DistanceMetric::Euclidean,
            (Some("manhattan"), None) => self.metric = DistanceMetric::Manhattan,
            (Some("cosine"), None) => self.metric = DistanceMetric::Cosine,
            (Some("minkowski"), p) => self.metric = DistanceMetric::Minkowski(p.unwrap_or(2.0)),
            (None, Some(p)) => self.metric = DistanceMetric::Minkowski(p),
            (Some(other), Some(p)) => {
                return Err(KnnError::invalid_param(
                    "p",
                    p,
                    format!("only applies to the minkowski metric, not '{}'", other),
                ))
            }
            (Some(other), None) => {
                return Err(KnnError::invalid_param(
                    "metric",
                    other,
                    "expected euclidean, manhattan, cosine or minkowski",
                ))
            }
        }

        self.metric.validate()?;
        Ok(self)
    }
}

/// K-Nearest Neighbors Classifier (unfitted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self { config }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }

    /// Unfitted classifier for a grid-search combination; usable directly as
    /// a `GridSearchCV` factory.
    pub fn from_params(params: &ParamSet) -> Result<Self> {
        Ok(Self::new(KNNConfig::from_params(params)?))
    }

    pub fn config(&self) -> &KNNConfig {
        &self.config
    }
}

impl<L: Clone + Eq + Hash> Estimator<L> for KNNClassifier {
    type Fitted = FittedKNNClassifier<L>;

    /// Store the reference set after validating shapes and `k`.
    fn fit(&self, x: &Array2<f64>, y: &[L]) -> Result<Self::Fitted> {
        if x.nrows() != y.len() {
            return Err(KnnError::shape_mismatch("x", x.nrows(), "y", y.len()));
        }
        if x.nrows() == 0 {
            return Err(KnnError::EmptyInput("cannot fit KNN on zero samples".to_string()));
        }
        let k = self.config.n_neighbors;
        if k < 1 || k > x.nrows() {
            return Err(KnnError::invalid_param(
                "n_neighbors",
                k,
                format!("must be between 1 and the number of training samples ({})", x.nrows()),
            ));
        }
        self.config.metric.validate()?;

        // Class codes follow first appearance, which doubles as the vote tie-break order.
        let mut lookup: HashMap<&L, usize> = HashMap::new();
        let mut classes: Vec<L> = Vec::new();
        let codes: Vec<usize> = y
            .iter()
            .map(|label| {
                *lookup.entry(label).or_insert_with(|| {
                    classes.push(label.clone());
                    classes.len() - 1
                })
            })
            .collect();

        Ok(FittedKNNClassifier {
            config: self.config.clone(),
            x_train: x.clone(),
            codes,
            classes,
        })
    }
}

/// A fitted K-Nearest Neighbors classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedKNNClassifier<L> {
    config: KNNConfig,
    x_train: Array2<f64>,
    codes: Vec<usize>,
    classes: Vec<L>,
}

impl<L: Clone> FittedKNNClassifier<L> {
    pub fn config(&self) -> &KNNConfig {
        &self.config
    }

    /// Distinct training labels in order of first appearance
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    pub fn n_samples(&self) -> usize {
        self.x_train.nrows()
    }

    /// Indices and distances of the k nearest reference rows, nearest first.
    pub fn kneighbors(&self, query: ArrayView1<f64>) -> Result<Vec<(usize, f64)>> {
        let mut neighbors = find_k_nearest(query, &self.x_train, self.config.n_neighbors, self.config.metric)?;
        neighbors.sort();
        Ok(neighbors.into_iter().map(|n| (n.index, n.dist)).collect())
    }

    /// Predict class probabilities (parallelized over query rows).
    ///
    /// Columns follow [`classes`](Self::classes).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        let n_classes = self.classes.len();

        let votes: Vec<Vec<f64>> = self.vote_rows(x)?;
        let flat: Vec<f64> = votes
            .into_iter()
            .flat_map(|row| {
                let total: f64 = row.iter().sum();
                row.into_iter().map(move |v| if total > 0.0 { v / total } else { 0.0 })
            })
            .collect();

        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.x_train.ncols() {
            return Err(KnnError::DimensionMismatch {
                expected: self.x_train.ncols(),
                actual: x.ncols(),
            });
        }
        Ok(())
    }

    /// Per-class vote weights for every query row.
    fn vote_rows(&self, x: &Array2<f64>) -> Result<Vec<Vec<f64>>> {
        let x_train = &self.x_train;
        let codes = &self.codes;
        let n_classes = self.classes.len();
        let KNNConfig { n_neighbors: k, metric, weights } = self.config;

        (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, k, metric)?;
                Ok(tally_votes(&neighbors, codes, n_classes, weights))
            })
            .collect()
    }
}

impl<L: Clone> Classifier<L> for FittedKNNClassifier<L> {
    /// Predict class labels (parallelized over query rows)
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<L>> {
        self.check_features(x)?;

        let votes = self.vote_rows(x)?;
        Ok(votes
            .iter()
            .map(|row| self.classes[winning_class(row)].clone())
            .collect())
    }
}

// ============================================================================
// Neighbor selection and voting
// ============================================================================

/// Heap entry ordered by distance, then by reference index
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    dist: f64,
    index: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Find k nearest neighbors using a max-heap, O(n log k).
///
/// Rows are visited in index order and a later row only displaces the heap
/// top when strictly closer, so equal distances keep the lower index.
fn find_k_nearest(
    query: ArrayView1<f64>,
    x_train: &Array2<f64>,
    k: usize,
    metric: DistanceMetric,
) -> Result<Vec<Neighbor>> {
    let distances = pairwise_distances(query, x_train, metric)?;
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (index, &dist) in distances.iter().enumerate() {
        let candidate = Neighbor { dist, index };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(top) = heap.peek() {
            if candidate < *top {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    Ok(heap.into_vec())
}

fn tally_votes(neighbors: &[Neighbor], codes: &[usize], n_classes: usize, weights: WeightScheme) -> Vec<f64> {
    let mut votes = vec![0.0; n_classes];
    for n in neighbors {
        let weight = match weights {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance => 1.0 / (n.dist + 1e-10),
        };
        votes[codes[n.index]] += weight;
    }
    votes
}

/// Index of the largest vote; the lowest class code wins ties.
fn winning_class(votes: &[f64]) -> usize {
    let mut best = 0;
    for (code, &v) in votes.iter().enumerate().skip(1) {
        if v > votes[best] {
            best = code;
        }
    }
    best
}
