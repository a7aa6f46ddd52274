//! Estimator traits and the labeled dataset type

use crate::error::{KnnError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::metrics::accuracy_score;

/// An unfitted model: a configuration that can be fitted on a labeled set.
///
/// Fitting never mutates the estimator; it returns a separate fitted value.
pub trait Estimator<L> {
    type Fitted: Classifier<L>;

    fn fit(&self, x: &Array2<f64>, y: &[L]) -> Result<Self::Fitted>;
}

/// A fitted classifier.
pub trait Classifier<L> {
    /// One predicted label per row of `x`, in row order.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<L>>;

    /// Accuracy of `predict(x)` against `y`.
    fn score(&self, x: &Array2<f64>, y: &[L]) -> Result<f64>
    where
        L: PartialEq,
    {
        if x.nrows() != y.len() {
            return Err(KnnError::shape_mismatch("x", x.nrows(), "y", y.len()));
        }
        let predictions = self.predict(x)?;
        accuracy_score(y, &predictions)
    }
}

/// Feature matrix with index-aligned labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset<L> {
    pub features: Array2<f64>,
    pub labels: Vec<L>,
    pub feature_names: Vec<String>,
}

impl<L: Clone> Dataset<L> {
    /// Create a dataset, checking that rows and labels line up.
    pub fn new(features: Array2<f64>, labels: Vec<L>, feature_names: Vec<String>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(KnnError::shape_mismatch("features", features.nrows(), "labels", labels.len()));
        }
        if features.ncols() != feature_names.len() {
            return Err(KnnError::DimensionMismatch {
                expected: feature_names.len(),
                actual: features.ncols(),
            });
        }
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: select_labels(&self.labels, indices),
            feature_names: self.feature_names.clone(),
        }
    }
}

/// Labels at `indices`, in the given order.
pub(crate) fn select_labels<L: Clone>(labels: &[L], indices: &[usize]) -> Vec<L> {
    indices.iter().map(|&i| labels[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dataset_shape_checks() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(Dataset::new(array![[1.0, 2.0]], vec![1, 2], names.clone()).is_err());
        assert!(Dataset::new(array![[1.0, 2.0, 3.0]], vec![1], names.clone()).is_err());

        let ds = Dataset::new(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], vec![10, 20, 30], names).unwrap();
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
    }

    #[test]
    fn test_dataset_select() {
        let ds = Dataset::new(
            array![[1.0], [2.0], [3.0]],
            vec!["x", "y", "z"],
            vec!["f".to_string()],
        )
        .unwrap();

        let subset = ds.select(&[2, 0]);
        assert_eq!(subset.features, array![[3.0], [1.0]]);
        assert_eq!(subset.labels, vec!["z", "x"]);
    }
}
