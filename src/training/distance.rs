//! Distance engine
//!
//! Computes the distance from one query point to every row of a reference
//! matrix. Output order always follows the reference rows.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{KnnError, Result};

/// Distance metric for KNN
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance (L2)
    Euclidean,
    /// Manhattan distance (L1)
    Manhattan,
    /// Minkowski distance with parameter p
    Minkowski(f64),
    /// Cosine similarity (converted to distance)
    Cosine,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::Euclidean
    }
}

impl DistanceMetric {
    /// Reject metric parameters that do not define a distance.
    pub fn validate(&self) -> Result<()> {
        match *self {
            DistanceMetric::Minkowski(p) if !(p >= 1.0 && p.is_finite()) => Err(
                KnnError::invalid_param("p", p, "Minkowski order must be a finite value >= 1"),
            ),
            _ => Ok(()),
        }
    }

    /// Distance between two points of equal length.
    #[inline]
    pub fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match *self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(ai, bi)| {
                    let d = ai - bi;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).abs()).sum(),
            DistanceMetric::Minkowski(p) => a
                .iter()
                .zip(b.iter())
                .map(|(ai, bi)| (ai - bi).abs().powf(p))
                .sum::<f64>()
                .powf(1.0 / p),
            DistanceMetric::Cosine => {
                let mut dot = 0.0;
                let mut norm_a = 0.0;
                let mut norm_b = 0.0;
                for (ai, bi) in a.iter().zip(b.iter()) {
                    dot += ai * bi;
                    norm_a += ai * ai;
                    norm_b += bi * bi;
                }
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom > 0.0 {
                    1.0 - (dot / denom)
                } else {
                    1.0
                }
            }
        }
    }
}

/// Distances from `query` to each row of `reference` under `metric`.
///
/// A zero-column reference yields a zero distance for every row.
pub fn pairwise_distances(
    query: ArrayView1<f64>,
    reference: &Array2<f64>,
    metric: DistanceMetric,
) -> Result<Array1<f64>> {
    if query.len() != reference.ncols() {
        return Err(KnnError::DimensionMismatch {
            expected: reference.ncols(),
            actual: query.len(),
        });
    }
    if reference.ncols() == 0 {
        return Ok(Array1::zeros(reference.nrows()));
    }

    Ok(reference
        .rows()
        .into_iter()
        .map(|row| metric.distance(query, row))
        .collect())
}

/// Euclidean distances from `query` to each row of `reference`.
pub fn euclidean_distances(query: ArrayView1<f64>, reference: &Array2<f64>) -> Result<Array1<f64>> {
    pairwise_distances(query, reference, DistanceMetric::Euclidean)
}
