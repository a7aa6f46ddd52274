//! Feature standardization (z-score scaling)
//!
//! `StandardizationParams` is the immutable fitted state; `StandardScaler`
//! is a thin stateful wrapper for callers that prefer fit-then-transform on
//! one value. Standard deviation is the population one (ddof = 0). A column
//! whose standard deviation is exactly zero transforms to zero.

use crate::error::{KnnError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizationParams {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardizationParams {
    /// Compute column statistics of a reference matrix
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(KnnError::EmptyInput(
                "cannot fit standardizer on zero rows".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| KnnError::EmptyInput("cannot fit standardizer on zero rows".to_string()))?;
        let std = x.std_axis(Axis(0), 0.0);

        Ok(Self { mean, std })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / std` per column; zero-variance columns become 0.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;

        let mut out = x.clone();
        for ((mut column, &mean), &std) in out.axis_iter_mut(Axis(1)).zip(&self.mean).zip(&self.std) {
            if std == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - mean) / std);
            }
        }
        Ok(out)
    }

    /// Undo `transform`; zero-variance columns map back to their mean.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;

        let mut out = x.clone();
        for ((mut column, &mean), &std) in out.axis_iter_mut(Axis(1)).zip(&self.mean).zip(&self.std) {
            column.mapv_inplace(|v| v * std + mean);
        }
        Ok(out)
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features() {
            return Err(KnnError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok(())
    }
}

/// Feature scaler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<StandardizationParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&StandardizationParams> {
        let params = StandardizationParams::fit(x)?;
        Ok(&*self.params.insert(params))
    }

    /// Transform the data with the fitted statistics
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.params()?.transform(x)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?.transform(x)
    }

    /// Inverse transform the data
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.params()?.inverse_transform(x)
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Result<&StandardizationParams> {
        self.params
            .as_ref()
            .ok_or_else(|| KnnError::NotFitted("StandardScaler must be fitted before transform".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut scaler = StandardScaler::new();
        let result = scaler.fit_transform(&x).unwrap();

        for column in result.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < 1e-10); // Mean should be ~0
            assert!((std - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_population_std() {
        let params = StandardizationParams::fit(&array![[1.0], [3.0]]).unwrap();
        assert_eq!(params.mean[0], 2.0);
        assert_eq!(params.std[0], 1.0);
    }

    #[test]
    fn test_zero_variance_column() {
        let x = array![[7.0, 1.0], [7.0, 2.0], [7.0, 3.0]];
        let params = StandardizationParams::fit(&x).unwrap();
        let scaled = params.transform(&x).unwrap();

        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
        assert!(scaled.iter().all(|v| v.is_finite()));

        let restored = params.inverse_transform(&scaled).unwrap();
        assert_eq!(restored.column(0).to_vec(), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -4.0], [2.0, 0.5], [3.0, 9.0], [4.0, 2.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::new();
        let err = scaler.transform(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, KnnError::NotFitted(_)));
        assert!(!scaler.is_fitted());
    }

    #[test]
    fn test_fit_empty() {
        let err = StandardizationParams::fit(&Array2::zeros((0, 3))).unwrap_err();
        assert!(matches!(err, KnnError::EmptyInput(_)));
    }

    #[test]
    fn test_transform_wrong_width() {
        let params = StandardizationParams::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let err = params.transform(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, KnnError::DimensionMismatch { expected: 2, actual: 3 }));
    }
}
