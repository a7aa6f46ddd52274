//! Training configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::knn::KNNConfig;
use crate::error::{KnnError, Result};
use crate::optimizer::{GridSearchConfig, ParamGrid};
use crate::preprocessing::CheckinFilter;

/// Hyperparameter search settings for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Candidate values per KNN hyperparameter
    pub grid: ParamGrid,
    /// Cross-validation and parallelism settings
    #[serde(default)]
    pub cv: GridSearchConfig,
}

/// Configuration for one end-to-end training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Row filters for the check-in source
    pub filter: CheckinFilter,

    /// Fraction of rows held out for testing
    pub test_size: f64,

    /// Seed for the hold-out shuffle
    pub random_state: u64,

    /// Classifier settings (base values when searching)
    pub knn: KNNConfig,

    /// Grid search; None fits `knn` directly
    pub search: Option<SearchSpec>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            filter: CheckinFilter::default(),
            test_size: 0.25,
            random_state: 42,
            knn: KNNConfig::default(),
            search: None,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: CheckinFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_knn(mut self, knn: KNNConfig) -> Self {
        self.knn = knn;
        self
    }

    pub fn with_search(mut self, grid: ParamGrid, cv: GridSearchConfig) -> Self {
        self.search = Some(SearchSpec { grid, cv });
        self
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| KnnError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check values that can be rejected before any data is read.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(KnnError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.knn.n_neighbors == 0 {
            return Err(KnnError::invalid_param("n_neighbors", 0, "must be at least 1"));
        }
        self.knn.metric.validate()?;

        let (x_low, x_high) = self.filter.x_range;
        let (y_low, y_high) = self.filter.y_range;
        if !(x_low < x_high && y_low < y_high) {
            return Err(KnnError::ConfigError(format!(
                "coordinate window is empty: x {:?}, y {:?}",
                self.filter.x_range, self.filter.y_range
            )));
        }
        if let Some(search) = &self.search {
            if search.grid.is_empty() {
                return Err(KnnError::EmptyGrid);
            }
        }
        Ok(())
    }
}
