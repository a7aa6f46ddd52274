//! End-to-end training run
//!
//! Hold-out split, standardization fitted on the training part only, then a
//! single KNN fit or a cross-validated grid search, scored on the hold-out.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::time::Instant;
use tracing::debug;

use super::config::TrainingConfig;
use super::cross_validation::train_test_split;
use super::knn::{FittedKNNClassifier, KNNClassifier, KNNConfig};
use super::models::{Classifier, Dataset, Estimator};
use crate::error::Result;
use crate::optimizer::{CandidateResult, GridSearchCV, ParamSet};
use crate::preprocessing::StandardizationParams;

/// Grid-search diagnostics carried in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub best_params: ParamSet,
    pub best_score: f64,
    pub n_folds: usize,
    pub cv_results: Vec<CandidateResult>,
}

/// Outcome of a training run, ready for display or serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport<L> {
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub n_classes: usize,
    /// Configuration of the final classifier
    pub knn: KNNConfig,
    pub test_accuracy: f64,
    /// Hold-out predictions, aligned with `test_labels`
    pub predictions: Vec<L>,
    pub test_labels: Vec<L>,
    pub search: Option<SearchSummary>,
    pub training_time_secs: f64,
}

/// Standardizer plus classifier produced by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel<L> {
    pub scaler: StandardizationParams,
    pub classifier: FittedKNNClassifier<L>,
}

impl<L: Clone> TrainedModel<L> {
    /// Predict labels for raw (unscaled) feature rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<L>> {
        let scaled = self.scaler.transform(x)?;
        self.classifier.predict(&scaled)
    }
}

/// Runs the configured training procedure on a dataset
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn run<L>(&self, dataset: &Dataset<L>) -> Result<(TrainedModel<L>, TrainingReport<L>)>
    where
        L: Clone + Eq + Hash + Sync,
    {
        let start = Instant::now();
        self.config.validate()?;

        let split = train_test_split(dataset.n_samples(), self.config.test_size, self.config.random_state)?;
        let train = dataset.select(&split.train_indices);
        let test = dataset.select(&split.test_indices);

        let scaler = StandardizationParams::fit(&train.features)?;
        let x_train = scaler.transform(&train.features)?;
        let x_test = scaler.transform(&test.features)?;

        debug!(
            n_train = train.n_samples(),
            n_test = test.n_samples(),
            n_features = dataset.n_features(),
            "Split and standardized dataset"
        );

        let (classifier, search) = match &self.config.search {
            None => {
                let fitted = KNNClassifier::new(self.config.knn.clone()).fit(&x_train, &train.labels)?;
                (fitted, None)
            }
            Some(spec) => {
                let base = self.config.knn.clone();
                let factory = move |params: &ParamSet| -> Result<KNNClassifier> {
                    Ok(KNNClassifier::new(base.clone().with_params(params)?))
                };

                let mut result = GridSearchCV::new(spec.cv.clone()).search(&factory, &spec.grid, &x_train, &train.labels)?;
                let fitted = match result.best_estimator.take() {
                    Some(fitted) => fitted,
                    None => factory(&result.best_params)?.fit(&x_train, &train.labels)?,
                };

                let summary = SearchSummary {
                    best_params: result.best_params,
                    best_score: result.best_score,
                    n_folds: result.n_folds,
                    cv_results: result.cv_results,
                };
                (fitted, Some(summary))
            }
        };

        let predictions = classifier.predict(&x_test)?;
        let test_accuracy = super::metrics::accuracy_score(&test.labels, &predictions)?;

        debug!(test_accuracy, knn = ?classifier.config(), "Training run finished");

        let report = TrainingReport {
            n_train: train.n_samples(),
            n_test: test.n_samples(),
            n_features: dataset.n_features(),
            n_classes: classifier.classes().len(),
            knn: classifier.config().clone(),
            test_accuracy,
            predictions,
            test_labels: test.labels,
            search,
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        Ok((TrainedModel { scaler, classifier }, report))
    }
}
