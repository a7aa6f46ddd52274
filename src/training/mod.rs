//! Model training module
//!
//! Provides the k-nearest-neighbors classifier and what surrounds it:
//! - Distance metrics (Euclidean, Manhattan, Minkowski, Cosine)
//! - Estimator / classifier traits and the labeled `Dataset`
//! - K-fold and hold-out splitting
//! - Accuracy scoring
//! - An end-to-end training engine

mod config;
mod engine;
pub mod cross_validation;
pub mod distance;
pub mod knn;
pub mod metrics;
pub mod models;

pub use config::{SearchSpec, TrainingConfig};
pub use engine::{SearchSummary, TrainEngine, TrainedModel, TrainingReport};
pub use models::{Classifier, Dataset, Estimator};
pub use cross_validation::{train_test_split, CVResults, Fold, KFold, TrainTestSplit};
pub use distance::{euclidean_distances, pairwise_distances, DistanceMetric};
pub use knn::{FittedKNNClassifier, KNNClassifier, KNNConfig, WeightScheme};
pub use metrics::accuracy_score;
