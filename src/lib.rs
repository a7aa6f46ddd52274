//! Check-in KNN - location prediction from check-in records
//!
//! This crate provides a small, deterministic k-nearest-neighbors toolkit:
//! - Distance engine and majority-vote KNN classifier
//! - Standardization fitted on training data only
//! - K-fold splitting and exhaustive grid search with cross-validation
//! - Check-in dataset preparation (window filter, time features, rare places)
//!
//! # Modules
//!
//! - [`preprocessing`] - Standardization and check-in feature extraction
//! - [`training`] - Distance metrics, KNN classifier, splitting, training engine
//! - [`optimizer`] - Parameter grids and grid search cross-validation
//! - [`utils`] - CSV loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use checkin_knn::prelude::*;
//!
//! let data = CheckinLoader::default().load_csv("train.csv")?;
//! let config = TrainingConfig::default().with_search(
//!     ParamGrid::new().with_param("n_neighbors", [3, 5, 10]),
//!     GridSearchConfig::default().with_cv_folds(3),
//! );
//! let (_model, report) = TrainEngine::new(config).run(&data.dataset)?;
//! println!("test accuracy: {:.4}", report.test_accuracy);
//! # Ok::<(), checkin_knn::KnnError>(())
//! ```

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod optimizer;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{KnnError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{KnnError, Result};

    // Preprocessing
    pub use crate::preprocessing::{CheckinData, CheckinFilter, CheckinLoader, StandardScaler, StandardizationParams};

    // Training
    pub use crate::training::{
        accuracy_score, train_test_split, Classifier, Dataset, DistanceMetric, Estimator, FittedKNNClassifier, KFold,
        KNNClassifier, KNNConfig, TrainEngine, TrainingConfig, TrainingReport, WeightScheme,
    };

    // Optimization
    pub use crate::optimizer::{GridSearchCV, GridSearchConfig, ParamGrid, ParamSet, ParamValue, SearchResult};

    // Utilities
    pub use crate::utils::DataLoader;
}
