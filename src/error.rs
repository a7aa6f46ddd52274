//! Error types for the check-in k-NN library

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, KnnError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum KnnError {
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Shape mismatch: {left} has {left_len} rows but {right} has {right_len}")]
    ShapeMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    #[error("Invalid hyperparameter: {name} = {value}, {reason}")]
    InvalidHyperparameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid fold count: {n_splits} folds requested for {n_samples} samples (need 2 <= folds <= samples)")]
    InvalidFoldCount { n_splits: usize, n_samples: usize },

    #[error("Parameter grid is empty")]
    EmptyGrid,

    #[error("Search failed for {params} on fold {fold}: {source}")]
    SearchFailed {
        params: String,
        fold: usize,
        #[source]
        source: Box<KnnError>,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl KnnError {
    /// Shorthand for an `InvalidHyperparameter` error.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        KnnError::InvalidHyperparameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `ShapeMismatch` between two named inputs.
    pub fn shape_mismatch(left: &str, left_len: usize, right: &str, right_len: usize) -> Self {
        KnnError::ShapeMismatch {
            left: left.to_string(),
            left_len,
            right: right.to_string(),
            right_len,
        }
    }
}

impl From<polars::error::PolarsError> for KnnError {
    fn from(err: polars::error::PolarsError) -> Self {
        KnnError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for KnnError {
    fn from(err: serde_json::Error) -> Self {
        KnnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for KnnError {
    fn from(err: ndarray::ShapeError) -> Self {
        KnnError::DataError(format!("invalid array shape: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KnnError::DimensionMismatch { expected: 3, actual: 2 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3 features, got 2");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: KnnError = io_err.into();
        assert!(matches!(err, KnnError::IoError(_)));
    }

    #[test]
    fn test_search_failed_keeps_source() {
        let inner = KnnError::invalid_param("n_neighbors", 9, "exceeds training rows (4)");
        let err = KnnError::SearchFailed {
            params: "{n_neighbors: 9}".to_string(),
            fold: 1,
            source: Box::new(inner),
        };
        let text = err.to_string();
        assert!(text.contains("fold 1"));
        assert!(text.contains("n_neighbors = 9"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
