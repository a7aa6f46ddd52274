//! Classification metrics

use crate::error::{KnnError, Result};

/// Fraction of predictions equal to the true labels, in `[0, 1]`.
pub fn accuracy_score<L: PartialEq>(y_true: &[L], y_pred: &[L]) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(KnnError::shape_mismatch("y_true", y_true.len(), "y_pred", y_pred.len()));
    }
    if y_true.is_empty() {
        return Err(KnnError::EmptyInput("cannot score zero samples".to_string()));
    }

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}
