//! Hyperparameter optimization module
//!
//! Exhaustive grid search over a discrete candidate space, scored by k-fold
//! cross-validation.

mod grid_search;
mod param_grid;

pub use grid_search::{CandidateResult, GridSearchCV, GridSearchConfig, SearchResult};
pub use param_grid::{ParamGrid, ParamSet, ParamValue};
