//! Data preprocessing module
//!
//! - Check-in record filtering and time-based feature derivation
//! - Feature standardization (z-score)

pub mod checkin;
mod scaler;

pub use checkin::{CheckinData, CheckinFilter, CheckinLoader, FilterStats, CHECKIN_FEATURES};
pub use scaler::{StandardScaler, StandardizationParams};
