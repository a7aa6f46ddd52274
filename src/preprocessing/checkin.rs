//! Check-in dataset preparation
//!
//! Turns raw check-in records (`row_id, x, y, accuracy, time, place_id`) into
//! a labeled feature matrix:
//!
//! 1. keep rows strictly inside the configured x/y window;
//! 2. derive day of month, hour and weekday (Monday = 0) from the UTC epoch
//!    seconds in `time`;
//! 3. drop places seen `min_place_count` times or fewer;
//! 4. emit `[x, y, accuracy, day, hour, weekday]` with `place_id` labels.
//!
//! `row_id` and the raw `time` never reach the feature matrix.

use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{KnnError, Result};
use crate::training::Dataset;
use crate::utils::DataLoader;

/// Feature columns produced for every kept check-in, in matrix order
pub const CHECKIN_FEATURES: [&str; 6] = ["x", "y", "accuracy", "day", "hour", "weekday"];

/// Row filters applied before feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinFilter {
    /// Open interval of accepted x coordinates
    pub x_range: (f64, f64),
    /// Open interval of accepted y coordinates
    pub y_range: (f64, f64),
    /// Places with this many check-ins or fewer are dropped
    pub min_place_count: usize,
}

impl Default for CheckinFilter {
    fn default() -> Self {
        Self {
            x_range: (0.0, 10.0),
            y_range: (0.0, 10.0),
            min_place_count: 3,
        }
    }
}

impl CheckinFilter {
    pub fn with_x_range(mut self, low: f64, high: f64) -> Self {
        self.x_range = (low, high);
        self
    }

    pub fn with_y_range(mut self, low: f64, high: f64) -> Self {
        self.y_range = (low, high);
        self
    }

    pub fn with_min_place_count(mut self, count: usize) -> Self {
        self.min_place_count = count;
        self
    }

    fn in_bounds(&self, x: f64, y: f64) -> bool {
        x > self.x_range.0 && x < self.x_range.1 && y > self.y_range.0 && y < self.y_range.1
    }
}

/// Row counts at each filtering stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    pub rows_read: usize,
    pub rows_in_bounds: usize,
    pub rows_kept: usize,
    pub places_kept: usize,
    pub places_dropped: usize,
}

/// Prepared check-ins plus the filtering trail
#[derive(Debug, Clone)]
pub struct CheckinData {
    pub dataset: Dataset<i64>,
    pub stats: FilterStats,
}

/// Builds check-in datasets from files or in-memory frames
#[derive(Debug, Clone, Default)]
pub struct CheckinLoader {
    filter: CheckinFilter,
    loader: DataLoader,
}

impl CheckinLoader {
    pub fn new(filter: CheckinFilter) -> Self {
        Self {
            filter,
            loader: DataLoader::new(),
        }
    }

    /// Read files with a custom loader (e.g. a forced delimiter)
    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn filter(&self) -> &CheckinFilter {
        &self.filter
    }

    /// Read a check-in CSV and prepare it
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<CheckinData> {
        let df = self.loader.load_csv(path)?;
        self.from_dataframe(&df)
    }

    /// Prepare check-ins from an already loaded frame
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<CheckinData> {
        let xs = f64_column(df, "x")?;
        let ys = f64_column(df, "y")?;
        let accuracy = f64_column(df, "accuracy")?;
        let times = i64_column(df, "time")?;
        let places = i64_column(df, "place_id")?;

        let mut stats = FilterStats {
            rows_read: df.height(),
            ..Default::default()
        };

        let in_bounds: Vec<usize> = (0..df.height())
            .filter(|&i| self.filter.in_bounds(xs[i], ys[i]))
            .collect();
        stats.rows_in_bounds = in_bounds.len();

        let mut place_counts: HashMap<i64, usize> = HashMap::new();
        for &i in &in_bounds {
            *place_counts.entry(places[i]).or_insert(0) += 1;
        }

        let min_count = self.filter.min_place_count;
        let kept: Vec<usize> = in_bounds
            .into_iter()
            .filter(|&i| place_counts[&places[i]] > min_count)
            .collect();

        stats.rows_kept = kept.len();
        stats.places_kept = place_counts.values().filter(|&&c| c > min_count).count();
        stats.places_dropped = place_counts.len() - stats.places_kept;

        let mut features = Vec::with_capacity(kept.len() * CHECKIN_FEATURES.len());
        let mut labels = Vec::with_capacity(kept.len());
        for &i in &kept {
            let (day, hour, weekday) = time_features(times[i])?;
            features.extend_from_slice(&[xs[i], ys[i], accuracy[i], day, hour, weekday]);
            labels.push(places[i]);
        }

        let features = Array2::from_shape_vec((kept.len(), CHECKIN_FEATURES.len()), features)?;
        let feature_names = CHECKIN_FEATURES.iter().map(|s| s.to_string()).collect();

        debug!(
            rows_read = stats.rows_read,
            rows_in_bounds = stats.rows_in_bounds,
            rows_kept = stats.rows_kept,
            places_kept = stats.places_kept,
            places_dropped = stats.places_dropped,
            "Prepared check-in dataset"
        );

        Ok(CheckinData {
            dataset: Dataset::new(features, labels, feature_names)?,
            stats,
        })
    }
}

/// Day of month (1-31), hour (0-23) and weekday (Monday = 0) of a UTC epoch timestamp
pub fn time_features(epoch_secs: i64) -> Result<(f64, f64, f64)> {
    let ts: DateTime<Utc> = DateTime::from_timestamp(epoch_secs, 0)
        .ok_or_else(|| KnnError::DataError(format!("timestamp out of range: {}", epoch_secs)))?;

    Ok((
        ts.day() as f64,
        ts.hour() as f64,
        ts.weekday().num_days_from_monday() as f64,
    ))
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| KnnError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| missing_value(name, row)))
        .collect()
}

fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = df
        .column(name)
        .map_err(|_| KnnError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Int64)?;

    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| missing_value(name, row)))
        .collect()
}

fn missing_value(column: &str, row: usize) -> KnnError {
    KnnError::DataError(format!("missing value in column '{}' at row {}", column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2016-01-04 was a Monday
    const MONDAY_9AM: i64 = 1_451_898_000;

    fn sample_df() -> DataFrame {
        df!(
            "row_id" => &[0i64, 1, 2, 3, 4, 5, 6, 7],
            "x" => &[1.0, 1.1, 1.2, 1.3, 5.0, 5.1, 12.0, 0.0],
            "y" => &[2.0, 2.1, 2.2, 2.3, 5.0, 5.1, 1.0, 3.0],
            "accuracy" => &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0],
            "time" => &[MONDAY_9AM; 8],
            "place_id" => &[100i64, 100, 100, 100, 200, 200, 100, 100],
        )
        .unwrap()
    }

    #[test]
    fn test_time_features() {
        assert_eq!(time_features(MONDAY_9AM).unwrap(), (4.0, 9.0, 0.0));
        // one day and one hour later is Tuesday 10:00
        assert_eq!(time_features(MONDAY_9AM + 90_000).unwrap(), (5.0, 10.0, 1.0));
        assert!(time_features(i64::MAX).is_err());
    }

    #[test]
    fn test_filters_and_features() {
        let loader = CheckinLoader::new(CheckinFilter::default().with_min_place_count(3));
        let data = loader.from_dataframe(&sample_df()).unwrap();

        // x = 12.0 and x = 0.0 fall outside the open window; place 200 has 2 <= 3 rows
        assert_eq!(data.stats.rows_read, 8);
        assert_eq!(data.stats.rows_in_bounds, 6);
        assert_eq!(data.stats.rows_kept, 4);
        assert_eq!(data.stats.places_kept, 1);
        assert_eq!(data.stats.places_dropped, 1);

        let ds = data.dataset;
        assert_eq!(ds.labels, vec![100, 100, 100, 100]);
        assert_eq!(ds.feature_names, CHECKIN_FEATURES.to_vec());
        assert_eq!(ds.features.row(0).to_vec(), vec![1.0, 2.0, 10.0, 4.0, 9.0, 0.0]);
    }

    #[test]
    fn test_count_equal_to_threshold_is_dropped() {
        let loader = CheckinLoader::new(CheckinFilter::default().with_min_place_count(4));
        let data = loader.from_dataframe(&sample_df()).unwrap();
        assert_eq!(data.stats.rows_kept, 0);
        assert_eq!(data.dataset.n_samples(), 0);
    }

    #[test]
    fn test_load_semicolon_file() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(tmp, "row_id;x;y;accuracy;time;place_id").unwrap();
        for i in 0..5 {
            writeln!(tmp, "{};1.5;2.5;{};{};7", i, 10 + i, MONDAY_9AM).unwrap();
        }
        tmp.flush().unwrap();

        let loader = CheckinLoader::new(CheckinFilter::default().with_min_place_count(4))
            .with_loader(DataLoader::new().with_delimiter(b';'));
        assert_eq!(loader.filter().min_place_count, 4);

        let data = loader.load_csv(tmp.path()).unwrap();
        assert_eq!(data.stats.rows_kept, 5);
        assert_eq!(data.dataset.labels, vec![7; 5]);
    }

    #[test]
    fn test_missing_column() {
        let df = df!("x" => &[1.0], "y" => &[1.0]).unwrap();
        let err = CheckinLoader::default().from_dataframe(&df).unwrap_err();
        assert!(matches!(err, KnnError::FeatureNotFound(ref c) if c == "accuracy"));
    }
}
