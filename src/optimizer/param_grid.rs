//! Hyperparameter grids and their combinations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{KnnError, Result};

/// A single candidate value for a hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// One hyperparameter combination, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Candidate values per hyperparameter.
///
/// The search space is the Cartesian product of all candidate lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid(BTreeMap<String, Vec<ParamValue>>);

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add`](Self::add)
    pub fn with_param<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.add(name, values);
        self
    }

    /// Set the candidate list for `name`, replacing any previous list.
    pub fn add<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.0.insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// True when the grid yields no combination at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.values().any(Vec::is_empty)
    }

    pub fn n_combinations(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.0.values().map(Vec::len).product()
    }

    /// Every combination in a fixed order: parameter names ascending, each
    /// name's values in the order given, the last name varying fastest.
    pub fn combinations(&self) -> Result<Vec<ParamSet>> {
        if self.is_empty() {
            return Err(KnnError::EmptyGrid);
        }

        let entries: Vec<(&String, &Vec<ParamValue>)> = self.0.iter().collect();
        let total = self.n_combinations();
        let mut positions = vec![0usize; entries.len()];
        let mut combinations = Vec::with_capacity(total);

        for _ in 0..total {
            let mut set = ParamSet::new();
            for (&(name, values), &pos) in entries.iter().zip(&positions) {
                set.insert(name.clone(), values[pos].clone());
            }
            combinations.push(set);

            // odometer increment
            for slot in (0..entries.len()).rev() {
                positions[slot] += 1;
                if positions[slot] < entries[slot].1.len() {
                    break;
                }
                positions[slot] = 0;
            }
        }

        Ok(combinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_order() {
        let grid = ParamGrid::new()
            .with_param("weights", ["uniform", "distance"])
            .with_param("n_neighbors", [3, 5]);

        let combos = grid.combinations().unwrap();
        let rendered: Vec<String> = combos.iter().map(|c| c.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "{n_neighbors: 3, weights: uniform}",
                "{n_neighbors: 3, weights: distance}",
                "{n_neighbors: 5, weights: uniform}",
                "{n_neighbors: 5, weights: distance}",
            ]
        );
    }

    #[test]
    fn test_single_parameter_grid() {
        let grid = ParamGrid::new().with_param("n_neighbors", [3, 5, 10]);
        let combos = grid.combinations().unwrap();

        assert_eq!(grid.n_combinations(), 3);
        assert_eq!(combos[2].get("n_neighbors"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn test_names_and_values() {
        let grid = ParamGrid::new()
            .with_param("weights", ["uniform"])
            .with_param("n_neighbors", [3, 5]);

        let names: Vec<&String> = grid.names().collect();
        assert_eq!(names, vec!["n_neighbors", "weights"]);
        assert_eq!(grid.values("n_neighbors"), Some(&[ParamValue::Int(3), ParamValue::Int(5)][..]));
        assert_eq!(grid.values("p"), None);
    }

    #[test]
    fn test_empty_grid() {
        assert!(matches!(ParamGrid::new().combinations(), Err(KnnError::EmptyGrid)));

        let grid = ParamGrid::new()
            .with_param("n_neighbors", [1, 2])
            .with_param("weights", Vec::<&str>::new());
        assert!(grid.is_empty());
        assert_eq!(grid.n_combinations(), 0);
        assert!(matches!(grid.combinations(), Err(KnnError::EmptyGrid)));
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::from(4usize).as_usize(), Some(4));
        assert_eq!(ParamValue::Int(-1).as_usize(), None);
        assert_eq!(ParamValue::Int(2).as_f64(), Some(2.0));
        assert_eq!(ParamValue::from("cosine").as_str(), Some("cosine"));
        assert_eq!(ParamValue::Float(1.5).as_i64(), None);
    }

    #[test]
    fn test_grid_json_round_trip() {
        let grid = ParamGrid::new()
            .with_param("n_neighbors", [3, 5])
            .with_param("p", [1.5]);

        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"{"n_neighbors":[3,5],"p":[1.5]}"#);
        let parsed: ParamGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, grid);
    }
}
