//! Named, typed values attached to a case (inputs) or produced by a simulation (outputs).
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

/// A single named value.
///
/// Arrays and matrices are stored as given; a matrix is a list of rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// A single number
    Number(f64),
    /// A one-dimensional sequence of numbers
    Array(Vec<f64>),
    /// A two-dimensional table of numbers, stored row by row
    Matrix(Vec<Vec<f64>>),
    /// Free text
    Text(String),
}

impl VarValue {
    /// The value as a single number.
    ///
    /// Arrays and matrices yield their first cell. Text and empty sequences yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VarValue::Number(value) => Some(*value),
            VarValue::Array(values) => values.first().copied(),
            VarValue::Matrix(rows) => rows.iter().flatten().next().copied(),
            VarValue::Text(_) => None,
        }
    }

    /// All numeric cells in row-major order, or `None` for text.
    pub fn cells(&self) -> Option<Vec<f64>> {
        match self {
            VarValue::Number(value) => Some(vec![*value]),
            VarValue::Array(values) => Some(values.clone()),
            VarValue::Matrix(rows) => Some(rows.iter().flatten().copied().collect()),
            VarValue::Text(_) => None,
        }
    }

    /// The number of numeric cells held
    pub fn len(&self) -> usize {
        match self {
            VarValue::Number(_) => 1,
            VarValue::Array(values) => values.len(),
            VarValue::Matrix(rows) => rows.iter().map(Vec::len).sum(),
            VarValue::Text(_) => 0,
        }
    }

    /// Whether the value holds no numeric cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Number(value)
    }
}

impl From<Vec<f64>> for VarValue {
    fn from(values: Vec<f64>) -> Self {
        VarValue::Array(values)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::Text(value.to_string())
    }
}

/// A store of named values, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct VariableStore(IndexMap<String, VarValue>);

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.0.get(name)
    }

    /// Whether a value with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Set a value, replacing any existing value with the same name
    pub fn set<V: Into<VarValue>>(&mut self, name: &str, value: V) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Get a value which must be present and numeric
    pub fn get_number(&self, name: &str) -> Result<f64> {
        self.get(name)
            .with_context(|| format!("Variable {name} not found"))?
            .as_number()
            .with_context(|| format!("Variable {name} is not a number"))
    }

    /// Get the numeric cells of a value, or `None` if it is absent
    pub fn get_cells(&self, name: &str) -> Result<Option<Vec<f64>>> {
        self.get(name)
            .map(|value| {
                value
                    .cells()
                    .with_context(|| format!("Variable {name} is not numeric"))
            })
            .transpose()
    }

    /// Iterate over the names and values in the store
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The number of values in the store
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, VarValue)> for VariableStore {
    fn from_iter<I: IntoIterator<Item = (S, VarValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}
