//! Expected status shapes and snapshot comparison

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Point-in-time mapping of status field names to values
pub type Snapshot = Map<String, Value>;

/// Expectation for a single status field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldExpectation {
    /// Exact match; numbers compare by numeric value
    Equals(Value),
    /// Numeric match within `tolerance`
    Close { value: f64, tolerance: f64 },
}

impl FieldExpectation {
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            FieldExpectation::Equals(expected) => values_equal(expected, actual),
            FieldExpectation::Close { value, tolerance } => actual
                .as_f64()
                .map(|actual| (actual - value).abs() <= *tolerance)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for FieldExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldExpectation::Equals(value) => write!(f, "{value}"),
            FieldExpectation::Close { value, tolerance } => write!(f, "{value}±{tolerance}"),
        }
    }
}

fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => match (e.as_f64(), a.as_f64()) {
            (Some(e), Some(a)) => e == a,
            _ => e == a,
        },
        _ => expected == actual,
    }
}

/// Partial mapping of field name to expected value.
///
/// Only the fields named here take part in a comparison; every other field
/// of the observed snapshot is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusShape {
    fields: Vec<(String, FieldExpectation)>,
}

impl StatusShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` to equal `value`
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name.into(), FieldExpectation::Equals(value.into()));
        self
    }

    /// Require numeric `name` to be within `tolerance` of `value`
    pub fn close(mut self, name: impl Into<String>, value: f64, tolerance: f64) -> Self {
        self.insert(
            name.into(),
            FieldExpectation::Close {
                value,
                tolerance: tolerance.abs(),
            },
        );
        self
    }

    fn insert(&mut self, name: String, expectation: FieldExpectation) {
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(entry) => entry.1 = expectation,
            None => self.fields.push((name, expectation)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, name: &str) -> Option<&FieldExpectation> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, expectation)| expectation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldExpectation)> {
        self.fields.iter().map(|(name, e)| (name.as_str(), e))
    }

    /// Describe every expected field the snapshot does not satisfy
    pub fn mismatches(&self, snapshot: &Snapshot) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|(name, expectation)| match snapshot.get(name) {
                Some(actual) if expectation.matches(actual) => None,
                Some(actual) => Some(format!("{name}: expected {expectation}, got {actual}")),
                None => Some(format!("{name}: expected {expectation}, field missing")),
            })
            .collect()
    }

    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        self.fields
            .iter()
            .all(|(name, e)| snapshot.get(name).is_some_and(|actual| e.matches(actual)))
    }
}

impl From<Snapshot> for StatusShape {
    fn from(map: Snapshot) -> Self {
        map.into_iter()
            .fold(Self::new(), |shape, (name, value)| shape.field(name, value))
    }
}

impl fmt::Display for StatusShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, expectation)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {expectation}")?;
        }
        write!(f, "}}")
    }
}
