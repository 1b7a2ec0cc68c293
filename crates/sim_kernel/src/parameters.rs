//! Typed parameter sets handed to plugins and attached to events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One parameter value. Integers read as doubles when a double is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    IntVector(Vec<i64>),
    DoubleVector(Vec<f64>),
    StringVector(Vec<String>),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        }

        match self {
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::Double(v) => write!(f, "{}", v),
            ParameterValue::String(v) => f.write_str(v),
            ParameterValue::IntVector(v) => f.write_str(&join(v)),
            ParameterValue::DoubleVector(v) => f.write_str(&join(v)),
            ParameterValue::StringVector(v) => f.write_str(&v.join(",")),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Double(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

/// Named parameters, ordered by key so flattened output is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParameterValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.0.get(key)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            ParameterValue::Double(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ParameterValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_string_vector(&self, key: &str) -> Option<&[String]> {
        match self.0.get(key)? {
            ParameterValue::StringVector(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    /// Flatten into `(name, value)` string pairs.
    pub fn flatten(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_read_as_doubles() {
        let params = ParameterSet::new().with("Count", 3i64).with("Velocity", 12.5);
        assert_eq!(params.get_double("Count"), Some(3.0));
        assert_eq!(params.get_int("Count"), Some(3));
        assert_eq!(params.get_int("Velocity"), None);
        assert_eq!(params.get_double("Missing"), None);
    }

    #[test]
    fn json_values_pick_the_narrowest_variant() {
        let params: ParameterSet =
            serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": "x", "d": [1.0, 2.5], "e": true}"#)
                .unwrap();
        assert_eq!(params.get("a"), Some(&ParameterValue::Int(1)));
        assert_eq!(params.get("b"), Some(&ParameterValue::Double(1.5)));
        assert_eq!(params.get_string("c"), Some("x"));
        assert_eq!(
            params.get("d"),
            Some(&ParameterValue::DoubleVector(vec![1.0, 2.5]))
        );
        assert_eq!(params.get_bool("e"), Some(true));
    }

    #[test]
    fn flatten_is_key_ordered() {
        let params = ParameterSet::new().with("z", "last").with("a", 1i64);
        assert_eq!(
            params.flatten(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("z".to_string(), "last".to_string())
            ]
        );
    }
}
