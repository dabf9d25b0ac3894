//! Flat parameter sets describing a financial plan
//!
//! A `ParameterSet` is the only input the remote engine sees. Every variant
//! derived from a baseline is a fresh value; the baseline is never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single plan field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Choice(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Flag(_) => "boolean",
            ParamValue::Number(_) => "numeric",
            ParamValue::Choice(_) => "choice",
        }
    }

    pub fn same_kind(&self, other: &ParamValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Choice(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Choice(value)
    }
}

/// Named plan fields, ordered by name for stable equality and serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    fields: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&ParamValue> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(ParamValue::as_number)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Set a field, returning the previous value. Crate-internal so derived
    /// sets are only produced through the delta functions.
    pub(crate) fn set(&mut self, field: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.fields.insert(field.into(), value)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
