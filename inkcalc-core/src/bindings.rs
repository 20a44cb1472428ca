//! Symbolic variable bindings sent alongside every submission.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CanvasResult;

/// A bound value: either numeric or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingValue {
    /// Numeric value.
    Number(f64),
    /// Any other value, kept verbatim.
    Text(String),
}

impl BindingValue {
    /// Interpret a service result string, preferring a finite number.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for BindingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Name-to-value mapping accumulated across submissions.
///
/// Serializes as a flat JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBindings(BTreeMap<String, BindingValue>);

impl VariableBindings {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the previous value if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<BindingValue>,
    ) -> Option<BindingValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindingValue> {
        self.0.get(name)
    }

    /// Remove a binding.
    pub fn remove(&mut self, name: &str) -> Option<BindingValue> {
        self.0.remove(name)
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON text for the `variables` form field.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
