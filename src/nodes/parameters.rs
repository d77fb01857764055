//! Parameter descriptors, values and per-node parameter storage
//!
//! Every node type declares its parameters once, as plain data, when it is
//! registered. A node instance stores one value per declared parameter in
//! declaration order. Writes are validated against the descriptor before
//! anything is stored, so an invalid value is never observable.

use crate::error::{ConfigurationError, EvaluationError};
use crate::nodes::factory::NodeMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Value kinds a parameter can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ParameterKind {
    /// Get a human-readable name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            ParameterKind::Int => "integer",
            ParameterKind::Float => "float",
            ParameterKind::Bool => "boolean",
            ParameterKind::Text => "text",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Int(_) => ParameterKind::Int,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Bool(_) => ParameterKind::Bool,
            ParameterValue::Text(_) => ParameterKind::Text,
        }
    }

    /// Numeric view of integer and float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Int(i) => Some(*i as f64),
            ParameterValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        if let ParameterValue::Int(i) = self { Some(*i) } else { None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let ParameterValue::Bool(b) = self { Some(*b) } else { None }
    }

    pub fn as_text(&self) -> Option<&str> {
        if let ParameterValue::Text(s) = self { Some(s) } else { None }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Int(i) => write!(f, "{}", i),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Bool(b) => write!(f, "{}", b),
            ParameterValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(v as i64)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::Text(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::Text(v)
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static description of one parameter of a node type
///
/// Descriptors are data only. Node types build them with the kind
/// constructors below and fill in the optional fields with struct update
/// syntax:
///
/// ```
/// use sopgraph::nodes::{ParameterDescriptor, ParameterRange};
///
/// let radius = ParameterDescriptor {
///     range: Some(ParameterRange::new(0.01, 100.0)),
///     category: "Size",
///     description: "Radius of the sphere",
///     ..ParameterDescriptor::float("radius", "Radius", 1.0)
/// };
/// assert_eq!(radius.name, "radius");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
    pub default: ParameterValue,
    pub range: Option<ParameterRange>,
    pub options: Vec<&'static str>,
    pub category: &'static str,
    pub description: &'static str,
}

impl ParameterDescriptor {
    fn base(name: &'static str, label: &'static str, default: ParameterValue) -> Self {
        Self {
            name,
            label,
            kind: default.kind(),
            default,
            range: None,
            options: Vec::new(),
            category: "",
            description: "",
        }
    }

    pub fn int(name: &'static str, label: &'static str, default: i64) -> Self {
        Self::base(name, label, ParameterValue::Int(default))
    }

    pub fn float(name: &'static str, label: &'static str, default: f64) -> Self {
        Self::base(name, label, ParameterValue::Float(default))
    }

    pub fn bool(name: &'static str, label: &'static str, default: bool) -> Self {
        Self::base(name, label, ParameterValue::Bool(default))
    }

    pub fn text(name: &'static str, label: &'static str, default: &str) -> Self {
        Self::base(name, label, ParameterValue::Text(default.to_string()))
    }

    /// Integer parameter whose value is an index into `options`
    pub fn choice(
        name: &'static str,
        label: &'static str,
        default_index: i64,
        options: &[&'static str],
    ) -> Self {
        Self {
            options: options.to_vec(),
            ..Self::base(name, label, ParameterValue::Int(default_index))
        }
    }

    /// Check a candidate value against kind, range and option constraints
    pub fn validate(&self, value: &ParameterValue) -> Result<(), ConfigurationError> {
        if value.kind() != self.kind {
            return Err(ConfigurationError::TypeMismatch {
                parameter: self.name.to_string(),
                expected: self.kind,
                got: value.kind(),
            });
        }

        if let Some(number) = value.as_f64() {
            let (min, max) = self
                .range
                .map(|r| (r.min, r.max))
                .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
            if !number.is_finite() || number < min || number > max {
                return Err(ConfigurationError::OutOfRange {
                    parameter: self.name.to_string(),
                    value: number,
                    min,
                    max,
                });
            }
        }

        if !self.options.is_empty() {
            let accepted = match value {
                ParameterValue::Int(index) => {
                    *index >= 0 && (*index as usize) < self.options.len()
                }
                ParameterValue::Text(text) => self.options.iter().any(|o| o == text),
                _ => true,
            };
            if !accepted {
                let shown = match value {
                    ParameterValue::Text(text) => text.clone(),
                    other => other.to_string(),
                };
                return Err(ConfigurationError::InvalidOption {
                    parameter: self.name.to_string(),
                    value: shown,
                    options: self.options.iter().map(|o| o.to_string()).collect(),
                });
            }
        }

        Ok(())
    }
}

/// Current parameter values of one node, in declaration order
#[derive(Debug, Clone)]
pub struct ParameterSet {
    metadata: Arc<NodeMetadata>,
    values: Vec<ParameterValue>,
}

impl ParameterSet {
    /// Initialize every declared parameter with its default
    pub fn from_defaults(metadata: Arc<NodeMetadata>) -> Self {
        let values = metadata.parameters.iter().map(|d| d.default.clone()).collect();
        Self { metadata, values }
    }

    fn index_of(&self, name: &str) -> Result<usize, ConfigurationError> {
        self.metadata
            .parameters
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| ConfigurationError::UnknownParameter {
                node_type: self.metadata.node_type.to_string(),
                parameter: name.to_string(),
            })
    }

    pub fn descriptor(&self, name: &str) -> Result<&ParameterDescriptor, ConfigurationError> {
        let index = self.index_of(name)?;
        Ok(&self.metadata.parameters[index])
    }

    pub fn get(&self, name: &str) -> Result<&ParameterValue, ConfigurationError> {
        let index = self.index_of(name)?;
        Ok(&self.values[index])
    }

    /// Validate and store a value. Returns whether the stored value changed.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> Result<bool, ConfigurationError> {
        let index = self.index_of(name)?;
        self.metadata.parameters[index].validate(&value)?;
        if self.values[index] == value {
            return Ok(false);
        }
        self.values[index] = value;
        Ok(true)
    }

    /// Descriptor/value pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterDescriptor, &ParameterValue)> {
        self.metadata.parameters.iter().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // Typed accessors used by operators. A missing or mistyped parameter is a
    // defect in the operator's own declaration, reported as a cook failure.

    fn typed<T>(
        &self,
        name: &str,
        extract: impl FnOnce(&ParameterValue) -> Option<T>,
    ) -> Result<T, EvaluationError> {
        let value = self
            .get(name)
            .map_err(|e| EvaluationError::OperationFailed(e.to_string()))?;
        extract(value).ok_or_else(|| {
            EvaluationError::OperationFailed(format!(
                "parameter '{}' has unexpected kind {}",
                name,
                value.kind()
            ))
        })
    }

    pub fn float(&self, name: &str) -> Result<f64, EvaluationError> {
        self.typed(name, ParameterValue::as_f64)
    }

    pub fn int(&self, name: &str) -> Result<i64, EvaluationError> {
        self.typed(name, ParameterValue::as_int)
    }

    pub fn bool(&self, name: &str) -> Result<bool, EvaluationError> {
        self.typed(name, ParameterValue::as_bool)
    }

    pub fn text(&self, name: &str) -> Result<String, EvaluationError> {
        self.typed(name, |v| v.as_text().map(str::to_string))
    }
}
