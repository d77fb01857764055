//! Contracts to the external geometry kernel and expression evaluator
//!
//! Operators never implement boolean or mesh-processing algorithms
//! themselves; they hand geometry to a [`GeometryKernel`]. Wrangle-style
//! operators hand user snippets to an [`ExpressionEvaluator`]. The engine
//! owns one [`Kernels`] bundle and lends it to every cook.

pub mod expression;
pub mod reference;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use expression::BasicEvaluator;
pub use reference::ReferenceKernel;

/// Boolean operations a kernel must support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperation {
    Union,
    Intersection,
    Difference,
}

impl BooleanOperation {
    /// Option labels in parameter index order
    pub const LABELS: [&'static str; 3] = ["Union", "Intersection", "Difference"];

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(BooleanOperation::Union),
            1 => Some(BooleanOperation::Intersection),
            2 => Some(BooleanOperation::Difference),
            _ => None,
        }
    }
}

impl fmt::Display for BooleanOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BooleanOperation::Union => "union",
            BooleanOperation::Intersection => "intersection",
            BooleanOperation::Difference => "difference",
        };
        f.write_str(label)
    }
}

/// Failure reported by a geometry kernel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// Input rejected, e.g. non-manifold or self-intersecting
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Kernel-internal failure
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl From<KernelError> for EvaluationError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::InvalidGeometry(msg) => EvaluationError::InvalidGeometry(msg),
            KernelError::OperationFailed(msg) => EvaluationError::OperationFailed(msg),
        }
    }
}

/// Native mesh-processing collaborator
///
/// Implementations must be deterministic: identical inputs produce
/// identical outputs, because cooked results are memoized.
pub trait GeometryKernel: Send + Sync {
    fn name(&self) -> &str;

    fn boolean(
        &self,
        operation: BooleanOperation,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<Geometry, KernelError>;

    fn smooth(
        &self,
        geometry: &Geometry,
        iterations: u32,
        strength: f32,
    ) -> Result<Geometry, KernelError>;
}

/// Variables visible to an expression, updated in place by assignments
pub type VariableMap = BTreeMap<String, f64>;

/// Failure reported by an expression evaluator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {position})")]
pub struct ExpressionFailure {
    pub message: String,
    /// Byte offset into the snippet
    pub position: usize,
}

impl ExpressionFailure {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Attach the offending snippet for reporting as a cook failure
    pub fn into_evaluation_error(self, snippet: &str) -> EvaluationError {
        EvaluationError::Expression {
            expression: snippet.to_string(),
            position: self.position,
            message: self.message,
        }
    }
}

/// Per-element expression collaborator
pub trait ExpressionEvaluator: Send + Sync {
    /// Run `snippet` against `variables`, writing assigned values back
    fn execute(&self, snippet: &str, variables: &mut VariableMap) -> Result<(), ExpressionFailure>;
}

/// The collaborators lent to operators during a cook
#[derive(Clone)]
pub struct Kernels {
    pub geometry: Arc<dyn GeometryKernel>,
    pub expressions: Arc<dyn ExpressionEvaluator>,
}

impl Kernels {
    pub fn new(geometry: Arc<dyn GeometryKernel>, expressions: Arc<dyn ExpressionEvaluator>) -> Self {
        Self { geometry, expressions }
    }
}

impl Default for Kernels {
    fn default() -> Self {
        Self {
            geometry: Arc::new(ReferenceKernel::default()),
            expressions: Arc::new(BasicEvaluator::new()),
        }
    }
}

impl fmt::Debug for Kernels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernels")
            .field("geometry", &self.geometry.name())
            .finish_non_exhaustive()
    }
}
