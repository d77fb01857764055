//! Operator interface between node types and the cook engine

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::kernels::Kernels;
use crate::nodes::parameters::ParameterSet;
use crate::nodes::NodeId;
use std::sync::Arc;

/// Everything an operator may look at while cooking one node
pub struct CookContext<'a> {
    pub node_id: NodeId,
    pub title: &'a str,
    pub parameters: &'a ParameterSet,
    /// Upstream results in slot order, `None` for unconnected slots
    pub inputs: Vec<Option<Arc<Geometry>>>,
    pub kernels: &'a Kernels,
}

impl<'a> CookContext<'a> {
    /// Geometry connected to `slot`
    pub fn input(&self, slot: usize) -> Result<&Geometry, EvaluationError> {
        self.inputs
            .get(slot)
            .and_then(|g| g.as_deref())
            .ok_or_else(|| {
                EvaluationError::OperationFailed(format!("input {} is not connected", slot))
            })
    }

    /// Connected inputs only, in slot order
    pub fn connected_inputs(&self) -> impl Iterator<Item = &Geometry> {
        self.inputs.iter().filter_map(|g| g.as_deref())
    }
}

/// Compute behavior of a node type
///
/// Operators must be pure functions of their parameters and inputs. They
/// never mutate their inputs; a working copy is cloned when needed.
pub trait SopOperator: Send + Sync {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError>;
}

impl<F> SopOperator for F
where
    F: Fn(&CookContext<'_>) -> Result<Geometry, EvaluationError> + Send + Sync,
{
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        self(ctx)
    }
}
