//! Boolean node module - mesh booleans through the geometry kernel

pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::kernels::BooleanOperation;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};

/// Union, intersection or difference of inputs A (slot 0) and B (slot 1)
#[derive(Debug, Default)]
pub struct BooleanNode;

impl SopOperator for BooleanNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        let index = ctx.parameters.int("operation")?;
        let operation = BooleanOperation::from_index(index).ok_or_else(|| {
            EvaluationError::OperationFailed(format!("unknown boolean operation {}", index))
        })?;
        let a = ctx.input(0)?;
        let b = ctx.input(1)?;
        log::debug!(
            "{} '{}': {} of {} and {} primitives",
            ctx.kernels.geometry.name(),
            ctx.title,
            operation,
            a.primitive_count(),
            b.primitive_count()
        );
        Ok(ctx.kernels.geometry.boolean(operation, a, b)?)
    }
}

impl NodeFactory for BooleanNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::BOOLEAN,
            "Boolean",
            NodeCategory::modifier(),
            "Combines two closed meshes with union, intersection or difference",
        )
        .with_parameters(parameters::descriptors())
        .with_inputs(InputConfig::multiple(2, Some(2), 2))
        .with_tags(vec!["modify", "boolean", "csg"])
    }
}
