//! Null node - passes its input through unchanged

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};

#[derive(Debug, Default)]
pub struct NullNode;

impl SopOperator for NullNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        Ok(ctx.input(0)?.clone())
    }
}

impl NodeFactory for NullNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::NULL,
            "Null",
            NodeCategory::utility(),
            "Passes geometry through; useful as a named output",
        )
        .with_inputs(InputConfig::single())
        .with_tags(vec!["utility", "null", "passthrough"])
    }
}
