//! Merge node - combines every connected input into one geometry

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};

#[derive(Debug, Default)]
pub struct MergeNode;

/// Append `inputs` in order; attributes missing on one side are zero-filled
pub fn merge_all<'a>(inputs: impl IntoIterator<Item = &'a Geometry>) -> Result<Geometry, EvaluationError> {
    let mut merged = Geometry::new();
    for geometry in inputs {
        merged.append(geometry).map_err(EvaluationError::InvalidGeometry)?;
    }
    Ok(merged)
}

impl SopOperator for MergeNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        merge_all(ctx.connected_inputs())
    }
}

impl NodeFactory for MergeNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::MERGE,
            "Merge",
            NodeCategory::utility(),
            "Combines all connected inputs in slot order",
        )
        .with_inputs(InputConfig::multiple(2, None, 1))
        .with_tags(vec!["utility", "merge", "combine"])
    }
}
