//! Box node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::BoxGeometry;

/// Generates an axis-aligned box
#[derive(Debug, Default)]
pub struct BoxNode;

impl SopOperator for BoxNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        Ok(BoxGeometry::from_parameters(ctx.parameters)?.generate())
    }
}

impl NodeFactory for BoxNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::BOX,
            "Box",
            NodeCategory::generator(),
            "Creates a closed, optionally subdivided box",
        )
        .with_parameters(parameters::descriptors())
        .with_tags(vec!["geometry", "primitive", "box", "cube"])
    }
}
