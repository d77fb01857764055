//! Sphere node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::SphereGeometry;

/// Generates a UV sphere
#[derive(Debug, Default)]
pub struct SphereNode;

impl SopOperator for SphereNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        SphereGeometry::from_parameters(ctx.parameters)?.generate()
    }
}

impl NodeFactory for SphereNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::SPHERE,
            "Sphere",
            NodeCategory::generator(),
            "Creates a closed UV sphere",
        )
        .with_parameters(parameters::descriptors())
        .with_tags(vec!["geometry", "primitive", "sphere"])
    }
}
