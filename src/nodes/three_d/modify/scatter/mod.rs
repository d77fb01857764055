//! Scatter node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::ScatterLogic;

/// Distributes seeded random points over the input surface
#[derive(Debug, Default)]
pub struct ScatterNode;

impl SopOperator for ScatterNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        ScatterLogic::from_parameters(ctx.parameters)?.apply(ctx.input(0)?)
    }
}

impl NodeFactory for ScatterNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::SCATTER,
            "Scatter",
            NodeCategory::modifier(),
            "Scatters points over a surface, weighted by area",
        )
        .with_parameters(parameters::descriptors())
        .with_inputs(InputConfig::single())
        .with_tags(vec!["modify", "scatter", "points", "random"])
    }
}
