//! Wrangle node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::WrangleLogic;

/// Runs a user expression over every point
#[derive(Debug, Default)]
pub struct WrangleNode;

impl SopOperator for WrangleNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        let logic = WrangleLogic::from_parameters(ctx.parameters)?;
        logic.apply(ctx.kernels.expressions.as_ref(), ctx.input(0)?)
    }
}

impl NodeFactory for WrangleNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::WRANGLE,
            "Wrangle",
            NodeCategory::modifier(),
            "Modifies point positions and attributes with an expression",
        )
        .with_parameters(parameters::descriptors())
        .with_inputs(InputConfig::single())
        .with_tags(vec!["modify", "wrangle", "expression", "attribute"])
    }
}
