//! Transform node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::TransformLogic;

/// Applies scale, rotation and translation to its input
#[derive(Debug, Default)]
pub struct TransformNode;

impl SopOperator for TransformNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        let logic = TransformLogic::from_parameters(ctx.parameters)?;
        Ok(logic.apply(ctx.input(0)?))
    }
}

impl NodeFactory for TransformNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::TRANSFORM,
            "Transform",
            NodeCategory::modifier(),
            "Translates, rotates and scales geometry",
        )
        .with_parameters(parameters::descriptors())
        .with_inputs(InputConfig::single())
        .with_tags(vec!["transform", "translate", "rotate", "scale"])
    }
}
