//! Smooth node module

pub mod logic;
pub mod parameters;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::{CookContext, InputConfig, NodeCategory, NodeFactory, NodeMetadata, NodeType, SopOperator};
use logic::SmoothLogic;

/// Laplacian smoothing through the geometry kernel
#[derive(Debug, Default)]
pub struct SmoothNode;

impl SopOperator for SmoothNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        let logic = SmoothLogic::from_parameters(ctx.parameters)?;
        logic.apply(ctx.kernels.geometry.as_ref(), ctx.input(0)?)
    }
}

impl NodeFactory for SmoothNode {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            NodeType::SMOOTH,
            "Smooth",
            NodeCategory::modifier(),
            "Relaxes point positions towards their neighbours",
        )
        .with_parameters(parameters::descriptors())
        .with_inputs(InputConfig::single())
        .with_tags(vec!["modify", "smooth", "laplacian", "relax"])
    }
}
