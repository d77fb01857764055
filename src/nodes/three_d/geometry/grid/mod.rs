//! Grid node module

pub mod logic;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::defaults::GeometryDefaults;
use crate::nodes::three_d::geometry::primitive_type_parameter;
use crate::nodes::{CookContext, NodeCategory, NodeFactory, NodeMetadata, NodeType, ParameterDescriptor, SopOperator};
use logic::GridGeometry;

/// Generates a subdivided plane
#[derive(Debug, Default)]
pub struct GridNode;

impl SopOperator for GridNode {
    fn compute(&self, ctx: &CookContext<'_>) -> Result<Geometry, EvaluationError> {
        GridGeometry::from_parameters(ctx.parameters)?.generate()
    }
}

impl NodeFactory for GridNode {
    fn metadata() -> NodeMetadata {
        let size = |name: &'static str, label: &'static str, description: &'static str| ParameterDescriptor {
            range: Some(GeometryDefaults::GRID_SIZE_RANGE),
            category: "Size",
            description,
            ..ParameterDescriptor::float(name, label, GeometryDefaults::GRID_SIZE_DEFAULT)
        };
        let resolution = |name: &'static str, label: &'static str, description: &'static str| ParameterDescriptor {
            range: Some(GeometryDefaults::GRID_RESOLUTION_RANGE),
            category: "Resolution",
            description,
            ..ParameterDescriptor::int(name, label, GeometryDefaults::GRID_RESOLUTION_DEFAULT)
        };

        NodeMetadata::new(
            NodeType::GRID,
            "Grid",
            NodeCategory::generator(),
            "Creates a flat grid on the XZ plane",
        )
        .with_parameters(vec![
            primitive_type_parameter(),
            size("size_x", "Size X", "Width of the grid in X direction"),
            size("size_z", "Size Z", "Depth of the grid in Z direction"),
            resolution("columns", "Columns", "Number of divisions along X axis"),
            resolution("rows", "Rows", "Number of divisions along Z axis"),
        ])
        .with_tags(vec!["geometry", "primitive", "grid", "plane"])
    }
}
