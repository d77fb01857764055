//! Geometry generator nodes

pub mod cube;
pub mod grid;
pub mod sphere;

pub use cube::BoxNode;
pub use grid::GridNode;
pub use sphere::SphereNode;

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::defaults::GeometryDefaults;
use crate::nodes::{ParameterDescriptor, ParameterSet};

/// Output form shared by every generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    #[default]
    Polygon,
    /// Points only, no primitives
    Points,
}

impl PrimitiveType {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        match params.int("primitive_type")? {
            0 => Ok(PrimitiveType::Polygon),
            1 => Ok(PrimitiveType::Points),
            other => Err(EvaluationError::OperationFailed(format!(
                "unknown primitive type {}",
                other
            ))),
        }
    }

    pub fn apply(self, mut geometry: Geometry) -> Geometry {
        if self == PrimitiveType::Points {
            geometry.clear_primitives();
        }
        geometry
    }
}

pub(crate) fn primitive_type_parameter() -> ParameterDescriptor {
    ParameterDescriptor {
        category: "Universal",
        description: "Output geometry type (polygon mesh or point cloud)",
        ..ParameterDescriptor::choice("primitive_type", "Primitive Type", 0, &GeometryDefaults::PRIMITIVE_TYPES)
    }
}
