//! Grid node functional operations

use crate::error::EvaluationError;
use crate::geometry::{AttributeData, Geometry, Primitive, NORMAL_ATTRIBUTE};
use crate::nodes::three_d::geometry::PrimitiveType;
use crate::nodes::ParameterSet;
use glam::Vec3;

/// Flat grid on the XZ plane facing +Y
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub size_x: f32,
    pub size_z: f32,
    pub columns: u32,
    pub rows: u32,
    pub primitive_type: PrimitiveType,
}

impl GridGeometry {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Ok(Self {
            size_x: params.float("size_x")? as f32,
            size_z: params.float("size_z")? as f32,
            columns: params.int("columns")? as u32,
            rows: params.int("rows")? as u32,
            primitive_type: PrimitiveType::from_parameters(params)?,
        })
    }

    pub fn generate(&self) -> Result<Geometry, EvaluationError> {
        let mut geo = Geometry::new();
        let stride = self.columns + 1;

        for row in 0..=self.rows {
            let z = -self.size_z * 0.5 + self.size_z * row as f32 / self.rows as f32;
            for column in 0..=self.columns {
                let x = -self.size_x * 0.5 + self.size_x * column as f32 / self.columns as f32;
                geo.add_point(Vec3::new(x, 0.0, z));
            }
        }
        for row in 0..self.rows {
            for column in 0..self.columns {
                let at = |r: u32, c: u32| r * stride + c;
                geo.add_primitive(Primitive::quad(
                    at(row, column),
                    at(row + 1, column),
                    at(row + 1, column + 1),
                    at(row, column + 1),
                ));
            }
        }

        let normals = vec![Vec3::Y; geo.point_count()];
        geo.set_point_attribute(NORMAL_ATTRIBUTE, AttributeData::Vector(normals))
            .map_err(EvaluationError::OperationFailed)?;
        Ok(self.primitive_type.apply(geo))
    }
}
