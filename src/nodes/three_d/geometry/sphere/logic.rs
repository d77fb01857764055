//! Sphere node functional operations - geometry generation logic

use crate::error::EvaluationError;
use crate::geometry::{AttributeData, Geometry, Primitive, NORMAL_ATTRIBUTE};
use crate::nodes::three_d::geometry::PrimitiveType;
use crate::nodes::ParameterSet;
use glam::Vec3;
use std::f32::consts::PI;

/// Core sphere data and functionality
#[derive(Debug, Clone)]
pub struct SphereGeometry {
    pub radius: f32,
    /// Divisions around the Y axis
    pub segments: u32,
    /// Divisions from pole to pole
    pub rings: u32,
    pub primitive_type: PrimitiveType,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self {
            radius: 1.0,
            segments: 32,
            rings: 16,
            primitive_type: PrimitiveType::Polygon,
        }
    }
}

impl SphereGeometry {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Ok(Self {
            radius: params.float("radius")? as f32,
            segments: params.int("segments")? as u32,
            rings: params.int("rings")? as u32,
            primitive_type: PrimitiveType::from_parameters(params)?,
        })
    }

    /// Generate a closed UV sphere with a single point at each pole
    pub fn generate(&self) -> Result<Geometry, EvaluationError> {
        let mut geo = Geometry::new();
        let mut normals = Vec::new();

        let top = geo.add_point(Vec3::Y * self.radius);
        normals.push(Vec3::Y);

        for ring in 1..self.rings {
            let theta = ring as f32 / self.rings as f32 * PI;
            let (sin_theta, cos_theta) = theta.sin_cos();
            for segment in 0..self.segments {
                let phi = segment as f32 / self.segments as f32 * 2.0 * PI;
                let (sin_phi, cos_phi) = phi.sin_cos();
                let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
                geo.add_point(normal * self.radius);
                normals.push(normal);
            }
        }

        let bottom = geo.add_point(-Vec3::Y * self.radius);
        normals.push(-Vec3::Y);

        let ring_point = |ring: u32, segment: u32| 1 + (ring - 1) * self.segments + segment % self.segments;

        for s in 0..self.segments {
            geo.add_primitive(Primitive::triangle(top, ring_point(1, s + 1), ring_point(1, s)));
        }
        for ring in 1..self.rings - 1 {
            for s in 0..self.segments {
                geo.add_primitive(Primitive::quad(
                    ring_point(ring, s),
                    ring_point(ring, s + 1),
                    ring_point(ring + 1, s + 1),
                    ring_point(ring + 1, s),
                ));
            }
        }
        let last = self.rings - 1;
        for s in 0..self.segments {
            geo.add_primitive(Primitive::triangle(bottom, ring_point(last, s), ring_point(last, s + 1)));
        }

        // One normal per point by construction
        geo.set_point_attribute(NORMAL_ATTRIBUTE, AttributeData::Vector(normals))
            .map_err(EvaluationError::OperationFailed)?;
        Ok(self.primitive_type.apply(geo))
    }
}
