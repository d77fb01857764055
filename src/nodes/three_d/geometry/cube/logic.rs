//! Box node functional operations - welded, subdivided box generation

use crate::error::EvaluationError;
use crate::geometry::{Geometry, Primitive};
use crate::nodes::three_d::geometry::PrimitiveType;
use crate::nodes::ParameterSet;
use glam::Vec3;
use std::collections::HashMap;

/// Core box data and functionality
#[derive(Debug, Clone)]
pub struct BoxGeometry {
    pub size: Vec3,
    /// Subdivisions along X, Y and Z
    pub segments: [u32; 3],
    pub primitive_type: PrimitiveType,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self {
            size: Vec3::splat(2.0),
            segments: [1, 1, 1],
            primitive_type: PrimitiveType::Polygon,
        }
    }
}

/// One face of the box: the fixed axis and its side, plus the two in-plane
/// axes ordered so that `u x v` points outward
const FACES: [(usize, bool, usize, usize); 6] = [
    (0, true, 1, 2),
    (0, false, 2, 1),
    (1, true, 2, 0),
    (1, false, 0, 2),
    (2, true, 0, 1),
    (2, false, 1, 0),
];

impl BoxGeometry {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Ok(Self {
            size: Vec3::new(
                params.float("width")? as f32,
                params.float("height")? as f32,
                params.float("depth")? as f32,
            ),
            segments: [
                params.int("width_segments")? as u32,
                params.int("height_segments")? as u32,
                params.int("depth_segments")? as u32,
            ],
            primitive_type: PrimitiveType::from_parameters(params)?,
        })
    }

    /// Generate a closed box centered at the origin; edge points are shared
    /// between adjacent faces
    pub fn generate(&self) -> Geometry {
        let mut geo = Geometry::new();
        let mut lattice: HashMap<[u32; 3], u32> = HashMap::new();
        let half = self.size * 0.5;

        let mut point = |geo: &mut Geometry, cell: [u32; 3]| -> u32 {
            *lattice.entry(cell).or_insert_with(|| {
                let p = Vec3::new(
                    cell[0] as f32 / self.segments[0] as f32,
                    cell[1] as f32 / self.segments[1] as f32,
                    cell[2] as f32 / self.segments[2] as f32,
                );
                geo.add_point(p * self.size - half)
            })
        };

        for &(fixed, positive, ua, va) in &FACES {
            for u in 0..self.segments[ua] {
                for v in 0..self.segments[va] {
                    let corner = |du: u32, dv: u32| {
                        let mut cell = [0u32; 3];
                        cell[fixed] = if positive { self.segments[fixed] } else { 0 };
                        cell[ua] = u + du;
                        cell[va] = v + dv;
                        cell
                    };
                    let quad = Primitive::quad(
                        point(&mut geo, corner(0, 0)),
                        point(&mut geo, corner(1, 0)),
                        point(&mut geo, corner(1, 1)),
                        point(&mut geo, corner(0, 1)),
                    );
                    geo.add_primitive(quad);
                }
            }
        }

        self.primitive_type.apply(geo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_box_is_welded() {
        let geo = BoxGeometry::default().generate();
        assert_eq!(geo.point_count(), 8);
        assert_eq!(geo.primitive_count(), 6);
        let bounds = geo.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }

    #[test]
    fn test_subdivided_box_counts() {
        let geo = BoxGeometry { segments: [2, 3, 4], ..Default::default() }.generate();
        assert_eq!(geo.primitive_count(), 2 * (2 * 3 + 3 * 4 + 2 * 4));
        // Surface points of a 3x4x5 lattice
        assert_eq!(geo.point_count(), 3 * 4 * 5 - 1 * 2 * 3);
    }

    #[test]
    fn test_faces_point_outward() {
        let geo = BoxGeometry::default().generate();
        for prim in geo.primitives() {
            let p: Vec<Vec3> = prim.vertices.iter().map(|&v| geo.points()[v as usize]).collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2] + p[3]) * 0.25;
            assert!(normal.dot(centroid) > 0.0);
        }
    }
}
