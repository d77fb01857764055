//! Reference geometry kernel
//!
//! A small, dependency-free stand-in for a production mesh library. Boolean
//! operations classify whole primitives as inside or outside the other
//! operand by ray parity from their centroids; they do not split faces along
//! the intersection curve. Smoothing is uniform Laplacian relaxation.

use super::{BooleanOperation, GeometryKernel, KernelError};
use crate::geometry::Geometry;
use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};

/// Ray direction chosen to avoid grazing axis-aligned edges
const RAY_DIRECTION: Vec3 = Vec3::new(0.952_312, 0.271_345, 0.139_482);
const RAY_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Default)]
pub struct ReferenceKernel;

impl ReferenceKernel {
    /// Check that `geometry` is a closed, consistently oriented 2-manifold
    pub fn validate_manifold(geometry: &Geometry) -> Result<(), KernelError> {
        geometry
            .validate_topology()
            .map_err(KernelError::InvalidGeometry)?;
        if geometry.primitive_count() == 0 {
            return Err(KernelError::InvalidGeometry("mesh has no primitives".into()));
        }

        let mut directed: BTreeMap<(u32, u32), usize> = BTreeMap::new();
        for prim in geometry.primitives() {
            let n = prim.vertices.len();
            for i in 0..n {
                let edge = (prim.vertices[i], prim.vertices[(i + 1) % n]);
                *directed.entry(edge).or_insert(0) += 1;
            }
        }
        for (&(a, b), &count) in &directed {
            if count > 1 {
                return Err(KernelError::InvalidGeometry(format!(
                    "edge ({}, {}) is used {} times with the same orientation",
                    a, b, count
                )));
            }
            if !directed.contains_key(&(b, a)) {
                return Err(KernelError::InvalidGeometry(format!(
                    "edge ({}, {}) is a boundary edge, mesh is not closed",
                    a, b
                )));
            }
        }
        Ok(())
    }

    /// Ray-parity containment test against a closed mesh
    pub fn contains_point(mesh: &Geometry, point: Vec3) -> bool {
        let points = mesh.points();
        let hits = mesh
            .triangles()
            .iter()
            .filter(|[a, b, c]| {
                ray_hits_triangle(point, points[*a as usize], points[*b as usize], points[*c as usize])
            })
            .count();
        hits % 2 == 1
    }

    fn primitives_where(mesh: &Geometry, other: &Geometry, inside: bool) -> BTreeSet<usize> {
        (0..mesh.primitive_count())
            .filter(|&i| {
                mesh.primitive_centroid(i)
                    .map(|c| Self::contains_point(other, c) == inside)
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Möller-Trumbore intersection along `RAY_DIRECTION`
fn ray_hits_triangle(origin: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = RAY_DIRECTION.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < RAY_EPSILON {
        return false;
    }
    let inv = 1.0 / det;
    let s = origin - v0;
    let u = inv * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(edge1);
    let v = inv * RAY_DIRECTION.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    inv * edge2.dot(q) > RAY_EPSILON
}

impl GeometryKernel for ReferenceKernel {
    fn name(&self) -> &str {
        "reference"
    }

    fn boolean(
        &self,
        operation: BooleanOperation,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<Geometry, KernelError> {
        for (label, mesh) in [("A", a), ("B", b)] {
            Self::validate_manifold(mesh).map_err(|e| match e {
                KernelError::InvalidGeometry(msg) => {
                    KernelError::InvalidGeometry(format!("input {}: {}", label, msg))
                }
                other => other,
            })?;
        }

        let (keep_a_inside, keep_b_inside, flip_b) = match operation {
            BooleanOperation::Union => (false, false, false),
            BooleanOperation::Intersection => (true, true, false),
            BooleanOperation::Difference => (false, true, true),
        };

        let kept_a = Self::primitives_where(a, b, keep_a_inside);
        let kept_b = Self::primitives_where(b, a, keep_b_inside);

        let mut result = a.retain_primitives(|i| kept_a.contains(&i));
        let mut from_b = b.retain_primitives(|i| kept_b.contains(&i));
        if flip_b {
            from_b.reverse_winding();
        }
        result.append(&from_b).map_err(KernelError::InvalidGeometry)?;
        Ok(result)
    }

    fn smooth(
        &self,
        geometry: &Geometry,
        iterations: u32,
        strength: f32,
    ) -> Result<Geometry, KernelError> {
        geometry
            .validate_topology()
            .map_err(KernelError::InvalidGeometry)?;
        if !strength.is_finite() {
            return Err(KernelError::OperationFailed(format!("invalid strength {}", strength)));
        }

        let mut neighbors: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); geometry.point_count()];
        for prim in geometry.primitives() {
            let n = prim.vertices.len();
            for i in 0..n {
                let a = prim.vertices[i];
                let b = prim.vertices[(i + 1) % n];
                neighbors[a as usize].insert(b);
                neighbors[b as usize].insert(a);
            }
        }

        let mut result = geometry.clone();
        for _ in 0..iterations {
            let current = result.points().to_vec();
            for (i, p) in result.points_mut().iter_mut().enumerate() {
                let ring = &neighbors[i];
                if ring.is_empty() {
                    continue;
                }
                let average = ring.iter().map(|&j| current[j as usize]).sum::<Vec3>() / ring.len() as f32;
                *p += (average - *p) * strength;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn cube(center: Vec3, half: f32) -> Geometry {
        let corners = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        Geometry::from_parts(
            corners.iter().map(|c| center + *c * half).collect(),
            vec![
                Primitive::quad(0, 3, 2, 1),
                Primitive::quad(4, 5, 6, 7),
                Primitive::quad(0, 1, 5, 4),
                Primitive::quad(2, 3, 7, 6),
                Primitive::quad(1, 2, 6, 5),
                Primitive::quad(0, 4, 7, 3),
            ],
        )
    }

    #[test]
    fn test_closed_cube_is_manifold() {
        assert!(ReferenceKernel::validate_manifold(&cube(Vec3::ZERO, 1.0)).is_ok());
    }

    #[test]
    fn test_open_mesh_rejected() {
        let open = Geometry::from_parts(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Primitive::triangle(0, 1, 2)]);
        assert!(matches!(
            ReferenceKernel::validate_manifold(&open),
            Err(KernelError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_contains_point() {
        let mesh = cube(Vec3::ZERO, 1.0);
        assert!(ReferenceKernel::contains_point(&mesh, Vec3::new(0.1, 0.2, 0.3)));
        assert!(!ReferenceKernel::contains_point(&mesh, Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_disjoint_union_keeps_everything() {
        let a = cube(Vec3::ZERO, 1.0);
        let b = cube(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let result = ReferenceKernel.boolean(BooleanOperation::Union, &a, &b).unwrap();
        assert_eq!(result.primitive_count(), 12);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = cube(Vec3::ZERO, 1.0);
        let b = cube(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let result = ReferenceKernel.boolean(BooleanOperation::Intersection, &a, &b).unwrap();
        assert_eq!(result.primitive_count(), 0);
    }

    #[test]
    fn test_difference_of_nested_cubes() {
        let outer = cube(Vec3::ZERO, 2.0);
        let inner = cube(Vec3::ZERO, 1.0);
        let result = ReferenceKernel.boolean(BooleanOperation::Difference, &outer, &inner).unwrap();
        // Outer shell plus the inverted inner shell
        assert_eq!(result.primitive_count(), 12);
    }

    #[test]
    fn test_smooth_shrinks_cube() {
        let mesh = cube(Vec3::ZERO, 1.0);
        let smoothed = ReferenceKernel.smooth(&mesh, 3, 0.5).unwrap();
        let before = mesh.bounds().unwrap().size();
        let after = smoothed.bounds().unwrap().size();
        assert!(after.x < before.x);
        assert_eq!(smoothed.primitive_count(), mesh.primitive_count());
    }

    #[test]
    fn test_smooth_zero_iterations_is_identity() {
        let mesh = cube(Vec3::ZERO, 1.0);
        assert_eq!(ReferenceKernel.smooth(&mesh, 0, 0.5).unwrap(), mesh);
    }
}
