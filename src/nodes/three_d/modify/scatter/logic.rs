//! Scatter node functional operations - area weighted point sampling

use crate::error::EvaluationError;
use crate::geometry::{AttributeData, Geometry, NORMAL_ATTRIBUTE};
use crate::nodes::ParameterSet;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterLogic {
    pub point_count: usize,
    pub seed: u64,
}

impl ScatterLogic {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        let point_count = usize::try_from(params.int("point_count")?)
            .map_err(|_| EvaluationError::OperationFailed("point_count must be non-negative".into()))?;
        let seed = u64::try_from(params.int("seed")?)
            .map_err(|_| EvaluationError::OperationFailed("seed must be non-negative".into()))?;
        Ok(Self { point_count, seed })
    }

    /// Sample points uniformly by area over the input's triangles.
    ///
    /// The output carries no primitives; each point gets the normal of the
    /// triangle it was sampled from.
    pub fn apply(&self, input: &Geometry) -> Result<Geometry, EvaluationError> {
        input
            .validate_topology()
            .map_err(EvaluationError::InvalidGeometry)?;

        let points = input.points();
        let triangles: Vec<[Vec3; 3]> = input
            .triangles()
            .iter()
            .map(|t| [points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]])
            .collect();

        // Running area totals for binary search
        let mut cumulative = Vec::with_capacity(triangles.len());
        let mut total = 0.0f32;
        for [a, b, c] in &triangles {
            total += (*b - *a).cross(*c - *a).length() * 0.5;
            cumulative.push(total);
        }
        if total <= f32::EPSILON {
            return Err(EvaluationError::InvalidGeometry(
                "scatter input has no surface area".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut output = Geometry::new();
        let mut normals = Vec::with_capacity(self.point_count);
        for _ in 0..self.point_count {
            let pick = rng.random::<f32>() * total;
            let index = cumulative
                .partition_point(|&area| area < pick)
                .min(triangles.len() - 1);
            let [a, b, c] = triangles[index];

            // Square-root warp keeps the sample uniform over the triangle
            let r1 = rng.random::<f32>().sqrt();
            let r2 = rng.random::<f32>();
            let p = a * (1.0 - r1) + b * (r1 * (1.0 - r2)) + c * (r1 * r2);
            output.add_point(p);
            normals.push((b - a).cross(c - a).normalize_or_zero());
        }

        output
            .set_point_attribute(NORMAL_ATTRIBUTE, AttributeData::Vector(normals))
            .map_err(EvaluationError::OperationFailed)?;
        Ok(output)
    }
}
