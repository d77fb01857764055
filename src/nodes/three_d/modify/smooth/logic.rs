//! Smooth node functional operations

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::kernels::GeometryKernel;
use crate::nodes::ParameterSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothLogic {
    pub iterations: u32,
    pub strength: f32,
}

impl SmoothLogic {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        let iterations = u32::try_from(params.int("iterations")?).map_err(|_| {
            EvaluationError::OperationFailed("iterations must be non-negative".into())
        })?;
        Ok(Self {
            iterations,
            strength: params.float("strength")? as f32,
        })
    }

    /// Relaxation itself is delegated to the geometry kernel
    pub fn apply(&self, kernel: &dyn GeometryKernel, input: &Geometry) -> Result<Geometry, EvaluationError> {
        Ok(kernel.smooth(input, self.iterations, self.strength)?)
    }
}
