//! Transform node functional operations - affine transform logic

use crate::error::EvaluationError;
use crate::geometry::Geometry;
use crate::nodes::ParameterSet;
use glam::{Mat4, Vec3};

/// Core transform data and functionality
#[derive(Debug, Clone, PartialEq)]
pub struct TransformLogic {
    pub translate: Vec3,
    /// Euler angles in degrees, applied X then Y then Z
    pub rotate: Vec3,
    pub scale: Vec3,
    pub uniform_scale: f32,
}

impl Default for TransformLogic {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
            uniform_scale: 1.0,
        }
    }
}

impl TransformLogic {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        let vec3 = |prefix: &str| -> Result<Vec3, EvaluationError> {
            Ok(Vec3::new(
                params.float(&format!("{}_x", prefix))? as f32,
                params.float(&format!("{}_y", prefix))? as f32,
                params.float(&format!("{}_z", prefix))? as f32,
            ))
        };
        Ok(Self {
            translate: vec3("translate")?,
            rotate: vec3("rotate")?,
            scale: vec3("scale")?,
            uniform_scale: params.float("uniform_scale")? as f32,
        })
    }

    /// Scale, then rotate, then translate
    pub fn matrix(&self) -> Mat4 {
        let radians = self.rotate * (std::f32::consts::PI / 180.0);
        Mat4::from_translation(self.translate)
            * Mat4::from_rotation_z(radians.z)
            * Mat4::from_rotation_y(radians.y)
            * Mat4::from_rotation_x(radians.x)
            * Mat4::from_scale(self.scale * self.uniform_scale)
    }

    pub fn apply(&self, input: &Geometry) -> Geometry {
        let mut output = input.clone();
        output.transform(self.matrix());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_scale_applies_before_translate() {
        let logic = TransformLogic {
            translate: Vec3::new(0.0, 0.0, 2.0),
            scale: Vec3::splat(3.0),
            ..Default::default()
        };
        let p = logic.matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(3.0, 0.0, 2.0)));
    }

    #[test]
    fn test_rotation_is_in_degrees() {
        let logic = TransformLogic {
            rotate: Vec3::new(0.0, 0.0, 90.0),
            ..Default::default()
        };
        assert!(approx(logic.matrix().transform_point3(Vec3::X), Vec3::Y));
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let input = Geometry::from_parts(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Primitive::triangle(0, 1, 2)]);
        let logic = TransformLogic {
            translate: Vec3::ONE,
            ..Default::default()
        };
        let output = logic.apply(&input);
        assert_eq!(input.points()[0], Vec3::ZERO);
        assert_eq!(output.points()[0], Vec3::ONE);
    }
}
