//! Wrangle node functional operations - per-point expression execution

use crate::constants::wrangle as names;
use crate::error::EvaluationError;
use crate::geometry::{AttributeData, Geometry};
use crate::kernels::{ExpressionEvaluator, VariableMap};
use crate::nodes::{ParameterSet, ParameterValue};
use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};

const VECTOR_SUFFIXES: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrangleLogic {
    pub expression: String,
    /// Numeric node parameters, visible by name and as `ch_<name>`
    pub channels: BTreeMap<String, f64>,
}

impl WrangleLogic {
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, EvaluationError> {
        let channels = params
            .iter()
            .filter_map(|(descriptor, value)| match value {
                ParameterValue::Float(v) => Some((descriptor.name.to_string(), *v)),
                ParameterValue::Int(v) => Some((descriptor.name.to_string(), *v as f64)),
                _ => None,
            })
            .collect();
        Ok(Self {
            expression: params.text("expression")?,
            channels,
        })
    }

    /// Variables every point starts with besides its own attributes
    fn base_variables(&self, point_count: usize) -> VariableMap {
        let mut vars = VariableMap::new();
        for (name, value) in &self.channels {
            vars.insert(name.clone(), *value);
            vars.insert(format!("{}{}", names::CHANNEL_PREFIX, name), *value);
        }
        vars.insert(names::POINT_COUNT.to_string(), point_count as f64);
        vars
    }

    /// Run the expression for every point of `input`.
    ///
    /// Positions are bound as `Px`/`Py`/`Pz`, float attributes by name and
    /// vector attributes per component (`Nx`, `Ny`, `Nz`). Assigned values
    /// are written back; names assigned that were not bound become new float
    /// attributes, zero on points that never assign them.
    pub fn apply(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        input: &Geometry,
    ) -> Result<Geometry, EvaluationError> {
        let mut output = input.clone();
        if self.expression.trim().is_empty() {
            return Ok(output);
        }

        let count = input.point_count();
        let base = self.base_variables(count);
        let attributes: Vec<(String, AttributeData)> = input
            .point_attributes()
            .map(|(name, data)| (name.to_string(), data.clone()))
            .collect();

        let mut reserved: BTreeSet<String> = base.keys().cloned().collect();
        reserved.insert(names::POINT_NUMBER.to_string());
        for (name, data) in &attributes {
            match data {
                AttributeData::Float(_) => {
                    reserved.insert(name.clone());
                }
                AttributeData::Vector(_) => {
                    // The bare name is reserved too so it never shadows the vector
                    reserved.insert(name.clone());
                    for suffix in VECTOR_SUFFIXES {
                        reserved.insert(format!("{}{}", name, suffix));
                    }
                }
            }
        }
        for position in [names::POSITION_X, names::POSITION_Y, names::POSITION_Z] {
            reserved.insert(position.to_string());
        }

        let mut written: Vec<(String, AttributeData)> = attributes.clone();
        let mut created: BTreeMap<String, Vec<f32>> = BTreeMap::new();

        for i in 0..count {
            let mut vars = base.clone();
            let p = input.points()[i];
            vars.insert(names::POINT_NUMBER.to_string(), i as f64);
            vars.insert(names::POSITION_X.to_string(), p.x as f64);
            vars.insert(names::POSITION_Y.to_string(), p.y as f64);
            vars.insert(names::POSITION_Z.to_string(), p.z as f64);
            for (name, data) in &attributes {
                match data {
                    AttributeData::Float(values) => {
                        vars.insert(name.clone(), values[i] as f64);
                    }
                    AttributeData::Vector(values) => {
                        for (axis, suffix) in VECTOR_SUFFIXES.iter().enumerate() {
                            vars.insert(format!("{}{}", name, suffix), values[i][axis] as f64);
                        }
                    }
                }
            }

            evaluator
                .execute(&self.expression, &mut vars)
                .map_err(|failure| failure.into_evaluation_error(&self.expression))?;

            let read = |key: &str| vars.get(key).copied().unwrap_or_default() as f32;
            output.points_mut()[i] = Vec3::new(
                read(names::POSITION_X),
                read(names::POSITION_Y),
                read(names::POSITION_Z),
            );
            for (name, data) in written.iter_mut() {
                match data {
                    AttributeData::Float(values) => values[i] = read(name.as_str()),
                    AttributeData::Vector(values) => {
                        values[i] = Vec3::new(
                            read(&format!("{}x", name)),
                            read(&format!("{}y", name)),
                            read(&format!("{}z", name)),
                        );
                    }
                }
            }
            for (name, value) in &vars {
                if !reserved.contains(name) {
                    created.entry(name.clone()).or_insert_with(|| vec![0.0; count])[i] = *value as f32;
                }
            }
        }

        for (name, data) in written.into_iter().chain(
            created
                .into_iter()
                .map(|(name, values)| (name, AttributeData::Float(values))),
        ) {
            output
                .set_point_attribute(&name, data)
                .map_err(EvaluationError::OperationFailed)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, NORMAL_ATTRIBUTE};
    use crate::kernels::BasicEvaluator;

    fn triangle() -> Geometry {
        Geometry::from_parts(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Primitive::triangle(0, 1, 2)],
        )
    }

    fn logic(expression: &str) -> WrangleLogic {
        WrangleLogic {
            expression: expression.to_string(),
            channels: [("value1".to_string(), 2.0)].into_iter().collect(),
        }
    }

    #[test]
    fn test_offsets_positions() {
        let out = logic("Py = Py + 0.5").apply(&BasicEvaluator::new(), &triangle()).unwrap();
        assert_eq!(out.points()[0], Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(out.points()[2], Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(out.primitives(), triangle().primitives());
    }

    #[test]
    fn test_point_number_and_channels() {
        let out = logic("Pz = ptnum * ch_value1 + value1 / numpt")
            .apply(&BasicEvaluator::new(), &triangle())
            .unwrap();
        let z: Vec<f32> = out.points().iter().map(|p| p.z).collect();
        let third = 2.0f32 / 3.0;
        assert!((z[0] - third).abs() < 1e-6);
        assert!((z[2] - (4.0 + third)).abs() < 1e-6);
    }

    #[test]
    fn test_new_names_become_attributes() {
        let out = logic("mass = ptnum + 1").apply(&BasicEvaluator::new(), &triangle()).unwrap();
        assert_eq!(
            out.point_attribute("mass"),
            Some(&AttributeData::Float(vec![1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn test_vector_attribute_components() {
        let mut geo = triangle();
        geo.set_point_attribute(NORMAL_ATTRIBUTE, AttributeData::Vector(vec![Vec3::Z; 3]))
            .unwrap();
        let out = logic("Nz = -Nz").apply(&BasicEvaluator::new(), &geo).unwrap();
        assert_eq!(
            out.point_attribute(NORMAL_ATTRIBUTE),
            Some(&AttributeData::Vector(vec![-Vec3::Z; 3]))
        );
    }

    #[test]
    fn test_bare_vector_name_does_not_create_float_attribute() {
        let mut geo = triangle();
        geo.set_point_attribute(NORMAL_ATTRIBUTE, AttributeData::Vector(vec![Vec3::Z; 3]))
            .unwrap();
        let out = logic("N = 1").apply(&BasicEvaluator::new(), &geo).unwrap();
        assert_eq!(
            out.point_attribute(NORMAL_ATTRIBUTE),
            Some(&AttributeData::Vector(vec![Vec3::Z; 3]))
        );

        let mut merged = geo.clone();
        merged.append(&out).unwrap();
        assert_eq!(merged.point_count(), 6);
    }

    #[test]
    fn test_empty_expression_passes_through() {
        let out = logic("  ").apply(&BasicEvaluator::new(), &triangle()).unwrap();
        assert_eq!(out, triangle());
    }

    #[test]
    fn test_syntax_error_is_expression_error() {
        let err = logic("this is not valid")
            .apply(&BasicEvaluator::new(), &triangle())
            .unwrap_err();
        match err {
            EvaluationError::Expression { expression, .. } => assert_eq!(expression, "this is not valid"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
