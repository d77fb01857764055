//! Smooth node parameters

use crate::nodes::defaults::ModifierDefaults;
use crate::nodes::ParameterDescriptor;

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor {
            range: Some(ModifierDefaults::SMOOTH_ITERATIONS_RANGE),
            category: "Smoothing",
            description: "Number of relaxation passes",
            ..ParameterDescriptor::int("iterations", "Iterations", ModifierDefaults::SMOOTH_ITERATIONS_DEFAULT)
        },
        ParameterDescriptor {
            range: Some(ModifierDefaults::SMOOTH_STRENGTH_RANGE),
            category: "Smoothing",
            description: "Fraction of the distance to the neighbour average moved per pass",
            ..ParameterDescriptor::float("strength", "Strength", ModifierDefaults::SMOOTH_STRENGTH_DEFAULT)
        },
    ]
}
