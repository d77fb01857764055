//! Scatter node parameters

use crate::nodes::defaults::ModifierDefaults;
use crate::nodes::ParameterDescriptor;

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor {
            range: Some(ModifierDefaults::SCATTER_COUNT_RANGE),
            category: "Scatter",
            description: "Number of points to distribute over the surface",
            ..ParameterDescriptor::int("point_count", "Point Count", ModifierDefaults::SCATTER_COUNT_DEFAULT)
        },
        ParameterDescriptor {
            range: Some(ModifierDefaults::SCATTER_SEED_RANGE),
            category: "Scatter",
            description: "Random seed; equal seeds give equal distributions",
            ..ParameterDescriptor::int("seed", "Seed", ModifierDefaults::SCATTER_SEED_DEFAULT)
        },
    ]
}
