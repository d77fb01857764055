//! Boolean node parameters

use crate::kernels::BooleanOperation;
use crate::nodes::ParameterDescriptor;

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![ParameterDescriptor {
        category: "Boolean",
        description: "How the two closed meshes are combined",
        ..ParameterDescriptor::choice("operation", "Operation", 0, &BooleanOperation::LABELS)
    }]
}
