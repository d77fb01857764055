//! Transform node parameters

use crate::nodes::defaults::TransformDefaults;
use crate::nodes::{ParameterDescriptor, ParameterRange};

fn component(
    name: &'static str,
    label: &'static str,
    default: f64,
    range: ParameterRange,
    description: &'static str,
) -> ParameterDescriptor {
    ParameterDescriptor {
        range: Some(range),
        category: "Transform",
        description,
        ..ParameterDescriptor::float(name, label, default)
    }
}

pub fn descriptors() -> Vec<ParameterDescriptor> {
    let t = TransformDefaults::TRANSLATE_RANGE;
    let r = TransformDefaults::ROTATE_RANGE;
    let s = TransformDefaults::SCALE_RANGE;
    vec![
        component("translate_x", "Translate X", 0.0, t, "Translation along X"),
        component("translate_y", "Translate Y", 0.0, t, "Translation along Y"),
        component("translate_z", "Translate Z", 0.0, t, "Translation along Z"),
        component("rotate_x", "Rotate X", 0.0, r, "Rotation around X in degrees"),
        component("rotate_y", "Rotate Y", 0.0, r, "Rotation around Y in degrees"),
        component("rotate_z", "Rotate Z", 0.0, r, "Rotation around Z in degrees"),
        component("scale_x", "Scale X", 1.0, s, "Scale factor along X"),
        component("scale_y", "Scale Y", 1.0, s, "Scale factor along Y"),
        component("scale_z", "Scale Z", 1.0, s, "Scale factor along Z"),
        component(
            "uniform_scale",
            "Uniform Scale",
            1.0,
            TransformDefaults::UNIFORM_SCALE_RANGE,
            "Scale factor applied on all axes",
        ),
    ]
}
