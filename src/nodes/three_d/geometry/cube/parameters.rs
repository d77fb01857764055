//! Box node parameters

use crate::nodes::defaults::GeometryDefaults;
use crate::nodes::three_d::geometry::primitive_type_parameter;
use crate::nodes::ParameterDescriptor;

fn size(name: &'static str, label: &'static str, description: &'static str) -> ParameterDescriptor {
    ParameterDescriptor {
        range: Some(GeometryDefaults::SIZE_RANGE),
        category: "Size",
        description,
        ..ParameterDescriptor::float(name, label, GeometryDefaults::BOX_SIZE_DEFAULT)
    }
}

fn segments(name: &'static str, label: &'static str, description: &'static str) -> ParameterDescriptor {
    ParameterDescriptor {
        range: Some(GeometryDefaults::BOX_SEGMENTS_RANGE),
        category: "Subdivisions",
        description,
        ..ParameterDescriptor::int(name, label, GeometryDefaults::BOX_SEGMENTS_DEFAULT)
    }
}

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        primitive_type_parameter(),
        size("width", "Width", "Width of the box along X axis"),
        size("height", "Height", "Height of the box along Y axis"),
        size("depth", "Depth", "Depth of the box along Z axis"),
        segments("width_segments", "Width Segments", "Number of subdivisions along width (X)"),
        segments("height_segments", "Height Segments", "Number of subdivisions along height (Y)"),
        segments("depth_segments", "Depth Segments", "Number of subdivisions along depth (Z)"),
    ]
}
