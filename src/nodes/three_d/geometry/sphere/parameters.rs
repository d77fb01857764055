//! Sphere node parameters

use crate::nodes::defaults::GeometryDefaults;
use crate::nodes::three_d::geometry::primitive_type_parameter;
use crate::nodes::ParameterDescriptor;

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        primitive_type_parameter(),
        ParameterDescriptor {
            range: Some(GeometryDefaults::SIZE_RANGE),
            category: "Size",
            description: "Radius of the sphere",
            ..ParameterDescriptor::float("radius", "Radius", GeometryDefaults::RADIUS_DEFAULT)
        },
        ParameterDescriptor {
            range: Some(GeometryDefaults::SPHERE_SEGMENTS_RANGE),
            category: "Resolution",
            description: "Number of divisions around the equator",
            ..ParameterDescriptor::int("segments", "Segments", GeometryDefaults::SPHERE_SEGMENTS_DEFAULT)
        },
        ParameterDescriptor {
            range: Some(GeometryDefaults::SPHERE_RINGS_RANGE),
            category: "Resolution",
            description: "Number of divisions from pole to pole",
            ..ParameterDescriptor::int("rings", "Rings", GeometryDefaults::SPHERE_RINGS_DEFAULT)
        },
    ]
}
