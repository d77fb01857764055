//! Built-in SOP node implementations using the NodeFactory pattern

pub mod boolean;
pub mod geometry;
pub mod modify;
pub mod transform;
pub mod utility;

use crate::error::SopResult;
use crate::nodes::NodeRegistryBuilder;

/// Register every built-in node type, in catalog order
pub fn register_builtins(builder: &mut NodeRegistryBuilder) -> SopResult<()> {
    builder
        .register::<geometry::SphereNode>()?
        .register::<geometry::BoxNode>()?
        .register::<geometry::GridNode>()?
        .register::<transform::TransformNode>()?
        .register::<modify::SmoothNode>()?
        .register::<modify::ScatterNode>()?
        .register::<modify::WrangleNode>()?
        .register::<utility::NullNode>()?
        .register::<utility::MergeNode>()?
        .register::<boolean::BooleanNode>()?;
    Ok(())
}
