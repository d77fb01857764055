//! Wrangle node parameters

use crate::nodes::defaults::ModifierDefaults;
use crate::nodes::ParameterDescriptor;

fn channel(name: &'static str, label: &'static str) -> ParameterDescriptor {
    ParameterDescriptor {
        range: Some(ModifierDefaults::WRANGLE_CHANNEL_RANGE),
        category: "Channels",
        description: "Value readable from the expression by name or with the ch_ prefix",
        ..ParameterDescriptor::float(name, label, 0.0)
    }
}

pub fn descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor {
            category: "Wrangle",
            description: "Statements run once per point, e.g. `Py = Py + 0.5 * ch_value1`",
            ..ParameterDescriptor::text("expression", "Expression", "")
        },
        channel("value1", "Value 1"),
        channel("value2", "Value 2"),
        channel("value3", "Value 3"),
    ]
}
