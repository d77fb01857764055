//! Default parameter values for nodes
//!
//! This module centralizes default values and ranges for the parameters
//! of the built-in node types so related nodes stay consistent.

use super::parameters::ParameterRange;

/// Default parameter ranges and values for geometry generators
pub struct GeometryDefaults;

impl GeometryDefaults {
    // Size parameters
    pub const SIZE_RANGE: ParameterRange = ParameterRange::new(0.01, 100.0);
    pub const RADIUS_DEFAULT: f64 = 1.0;
    pub const BOX_SIZE_DEFAULT: f64 = 2.0;
    pub const GRID_SIZE_DEFAULT: f64 = 10.0;
    pub const GRID_SIZE_RANGE: ParameterRange = ParameterRange::new(0.01, 1000.0);

    // Subdivision parameters
    pub const SPHERE_SEGMENTS_DEFAULT: i64 = 32;
    pub const SPHERE_SEGMENTS_RANGE: ParameterRange = ParameterRange::new(3.0, 256.0);
    pub const SPHERE_RINGS_DEFAULT: i64 = 16;
    pub const SPHERE_RINGS_RANGE: ParameterRange = ParameterRange::new(3.0, 128.0);
    pub const BOX_SEGMENTS_DEFAULT: i64 = 1;
    pub const BOX_SEGMENTS_RANGE: ParameterRange = ParameterRange::new(1.0, 100.0);
    pub const GRID_RESOLUTION_DEFAULT: i64 = 10;
    pub const GRID_RESOLUTION_RANGE: ParameterRange = ParameterRange::new(1.0, 1000.0);

    /// Options shared by every generator's `primitive_type` parameter
    pub const PRIMITIVE_TYPES: [&'static str; 2] = ["Polygon", "Points"];
}

/// Default parameter ranges and values for transforms
pub struct TransformDefaults;

impl TransformDefaults {
    pub const TRANSLATE_RANGE: ParameterRange = ParameterRange::new(-100.0, 100.0);
    pub const ROTATE_RANGE: ParameterRange = ParameterRange::new(-360.0, 360.0);
    pub const SCALE_RANGE: ParameterRange = ParameterRange::new(0.01, 10.0);
    pub const UNIFORM_SCALE_RANGE: ParameterRange = ParameterRange::new(0.01, 100.0);
}

/// Default parameter ranges and values for surface modifiers
pub struct ModifierDefaults;

impl ModifierDefaults {
    pub const SMOOTH_ITERATIONS_DEFAULT: i64 = 5;
    pub const SMOOTH_ITERATIONS_RANGE: ParameterRange = ParameterRange::new(1.0, 100.0);
    pub const SMOOTH_STRENGTH_DEFAULT: f64 = 0.5;
    pub const SMOOTH_STRENGTH_RANGE: ParameterRange = ParameterRange::new(0.0, 1.0);

    pub const SCATTER_COUNT_DEFAULT: i64 = 100;
    pub const SCATTER_COUNT_RANGE: ParameterRange = ParameterRange::new(0.0, 1_000_000.0);
    pub const SCATTER_SEED_DEFAULT: i64 = 42;
    pub const SCATTER_SEED_RANGE: ParameterRange = ParameterRange::new(0.0, 2_147_483_647.0);

    pub const WRANGLE_CHANNEL_RANGE: ParameterRange = ParameterRange::new(-1.0e6, 1.0e6);
}
