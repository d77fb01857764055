//! Application-wide constants and default values

/// Cook engine defaults
pub mod engine {
    /// Cook independent input branches on parallel threads
    pub const DEFAULT_PARALLEL_BRANCHES: bool = true;

    /// Threads spawned at most for the inputs of one node
    pub const DEFAULT_MAX_BRANCH_THREADS: usize = 4;
}

/// Graph structure limits
pub mod graph {
    /// Slot cap for inputs declared without an upper bound
    pub const MAX_INPUT_SLOTS: usize = 1024;
}

/// Environment variables read by [`EngineConfig::load`](crate::config::EngineConfig::load)
pub mod env {
    pub const PARALLEL_BRANCHES: &str = "SOPGRAPH_PARALLEL_BRANCHES";
    pub const MAX_BRANCH_THREADS: &str = "SOPGRAPH_MAX_BRANCH_THREADS";
    pub const TRACK_STATISTICS: &str = "SOPGRAPH_TRACK_STATISTICS";
}

/// Saved graph file format
pub mod persistence {
    /// Format version written into every save file
    pub const FORMAT_VERSION: &str = "1.0";

    /// Creator tag written into save metadata
    pub const CREATOR: &str = concat!("sopgraph ", env!("CARGO_PKG_VERSION"));
}

/// Wrangle variable names
pub mod wrangle {
    pub const POSITION_X: &str = "Px";
    pub const POSITION_Y: &str = "Py";
    pub const POSITION_Z: &str = "Pz";
    pub const POINT_NUMBER: &str = "ptnum";
    pub const POINT_COUNT: &str = "numpt";
    /// Prefix under which node parameters are also visible
    pub const CHANNEL_PREFIX: &str = "ch_";
}
