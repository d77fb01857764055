//! Surface and point modifier nodes

pub mod scatter;
pub mod smooth;
pub mod wrangle;

pub use scatter::ScatterNode;
pub use smooth::SmoothNode;
pub use wrangle::WrangleNode;
