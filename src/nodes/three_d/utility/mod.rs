//! Structural utility nodes

pub mod merge;
pub mod null;

pub use merge::MergeNode;
pub use null::NullNode;
