//! Value types carried by tool overlay records.

/// Axis-aligned bounding volumes.
pub mod geometry;

pub use geometry::Aabb;
