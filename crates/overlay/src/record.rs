//! Tool overlay records and the material seam.

use std::fmt;
use std::sync::Arc;

use voxtool_primitives::Aabb;

/// Render material supplied by the host.
///
/// The registry only holds shared references; construction and lifetime of
/// the pointee belong to the caller.
pub trait MaterialInterface: Send + Sync + fmt::Debug {}

/// Shared, read-only reference to a host material.
pub type MaterialRef = Arc<dyn MaterialInterface>;

/// One tool overlay entry.
#[derive(Debug, Clone, Default)]
pub struct ToolRecord {
	/// Whether the overlay is active. Not used to filter the material view
	/// unless [`crate::ViewFilter::EnabledOnly`] is configured.
	pub enabled: bool,
	/// World-space extent, carried for consumers.
	pub bounds: Aabb,
	pub material: Option<MaterialRef>,
}

impl ToolRecord {
	/// Creates a record with default bounds and no material.
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled,
			..Self::default()
		}
	}

	pub fn with_bounds(mut self, bounds: Aabb) -> Self {
		self.bounds = bounds;
		self
	}

	pub fn with_material(mut self, material: MaterialRef) -> Self {
		self.material = Some(material);
		self
	}
}
