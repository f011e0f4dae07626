//! Derived material view.

use std::ops::Deref;
use std::sync::Arc;

use crate::config::ViewFilter;
use crate::record::{MaterialRef, ToolRecord};

/// Immutable projection of the store into render materials.
///
/// One entry per live record that carries a material, in store order.
/// Each recompute publishes a new view with a higher [`revision`](Self::revision);
/// views handed out earlier keep their materials alive.
#[derive(Debug, Default)]
pub struct MaterialView {
	revision: u64,
	materials: Vec<MaterialRef>,
}

impl MaterialView {
	/// Builds the view for `records`, taken in store order.
	pub(crate) fn project<'a>(
		revision: u64,
		records: impl IntoIterator<Item = &'a ToolRecord>,
		filter: ViewFilter,
		dedupe: bool,
	) -> Self {
		let mut materials: Vec<MaterialRef> = Vec::new();
		for record in records {
			if filter == ViewFilter::EnabledOnly && !record.enabled {
				continue;
			}
			let Some(material) = &record.material else {
				continue;
			};
			if dedupe && materials.iter().any(|seen| Arc::ptr_eq(seen, material)) {
				continue;
			}
			materials.push(Arc::clone(material));
		}
		Self { revision, materials }
	}

	/// Number of recomputes that produced this view. The initial view is 0.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn materials(&self) -> &[MaterialRef] {
		&self.materials
	}
}

impl Deref for MaterialView {
	type Target = [MaterialRef];

	fn deref(&self) -> &Self::Target {
		&self.materials
	}
}
