//! Opaque tool identifiers.

use std::fmt;

/// Stable key for one tool record.
///
/// Combines a slot index with the slot's generation at insertion time. Once
/// the record is removed the generation moves on, so the handle is rejected
/// even if a later insertion reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolHandle {
	index: u32,
	generation: u32,
}

impl ToolHandle {
	pub(crate) const fn new(index: u32, generation: u32) -> Self {
		Self { index, generation }
	}

	/// Slot index inside the arena.
	pub(crate) const fn index(self) -> usize {
		self.index as usize
	}

	/// Generation tag the slot carried when this handle was issued.
	pub(crate) const fn generation(self) -> u32 {
		self.generation
	}
}

impl fmt::Display for ToolHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "tool#{}v{}", self.index, self.generation)
	}
}
