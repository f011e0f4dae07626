//! Generation-checked slot allocator.
//!
//! [`SlotArena`] wraps a [`Slab`] with a per-slot generation table. Slots are
//! reused after removal, and each removal advances the slot's generation so
//! handles issued for the previous occupant stop resolving. A slot whose
//! generation is exhausted is retired: it stays occupied and is never reused.

use slab::Slab;

use crate::error::{CapacityExhausted, ToolError};
use crate::handle::ToolHandle;

#[derive(Debug)]
enum Entry<T> {
	Live(T),
	Retired,
}

/// Sparse storage with O(1) insert/remove and stable slot indices.
#[derive(Debug)]
pub(crate) struct SlotArena<T> {
	slots: Slab<Entry<T>>,
	/// Current generation for every index ever handed out by `slots`.
	generations: Vec<u32>,
	retired: usize,
}

impl<T> Default for SlotArena<T> {
	fn default() -> Self {
		Self::with_capacity(0)
	}
}

impl<T> SlotArena<T> {
	/// Creates an arena with room for `capacity` live values.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			slots: Slab::with_capacity(capacity),
			generations: Vec::with_capacity(capacity),
			retired: 0,
		}
	}

	/// Stores `value` and returns its handle.
	///
	/// Fails without storing anything once every `u32` slot index is in use.
	pub fn insert(&mut self, value: T) -> Result<ToolHandle, CapacityExhausted> {
		let index = self.slots.vacant_key();
		let slot = slot_index(index)?;
		if index == self.generations.len() {
			self.generations.push(0);
		}
		let generation = self.generations[index];
		let key = self.slots.insert(Entry::Live(value));
		debug_assert_eq!(key, index);
		Ok(ToolHandle::new(slot, generation))
	}

	/// Removes and returns the value behind `handle`.
	pub fn remove(&mut self, handle: ToolHandle) -> Result<T, ToolError> {
		let index = self.resolve(handle)?;
		let entry = match self.generations[index].checked_add(1) {
			Some(next) => {
				self.generations[index] = next;
				self.slots.remove(index)
			}
			None => {
				self.retired += 1;
				std::mem::replace(&mut self.slots[index], Entry::Retired)
			}
		};
		match entry {
			Entry::Live(value) => Ok(value),
			Entry::Retired => Err(ToolError::StaleHandle { handle }),
		}
	}

	/// Returns true when `handle` names a live value.
	pub fn contains(&self, handle: ToolHandle) -> bool {
		self.resolve(handle).is_ok()
	}

	pub fn get(&self, handle: ToolHandle) -> Result<&T, ToolError> {
		let index = self.resolve(handle)?;
		match &self.slots[index] {
			Entry::Live(value) => Ok(value),
			Entry::Retired => Err(ToolError::StaleHandle { handle }),
		}
	}

	pub fn get_mut(&mut self, handle: ToolHandle) -> Result<&mut T, ToolError> {
		let index = self.resolve(handle)?;
		match &mut self.slots[index] {
			Entry::Live(value) => Ok(value),
			Entry::Retired => Err(ToolError::StaleHandle { handle }),
		}
	}

	/// Number of live values.
	pub fn len(&self) -> usize {
		self.slots.len() - self.retired
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates live values in ascending slot order.
	#[cfg(test)]
	pub fn iter(&self) -> impl Iterator<Item = (ToolHandle, &T)> + '_ {
		// `insert` only hands out indices that fit in a u32.
		self.slots.iter().filter_map(|(index, entry)| match entry {
			Entry::Live(value) => Some((ToolHandle::new(index as u32, self.generations[index]), value)),
			Entry::Retired => None,
		})
	}

	/// Iterates live values in slot order without their handles.
	pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
		self.slots.iter().filter_map(|(_, entry)| match entry {
			Entry::Live(value) => Some(value),
			Entry::Retired => None,
		})
	}

	fn resolve(&self, handle: ToolHandle) -> Result<usize, ToolError> {
		let index = handle.index();
		let Some(&generation) = self.generations.get(index) else {
			return Err(ToolError::UnknownHandle { handle });
		};
		let live = matches!(self.slots.get(index), Some(Entry::Live(_)));
		if generation != handle.generation() || !live {
			return Err(ToolError::StaleHandle { handle });
		}
		Ok(index)
	}
}

/// Narrows a slab key to the handle's index width.
fn slot_index(index: usize) -> Result<u32, CapacityExhausted> {
	u32::try_from(index).map_err(|_| CapacityExhausted)
}
