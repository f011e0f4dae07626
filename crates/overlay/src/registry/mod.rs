//! Tool overlay registry with a derived material view.
//!
//! # Purpose
//!
//! Track a small, frequently edited set of tool overlays that worker threads
//! create, edit and remove, and keep an ordered list of their render materials
//! ready for the thread that draws each frame.
//!
//! # Mental model
//!
//! * The store is a generation-checked slot arena of [`ToolRecord`]s behind
//!   one mutex. Every query and mutation takes that mutex.
//! * The material view is a projection of the store, rebuilt from scratch
//!   inside the same critical section as the mutation that changed it, then
//!   published through an [`ArcSwap`].
//! * The consumer reads the published view without locking. Only one thread
//!   may do so (see [`ToolOverlayRegistry::materials`]).
//!
//! # Invariants
//!
//! * A handle names at most one record over the registry's lifetime. Removed
//!   slots may be reused, but their old handles stay rejected.
//! * After `remove`, `edit` or `create_with` returns, the published view equals
//!   the projection of the live records in slot order.
//! * `create` leaves the view untouched: a record without a material cannot
//!   change the projection. Any creation path that can attach a material must
//!   recompute, as `create_with` does.
//! * Operations on invalid handles change nothing and are reported through
//!   `tracing` plus [`ToolOverlayRegistry::stale_handle_count`].
//!
//! # Concurrency & ordering
//!
//! * Mutators are serialized by a [`parking_lot::Mutex`]. Callbacks passed to
//!   `edit` and `for_each` run while it is held; they must be short and must
//!   not call back into the registry (the mutex is not reentrant).
//! * Publication happens before the mutex is released, so a view loaded after
//!   a mutation returns reflects that mutation.
//! * Views already handed out are immutable and keep their materials alive.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::affinity::ConsumerAffinity;
use crate::arena::SlotArena;
use crate::config::RegistryConfig;
use crate::error::{CapacityExhausted, ToolError};
use crate::handle::ToolHandle;
use crate::record::ToolRecord;
use crate::view::MaterialView;

/// State guarded by the registry mutex.
#[derive(Debug)]
struct RegistryState {
	tools: SlotArena<ToolRecord>,
	/// Revision of the most recently published view.
	revision: u64,
}

/// Thread-safe, identity-stable registry of tool overlays.
///
/// Owned explicitly by whichever subsystem needs tool tracking; share it
/// through an [`Arc`] when several threads mutate it.
#[derive(Debug)]
pub struct ToolOverlayRegistry {
	config: RegistryConfig,
	state: Mutex<RegistryState>,
	view: ArcSwap<MaterialView>,
	consumer: ConsumerAffinity,
	stale_handles: AtomicU64,
}

impl Default for ToolOverlayRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ToolOverlayRegistry {
	/// Creates an empty registry with the default configuration.
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		debug!(?config, "creating tool overlay registry");
		Self {
			state: Mutex::new(RegistryState {
				tools: SlotArena::with_capacity(config.capacity),
				revision: 0,
			}),
			view: ArcSwap::from_pointee(MaterialView::default()),
			consumer: ConsumerAffinity::new(config.affinity),
			stale_handles: AtomicU64::new(0),
			config,
		}
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	/// Adds a record with default bounds and no material.
	///
	/// Does not recompute the material view; see the module invariants.
	///
	/// # Panics
	///
	/// When every slot index is in use (see [`try_create_with`](Self::try_create_with)).
	pub fn create(&self, enabled: bool) -> ToolHandle {
		self.state
			.lock()
			.tools
			.insert(ToolRecord::new(enabled))
			.unwrap_or_else(|error| panic!("{error}"))
	}

	/// Adds a fully populated record, recomputing the view if it has a material.
	///
	/// # Panics
	///
	/// When every slot index is in use (see [`try_create_with`](Self::try_create_with)).
	pub fn create_with(&self, record: ToolRecord) -> ToolHandle {
		self.try_create_with(record)
			.unwrap_or_else(|error| panic!("{error}"))
	}

	/// Adds a fully populated record, or fails once the slot space is exhausted.
	pub fn try_create_with(&self, record: ToolRecord) -> Result<ToolHandle, CapacityExhausted> {
		let mut state = self.state.lock();
		let has_material = record.material.is_some();
		let handle = state.tools.insert(record)?;
		let retired = has_material.then(|| self.recompute(&mut state));
		drop(state);
		drop(retired);
		Ok(handle)
	}

	/// Removes a record and returns it.
	pub fn try_remove(&self, handle: ToolHandle) -> Result<ToolRecord, ToolError> {
		let mut state = self.state.lock();
		let record = state.tools.remove(handle)?;
		let retired = self.recompute(&mut state);
		drop(state);
		drop(retired);
		Ok(record)
	}

	/// Removes a record. Invalid handles are reported and ignored.
	pub fn remove(&self, handle: ToolHandle) {
		if let Err(error) = self.try_remove(handle) {
			self.report(error, "remove");
		}
	}

	/// Runs `mutate` on a record under the lock, then recomputes the view.
	///
	/// `mutate` must not call back into this registry. If it panics, the view
	/// is still recomputed from whatever it left behind and the panic resumes.
	pub fn try_edit<R>(
		&self,
		handle: ToolHandle,
		mutate: impl FnOnce(&mut ToolRecord) -> R,
	) -> Result<R, ToolError> {
		let mut state = self.state.lock();
		let record = state.tools.get_mut(handle)?;
		// A panicking mutator may already have changed the record, so the
		// view is republished before the panic continues.
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| mutate(record)));
		let retired = self.recompute(&mut state);
		drop(state);
		drop(retired);
		match outcome {
			Ok(out) => Ok(out),
			Err(payload) => panic::resume_unwind(payload),
		}
	}

	/// Edits a record in place. Invalid handles are reported and ignored.
	pub fn edit(&self, handle: ToolHandle, mutate: impl FnOnce(&mut ToolRecord)) {
		if let Err(error) = self.try_edit(handle, mutate) {
			self.report(error, "edit");
		}
	}

	pub fn is_valid(&self, handle: ToolHandle) -> bool {
		self.state.lock().tools.contains(handle)
	}

	/// Returns a copy of one record.
	pub fn get(&self, handle: ToolHandle) -> Option<ToolRecord> {
		self.state.lock().tools.get(handle).ok().cloned()
	}

	/// Visits every live record in slot order while holding the lock.
	///
	/// `visit` must not block or call back into this registry.
	pub fn for_each(&self, mut visit: impl FnMut(&ToolRecord)) {
		let state = self.state.lock();
		for record in state.tools.values() {
			visit(record);
		}
	}

	/// Number of live records.
	pub fn len(&self) -> usize {
		self.state.lock().tools.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().tools.is_empty()
	}

	/// Returns the latest material view without locking.
	///
	/// Must only be called from the consumer thread: the one bound through
	/// [`bind_consumer_thread`](Self::bind_consumer_thread), or else the first
	/// thread to call this method.
	///
	/// # Panics
	///
	/// When called from another thread while [`crate::AffinityCheck`]
	/// enforcement is active for this build.
	pub fn materials(&self) -> Arc<MaterialView> {
		self.consumer.check();
		self.view.load_full()
	}

	/// Makes the calling thread the only legal reader of [`materials`](Self::materials).
	///
	/// Returns false if a different thread already holds the role.
	pub fn bind_consumer_thread(&self) -> bool {
		self.consumer.bind_current_thread()
	}

	/// Thread currently bound as consumer, if any.
	pub fn consumer_thread(&self) -> Option<std::thread::ThreadId> {
		self.consumer.owner()
	}

	/// Number of operations ignored because of an invalid handle.
	pub fn stale_handle_count(&self) -> u64 {
		self.stale_handles.load(Ordering::Relaxed)
	}

	/// Rebuilds and publishes the view. Returns the retired view so the caller
	/// can release it after unlocking.
	fn recompute(&self, state: &mut RegistryState) -> Arc<MaterialView> {
		state.revision += 1;
		let view = MaterialView::project(
			state.revision,
			state.tools.values(),
			self.config.view_filter,
			self.config.dedupe_materials,
		);
		trace!(
			revision = state.revision,
			materials = view.len(),
			records = state.tools.len(),
			"recomputed tool material view"
		);
		self.view.swap(Arc::new(view))
	}

	fn report(&self, error: ToolError, op: &'static str) {
		self.stale_handles.fetch_add(1, Ordering::Relaxed);
		warn!(handle = %error.handle(), op, %error, "ignoring invalid tool handle");
	}
}

#[cfg(test)]
mod tests;
