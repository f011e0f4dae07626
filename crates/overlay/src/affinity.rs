//! Consumer-thread affinity for the material view read path.

use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use crate::config::AffinityCheck;

/// Remembers the single thread allowed to read the material view.
///
/// The owner is fixed by [`bind_current_thread`](Self::bind_current_thread)
/// or, failing that, by the first checked read. It cannot be rebound.
#[derive(Debug)]
pub(crate) struct ConsumerAffinity {
	check: AffinityCheck,
	owner: OnceLock<ThreadId>,
}

impl ConsumerAffinity {
	pub(crate) fn new(check: AffinityCheck) -> Self {
		Self {
			check,
			owner: OnceLock::new(),
		}
	}

	/// Makes the calling thread the consumer.
	///
	/// Returns false if another thread already holds the role.
	pub(crate) fn bind_current_thread(&self) -> bool {
		let current = thread::current().id();
		let owner = *self.owner.get_or_init(|| current);
		if owner != current {
			tracing::warn!(?owner, ?current, "material view consumer already bound");
			return false;
		}
		tracing::debug!(?owner, "material view consumer bound");
		true
	}

	pub(crate) fn owner(&self) -> Option<ThreadId> {
		self.owner.get().copied()
	}

	/// Asserts the calling thread is the consumer, binding it on first use.
	///
	/// # Panics
	///
	/// When enforcement is active for this build and the caller is not the
	/// bound consumer thread.
	#[inline]
	pub(crate) fn check(&self) {
		if !self.check.is_enforced() {
			return;
		}
		let current = thread::current().id();
		let owner = *self.owner.get_or_init(|| current);
		assert!(
			owner == current,
			"material view read from {current:?}, but the consumer thread is {owner:?}"
		);
	}
}
