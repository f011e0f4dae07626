use crate::handle::ToolHandle;

/// Rejection of a handle that does not name a live record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
	/// The slot was freed, or reused by a later insertion.
	#[error("stale tool handle {handle}")]
	StaleHandle { handle: ToolHandle },

	/// The slot index was never allocated by this registry.
	#[error("unknown tool handle {handle}")]
	UnknownHandle { handle: ToolHandle },
}

impl ToolError {
	/// The rejected handle.
	pub fn handle(&self) -> ToolHandle {
		match *self {
			Self::StaleHandle { handle } | Self::UnknownHandle { handle } => handle,
		}
	}
}

/// Every slot index a handle can encode is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tool slot capacity exhausted")]
pub struct CapacityExhausted;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid registry config: {0}")]
	Toml(#[from] toml::de::Error),
}
