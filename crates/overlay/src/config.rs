//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which live records contribute to the material view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewFilter {
	/// Every record with a material, enabled or not.
	#[default]
	MaterialPresent,
	/// Only enabled records with a material.
	EnabledOnly,
}

/// How strictly the consumer-thread contract of the material view is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AffinityCheck {
	/// Never checked.
	Off,
	/// Asserted in debug builds only.
	#[default]
	Debug,
	/// Asserted in every build.
	Always,
}

impl AffinityCheck {
	/// Returns true when a violation should panic in this build.
	pub fn is_enforced(self) -> bool {
		match self {
			Self::Off => false,
			Self::Debug => cfg!(debug_assertions),
			Self::Always => true,
		}
	}
}

/// Construction options for [`crate::ToolOverlayRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// Slot pre-allocation hint.
	pub capacity: usize,
	pub view_filter: ViewFilter,
	/// Keep only the first occurrence of a material shared by several tools.
	pub dedupe_materials: bool,
	pub affinity: AffinityCheck,
}

impl RegistryConfig {
	/// Parses a TOML document. Missing keys take their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}
}
