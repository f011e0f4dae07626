//! Tool overlay tracking for render threads.
//!
//! [`ToolOverlayRegistry`] stores tool overlay records behind a single lock
//! and keeps a derived, ordered [`MaterialView`] of their render materials.
//! Any thread may mutate the registry; one consumer thread reads the view
//! once per frame without locking.
//!
//! ```
//! use std::sync::Arc;
//! use voxtool_overlay::{MaterialInterface, ToolOverlayRegistry};
//!
//! #[derive(Debug)]
//! struct Highlight;
//! impl MaterialInterface for Highlight {}
//!
//! let registry = ToolOverlayRegistry::new();
//! let tool = registry.create(true);
//! registry.edit(tool, |record| record.material = Some(Arc::new(Highlight)));
//! assert_eq!(registry.materials().len(), 1);
//!
//! registry.remove(tool);
//! assert!(registry.materials().is_empty());
//! ```
//!
//! Handles only come from the registry that issued them; the slot allocator
//! behind it is not public.
//!
//! ```compile_fail
//! use voxtool_overlay::SlotArena;
//! ```

mod affinity;
mod arena;
mod config;
mod error;
mod handle;
mod record;
mod registry;
mod view;

pub use config::{AffinityCheck, RegistryConfig, ViewFilter};
pub use error::{CapacityExhausted, ConfigError, ToolError};
pub use handle::ToolHandle;
pub use record::{MaterialInterface, MaterialRef, ToolRecord};
pub use registry::ToolOverlayRegistry;
pub use view::MaterialView;
pub use voxtool_primitives::Aabb;
