use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use pretty_assertions::assert_eq;
use rstest::rstest;
use voxtool_primitives::Aabb;

use super::ToolOverlayRegistry;
use crate::config::{AffinityCheck, RegistryConfig, ViewFilter};
use crate::error::ToolError;
use crate::handle::ToolHandle;
use crate::record::{MaterialInterface, MaterialRef, ToolRecord};
use crate::view::MaterialView;

#[derive(Debug)]
struct TestMaterial {
	#[allow(dead_code)]
	name: &'static str,
	drop_counter: Option<Arc<AtomicUsize>>,
}

impl MaterialInterface for TestMaterial {}

impl Drop for TestMaterial {
	fn drop(&mut self) {
		if let Some(counter) = &self.drop_counter {
			counter.fetch_add(1, Ordering::SeqCst);
		}
	}
}

fn material(name: &'static str) -> MaterialRef {
	Arc::new(TestMaterial {
		name,
		drop_counter: None,
	})
}

fn names(view: &MaterialView) -> Vec<String> {
	view.iter()
		.map(|material| {
			let debug = format!("{material:?}");
			debug
				.split('"')
				.nth(1)
				.unwrap_or_default()
				.to_string()
		})
		.collect()
}

fn set_material(registry: &ToolOverlayRegistry, handle: ToolHandle, material: &MaterialRef) {
	let material = Arc::clone(material);
	registry.edit(handle, move |record| record.material = Some(material));
}

#[test]
fn create_is_valid_until_removed() {
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	assert!(registry.is_valid(handle));
	assert_eq!(registry.len(), 1);

	registry.remove(handle);
	assert!(!registry.is_valid(handle));
	assert!(registry.is_empty());
	assert_eq!(registry.stale_handle_count(), 0);
}

#[test]
fn create_stores_defaults_and_leaves_view_alone() {
	let registry = ToolOverlayRegistry::new();
	let m1 = material("m1");
	let h1 = registry.create(false);
	set_material(&registry, h1, &m1);
	let before = registry.materials();

	let h2 = registry.create(true);
	let record = registry.get(h2).unwrap();
	assert!(record.enabled);
	assert_eq!(record.bounds, Aabb::EMPTY);
	assert!(record.material.is_none());

	let after = registry.materials();
	assert!(Arc::ptr_eq(&before, &after), "create must not republish the view");
}

#[test]
fn view_follows_edits_and_removals_in_slot_order() {
	let registry = ToolOverlayRegistry::new();
	let (m1, m2, m3) = (material("m1"), material("m2"), material("m3"));
	let h1 = registry.create(false);
	let h2 = registry.create(false);
	let h3 = registry.create(false);

	set_material(&registry, h3, &m3);
	set_material(&registry, h1, &m1);
	assert_eq!(names(&registry.materials()), ["m1", "m3"]);

	set_material(&registry, h2, &m2);
	assert_eq!(names(&registry.materials()), ["m1", "m2", "m3"]);

	registry.edit(h1, |record| record.material = None);
	assert_eq!(names(&registry.materials()), ["m2", "m3"]);

	registry.remove(h3);
	let view = registry.materials();
	assert_eq!(names(&view), ["m2"]);
	assert!(Arc::ptr_eq(&view[0], &m2));
}

#[test]
fn reused_slot_takes_old_position() {
	let registry = ToolOverlayRegistry::new();
	let h1 = registry.create(false);
	let h2 = registry.create(false);
	set_material(&registry, h2, &material("second"));
	registry.remove(h1);

	let h3 = registry.create(false);
	set_material(&registry, h3, &material("reused"));
	assert_eq!(names(&registry.materials()), ["reused", "second"]);

	registry.edit(h1, |record| record.enabled = true);
	assert!(!registry.get(h3).unwrap().enabled, "stale handle must not reach the new occupant");
	assert_eq!(registry.stale_handle_count(), 1);
}

#[test]
fn invalid_handles_are_ignored_and_counted() {
	let _ = tracing_subscriber::fmt::try_init();
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	set_material(&registry, handle, &material("m1"));
	let before = registry.materials();

	let unknown = ToolHandle::new(9999, 0);
	registry.edit(unknown, |record| record.enabled = true);
	registry.remove(unknown);
	registry.remove(handle);
	registry.remove(handle);

	assert_eq!(registry.stale_handle_count(), 3);
	assert!(registry.is_empty());
	assert!(before.revision() < registry.materials().revision());
	assert_eq!(
		registry.try_edit(unknown, |_| ()),
		Err(ToolError::UnknownHandle { handle: unknown })
	);
	assert_eq!(
		registry.try_remove(handle).unwrap_err(),
		ToolError::StaleHandle { handle }
	);
	// Checked variants do not emit diagnostics.
	assert_eq!(registry.stale_handle_count(), 3);
}

#[test]
fn rejected_edit_does_not_run_mutator_or_republish() {
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	registry.remove(handle);
	let before = registry.materials();

	let mut ran = false;
	registry.edit(handle, |_| ran = true);

	assert!(!ran);
	assert!(Arc::ptr_eq(&before, &registry.materials()));
}

#[test]
fn panicking_edit_still_republishes_the_view() {
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	let m1 = material("m1");

	let attached = Arc::clone(&m1);
	let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
		registry.edit(handle, |record| {
			record.material = Some(attached);
			panic!("mutator failed halfway");
		});
	}));
	assert!(result.is_err(), "the mutator's panic reaches the caller");

	let stored = registry.get(handle).unwrap().material.unwrap();
	let view = registry.materials();
	assert_eq!(names(&view), ["m1"]);
	assert!(Arc::ptr_eq(&view[0], &stored));
	assert_eq!(view.revision(), 1);

	// The lock was released on unwind.
	registry.edit(handle, |record| record.material = None);
	assert!(registry.materials().is_empty());
}

#[test]
fn try_edit_returns_mutator_result() {
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	let bounds = Aabb::new([0.0; 3], [8.0; 3]);

	let previous = registry
		.try_edit(handle, |record| std::mem::replace(&mut record.bounds, bounds))
		.unwrap();

	assert_eq!(previous, Aabb::EMPTY);
	assert_eq!(registry.get(handle).unwrap().bounds, bounds);
}

#[test]
fn try_remove_hands_back_the_record() {
	let registry = ToolOverlayRegistry::new();
	let m1 = material("m1");
	let handle = registry.create_with(ToolRecord::new(true).with_material(Arc::clone(&m1)));

	let record = registry.try_remove(handle).unwrap();
	assert!(record.enabled);
	assert!(Arc::ptr_eq(record.material.as_ref().unwrap(), &m1));
	assert!(registry.materials().is_empty());
}

#[test]
fn create_with_material_recomputes() {
	let registry = ToolOverlayRegistry::new();
	let plain = registry.create_with(ToolRecord::new(false));
	assert_eq!(registry.materials().revision(), 0);

	registry.create_with(ToolRecord::new(false).with_material(material("m1")));
	let view = registry.materials();
	assert_eq!(view.revision(), 1);
	assert_eq!(names(&view), ["m1"]);
	assert!(registry.is_valid(plain));
}

#[test]
fn revision_increments_per_recompute() {
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create(false);
	assert_eq!(registry.materials().revision(), 0);

	registry.edit(handle, |record| record.enabled = true);
	registry.edit(handle, |record| record.enabled = false);
	assert_eq!(registry.materials().revision(), 2);

	let a = registry.materials();
	let b = registry.materials();
	assert!(Arc::ptr_eq(&a, &b), "reads without mutation see the same view");
}

#[test]
fn for_each_visits_in_slot_order() {
	let registry = ToolOverlayRegistry::new();
	let h1 = registry.create(true);
	registry.create(false);
	registry.create(true);
	registry.remove(h1);
	registry.create(false);

	let mut seen = Vec::new();
	registry.for_each(|record| seen.push(record.enabled));
	assert_eq!(seen, [false, false, true]);
}

#[rstest]
#[case(ViewFilter::MaterialPresent, false, &["on", "off", "on"])]
#[case(ViewFilter::EnabledOnly, false, &["on", "on"])]
#[case(ViewFilter::MaterialPresent, true, &["on", "off"])]
#[case(ViewFilter::EnabledOnly, true, &["on"])]
fn view_filtering(#[case] view_filter: ViewFilter, #[case] dedupe_materials: bool, #[case] expected: &[&str]) {
	let registry = ToolOverlayRegistry::with_config(RegistryConfig {
		view_filter,
		dedupe_materials,
		..RegistryConfig::default()
	});
	let shared = material("on");
	registry.create_with(ToolRecord::new(true).with_material(Arc::clone(&shared)));
	registry.create_with(ToolRecord::new(false).with_material(material("off")));
	registry.create_with(ToolRecord::new(true).with_material(shared));

	assert_eq!(names(&registry.materials()), expected);
}

#[test]
fn retired_views_keep_materials_alive() {
	let drops = Arc::new(AtomicUsize::new(0));
	let registry = ToolOverlayRegistry::new();
	let handle = registry.create_with(ToolRecord::new(true).with_material(Arc::new(TestMaterial {
		name: "tracked",
		drop_counter: Some(Arc::clone(&drops)),
	})));

	let held = registry.materials();
	registry.remove(handle);
	assert!(registry.materials().is_empty());
	assert_eq!(drops.load(Ordering::SeqCst), 0, "held view still owns the material");
	assert_eq!(names(&held), ["tracked"]);

	drop(held);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn explicit_binding_wins_over_first_read() {
	let registry = Arc::new(ToolOverlayRegistry::with_config(RegistryConfig {
		affinity: AffinityCheck::Always,
		..RegistryConfig::default()
	}));
	assert!(registry.consumer_thread().is_none());
	assert!(registry.bind_consumer_thread());
	assert!(registry.bind_consumer_thread());
	assert_eq!(registry.consumer_thread(), Some(thread::current().id()));

	let other = Arc::clone(&registry);
	let rebound = thread::spawn(move || other.bind_consumer_thread()).join().unwrap();
	assert!(!rebound);
}

#[test]
fn foreign_reader_panics_when_enforced() {
	let registry = Arc::new(ToolOverlayRegistry::with_config(RegistryConfig {
		affinity: AffinityCheck::Always,
		..RegistryConfig::default()
	}));
	registry.materials();

	let reader = Arc::clone(&registry);
	let result = thread::spawn(move || reader.materials().len()).join();
	assert!(result.is_err());

	// Mutation stays legal from any thread.
	let writer = Arc::clone(&registry);
	let handle = thread::spawn(move || writer.create(true)).join().unwrap();
	assert!(registry.is_valid(handle));
	assert_eq!(registry.materials().len(), 0);
}

#[test]
fn unchecked_affinity_allows_any_reader() {
	let registry = Arc::new(ToolOverlayRegistry::with_config(RegistryConfig {
		affinity: AffinityCheck::Off,
		..RegistryConfig::default()
	}));
	registry.materials();

	let reader = Arc::clone(&registry);
	let len = thread::spawn(move || reader.materials().len()).join().unwrap();
	assert_eq!(len, 0);
	assert!(registry.consumer_thread().is_none());
}

#[test]
fn registry_is_shareable() {
	fn assert_send_sync<T: Send + Sync>() {}
	assert_send_sync::<ToolOverlayRegistry>();
	assert_send_sync::<Arc<MaterialView>>();
}
