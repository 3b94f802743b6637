//! Unloading the library releases everything the bridge holds.
//!
//! Unloading is process-wide, so this file holds a single test.

use std::sync::atomic::{AtomicUsize, Ordering};

use gdbridge::class::is_registered;
use gdbridge::handle::handles;
use gdbridge::prelude::*;
use gdbridge_mock::Arg;

static DROPPED: AtomicUsize = AtomicUsize::new(0);

#[derive(ExtensionClass)]
#[bridge(base = Node)]
struct Sentinel {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    watch: i64,
}

impl Drop for Sentinel {
    fn drop(&mut self) {
        DROPPED.fetch_add(1, Ordering::SeqCst);
    }
}

struct TeardownLibrary;

impl ExtensionLibrary for TeardownLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Sentinel>();
        }
    }
}

gdbridge::extension_entry!(teardown_library_init, TeardownLibrary);

#[test]
fn unloading_unregisters_classes_and_drains_handles() {
    assert!(gdbridge_mock::load_library(teardown_library_init));
    assert!(handles().is_active());

    let id = gdbridge_mock::construct("Sentinel").unwrap();
    assert!(gdbridge_mock::set_property(id, "watch", &Arg::Int(3)));
    let shared = Obj::<RefCounted>::new_alloc().unwrap();
    let node = Obj::<Node>::new_alloc().unwrap();
    assert!(!handles().is_empty());

    assert!(gdbridge_mock::unload_library());
    assert!(!gdbridge_mock::is_library_loaded());

    // Classes are gone on both sides.
    assert!(!is_registered("Sentinel"));
    assert!(!gdbridge_mock::is_class_registered("Sentinel"));

    // Bindings were drained and their host values dropped.
    assert!(handles().is_empty());
    assert!(!handles().is_active());
    assert_eq!(DROPPED.load(Ordering::SeqCst), 1);

    // The engine object outlives the library but no longer reaches host code.
    assert!(gdbridge_mock::is_alive(id));
    assert_eq!(gdbridge_mock::get_property(id, "watch"), None);

    // Handles kept by the host are inert.
    assert!(matches!(node.get_class(), Err(BridgeError::StaleHandle { .. })));
    drop(shared);
    drop(node);

    // A second load registers the classes again.
    assert!(gdbridge_mock::load_library(teardown_library_init));
    assert!(is_registered("Sentinel"));
    let again = gdbridge_mock::construct("Sentinel").unwrap();
    assert_eq!(gdbridge_mock::get_property(again, "watch"), Some(Arg::Int(0)));
    assert!(gdbridge_mock::destroy(again));
    assert!(gdbridge_mock::destroy(id));
    assert_eq!(DROPPED.load(Ordering::SeqCst), 2);
    assert!(gdbridge_mock::unload_library());
}
