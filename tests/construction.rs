//! A construction that fails half-way leaves nothing behind.
//!
//! Object and binding counts are process-wide, so this file holds a single test.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use gdbridge::handle::handles;
use gdbridge::prelude::*;

static ARMED: AtomicBool = AtomicBool::new(true);
static DROPPED: AtomicUsize = AtomicUsize::new(0);

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Brittle {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(child)]
    core: Option<Obj<Node>>,
}

impl ClassHooks for Brittle {
    fn on_create(&mut self) {
        if ARMED.load(Ordering::SeqCst) {
            panic!("cannot warm up");
        }
    }
}

impl Drop for Brittle {
    fn drop(&mut self) {
        DROPPED.fetch_add(1, Ordering::SeqCst);
    }
}

struct ConstructionLibrary;

impl ExtensionLibrary for ConstructionLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Brittle>();
        }
    }
}

gdbridge::extension_entry!(construction_library_init, ConstructionLibrary);

#[test]
fn panicking_on_create_destroys_the_half_built_object() {
    common::load(construction_library_init);
    let objects = gdbridge_mock::object_count();
    let bindings = handles().len();

    assert_eq!(gdbridge_mock::construct("Brittle"), None);

    // The object, its child and the binding are all gone.
    assert_eq!(gdbridge_mock::object_count(), objects);
    assert_eq!(handles().len(), bindings);
    assert_eq!(DROPPED.load(Ordering::SeqCst), 1);
    assert_eq!(common::errors_containing("Brittle::create_instance panicked: cannot warm up").len(), 1);

    // The class itself stays usable.
    ARMED.store(false, Ordering::SeqCst);
    let id = gdbridge_mock::construct("Brittle").unwrap();
    assert_eq!(gdbridge_mock::child_ids(id).len(), 1);
    assert_eq!(handles().len(), bindings + 1);
    assert!(gdbridge_mock::destroy(id));
    assert_eq!(gdbridge_mock::object_count(), objects);
    assert_eq!(handles().len(), bindings);
    assert_eq!(DROPPED.load(Ordering::SeqCst), 2);
}
