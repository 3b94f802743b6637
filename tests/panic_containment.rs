//! Host panics are contained at the engine boundary and reported.

mod common;

use std::ffi::c_void;
use std::ptr;

use gdbridge::class::ClassBuilder;
use gdbridge::prelude::*;
use gdbridge_mock::Arg;

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Fragile {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    steps: i64,
}

impl Fragile {
    fn ready(&mut self) {
        panic!("boom");
    }

    fn process(&mut self, _delta: f64) {
        self.steps += 1;
    }

    fn explode(&mut self, depth: i64) -> i64 {
        if depth > 0 {
            panic!("kaboom at depth {}", depth);
        }
        depth
    }

    fn warnings(&mut self) -> PackedStringArray {
        panic!("no warnings today");
    }
}

impl ClassHooks for Fragile {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .virtual_method("_ready", Fragile::ready)
            .virtual_method("_process", Fragile::process)
            .virtual_method("_get_configuration_warnings", Fragile::warnings)
            .method("explode", Fragile::explode);
    }

    fn get_property(&self, name: &str) -> Option<Variant> {
        if name == "cursed" {
            panic!("cursed property");
        }
        None
    }
}

struct PanicLibrary;

impl ExtensionLibrary for PanicLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Fragile>();
        }
    }
}

gdbridge::extension_entry!(panic_library_init, PanicLibrary);

fn setup() -> u64 {
    common::load(panic_library_init);
    gdbridge_mock::construct("Fragile").unwrap()
}

#[test]
fn panicking_override_names_host_and_engine_method() {
    let id = setup();
    assert!(gdbridge_mock::call_virtual(id, "_ready", &[], ptr::null_mut()));

    let errors = common::errors_containing("Fragile::ready panicked while overriding Fragile::_ready");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("at tests/panic_containment.rs:"), "{}", errors[0]);
    assert!(errors[0].ends_with(": boom"), "{}", errors[0]);

    // The instance stays usable after the panic.
    let delta = 0.5f64;
    let args = [&delta as *const f64 as *const c_void];
    assert!(gdbridge_mock::call_virtual(id, "_process", &args, ptr::null_mut()));
    assert_eq!(gdbridge_mock::get_property(id, "steps"), Some(Arg::Int(1)));
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn panicking_override_writes_a_default_return() {
    let id = setup();
    let mut raw = [usize::MAX; 2];
    assert!(gdbridge_mock::call_virtual(
        id,
        "_get_configuration_warnings",
        &[],
        raw.as_mut_ptr() as *mut c_void
    ));
    let warnings = unsafe { PackedStringArray::from_opaque(raw) };
    assert_eq!(warnings.len().unwrap(), 0);
    assert!(!common::errors_containing("no warnings today").is_empty());
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn panicking_method_reports_a_call_error() {
    let id = setup();
    assert_eq!(gdbridge_mock::call_method(id, "explode", &[Arg::Int(0)]), Ok(Arg::Int(0)));

    let err = gdbridge_mock::call_method(id, "explode", &[Arg::Int(2)]).unwrap_err();
    assert_eq!(err.error, gdbridge::sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);
    assert!(!common::errors_containing("Fragile::explode panicked: kaboom at depth 2").is_empty());

    let depth = 3i64;
    let args = [&depth as *const i64 as *const c_void];
    let mut ret = -1i64;
    assert!(gdbridge_mock::ptrcall_method(id, "explode", &args, &mut ret as *mut i64 as *mut c_void));
    assert_eq!(ret, 0);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn panicking_property_hook_reads_as_missing() {
    let id = setup();
    assert_eq!(gdbridge_mock::get_property(id, "cursed"), None);
    assert!(!common::errors_containing("Fragile::get panicked: cursed property").is_empty());
    assert_eq!(gdbridge_mock::get_property(id, "steps"), Some(Arg::Int(0)));
    assert!(gdbridge_mock::destroy(id));
}
