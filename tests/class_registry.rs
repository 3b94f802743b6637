//! Registering classes and driving their instances from the engine side.

mod common;

use std::ffi::c_void;
use std::ptr;

use gdbridge::class::{is_registered, ClassBuilder};
use gdbridge::prelude::*;
use gdbridge::sys;
use gdbridge_mock::Arg;

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Pinger {
    #[bridge(base)]
    base: Base<Node>,
    readies: i64,
    elapsed: f64,
}

impl Pinger {
    fn ready(&mut self) {
        self.readies += 1;
    }

    fn process(&mut self, delta: f64) {
        self.elapsed += delta;
    }

    fn scaled(&mut self, factor: i64) -> i64 {
        self.readies * factor
    }

    fn greeting(&mut self, name: GString) -> GString {
        GString::from(format!("ping {}", name).as_str())
    }
}

impl ClassHooks for Pinger {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .virtual_method("_ready", Pinger::ready)
            .virtual_method("_process", Pinger::process)
            .method("scaled", Pinger::scaled)
            .method("greeting", Pinger::greeting);
    }

    fn to_string(&self) -> Option<String> {
        Some(format!("Pinger({})", self.readies))
    }
}

#[derive(ExtensionClass)]
#[bridge(base = Node, name = "Shape", abstract_class)]
struct AbstractShape {
    #[bridge(base)]
    base: Base<Node>,
}

#[derive(ExtensionClass)]
#[bridge(base = RefCounted)]
struct Counter {
    hits: i64,
}

/// Overrides `_process` with an integer argument.
#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Mismatched;

impl Mismatched {
    fn process(&mut self, _ticks: i64) {}
}

impl ClassHooks for Mismatched {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder.virtual_method("_process", Mismatched::process);
    }
}

/// Overrides a virtual no base class declares.
#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Stray;

impl Stray {
    fn jump(&mut self) {}
}

impl ClassHooks for Stray {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder.virtual_method("_jump", Stray::jump);
    }
}

struct RegistryLibrary;

impl ExtensionLibrary for RegistryLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar
                .register::<Pinger>()
                .register::<AbstractShape>()
                .register::<Counter>()
                .register::<Mismatched>()
                .register::<Stray>()
                // A second registration under the same name is rejected.
                .register::<Pinger>();
        }
    }
}

gdbridge::extension_entry!(registry_library_init, RegistryLibrary);

fn setup() {
    common::load(registry_library_init);
}

#[test]
fn classes_are_registered_under_their_parent() {
    setup();
    assert!(is_registered("Pinger"));
    assert!(gdbridge_mock::is_class_registered("Pinger"));
    assert_eq!(gdbridge_mock::class_parent("Pinger").as_deref(), Some("Node"));
    assert_eq!(gdbridge_mock::class_parent("Counter").as_deref(), Some("RefCounted"));
    assert!(gdbridge_mock::is_class_abstract("Shape"));
    assert!(!gdbridge_mock::is_class_abstract("Pinger"));
    assert!(!common::errors_containing("class 'Pinger' is already registered").is_empty());
}

#[test]
fn engine_created_instance_runs_its_ready_override() {
    setup();
    let id = gdbridge_mock::construct("Pinger").unwrap();
    assert_eq!(gdbridge_mock::class_of(id).as_deref(), Some("Pinger"));
    assert!(gdbridge_mock::has_virtual("Pinger", "_ready"));
    assert!(!gdbridge_mock::has_virtual("Pinger", "_physics_process"));

    assert!(gdbridge_mock::call_virtual(id, "_ready", &[], ptr::null_mut()));
    let delta = 0.25f64;
    let args = [&delta as *const f64 as *const c_void];
    assert!(gdbridge_mock::call_virtual(id, "_process", &args, ptr::null_mut()));

    let node = Obj::<Node>::new_alloc().unwrap();
    let object = unsafe { Obj::<Node>::from_sys_borrowed(gdbridge_mock::object_by_id(id).unwrap() as sys::GDExtensionObjectPtr) }
        .unwrap();
    let instance = Instance::<Pinger>::of(&object).unwrap();
    assert_eq!(instance.with(|pinger| (pinger.readies, pinger.elapsed)).unwrap(), (1, 0.25));
    assert_eq!(instance.instance_id(), id);
    assert!(Instance::<Pinger>::of(&node).is_none());
    assert_eq!(gdbridge_mock::to_string(id).as_deref(), Some("Pinger(1)"));

    node.free().unwrap();
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn lookup_returns_the_same_instance() {
    setup();
    let (object, instance) = Instance::<Pinger>::new_alloc().unwrap();
    let again = Instance::<Pinger>::of(&object).unwrap();
    assert!(instance.ptr_eq(&again));
    instance.with_mut(|pinger| pinger.readies = 7).unwrap();
    assert_eq!(again.with(|pinger| pinger.readies).unwrap(), 7);
    assert_eq!(object.get_class().unwrap(), "Pinger");
    object.free().unwrap();
}

#[test]
fn methods_answer_both_calling_conventions() {
    setup();
    let id = gdbridge_mock::construct("Pinger").unwrap();
    assert!(gdbridge_mock::call_virtual(id, "_ready", &[], ptr::null_mut()));

    assert_eq!(gdbridge_mock::call_method(id, "scaled", &[Arg::Int(6)]), Ok(Arg::Int(6)));
    assert_eq!(
        gdbridge_mock::call_method(id, "greeting", &[Arg::Text("héllo".to_string())]),
        Ok(Arg::Text("ping héllo".to_string()))
    );

    let factor = 3i64;
    let mut ret = 0i64;
    let args = [&factor as *const i64 as *const c_void];
    assert!(gdbridge_mock::ptrcall_method(id, "scaled", &args, &mut ret as *mut i64 as *mut c_void));
    assert_eq!(ret, 3);

    let signature = gdbridge_mock::method_signature("Pinger", "scaled").unwrap();
    assert_eq!(signature.arguments.len(), 1);
    assert_eq!(signature.arguments[0].variant_type, sys::GDEXTENSION_VARIANT_TYPE_INT);
    assert_eq!(
        signature.return_value.map(|ret| ret.variant_type),
        Some(sys::GDEXTENSION_VARIANT_TYPE_INT)
    );
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn variant_calls_report_argument_errors() {
    setup();
    let id = gdbridge_mock::construct("Pinger").unwrap();

    let too_few = gdbridge_mock::call_method(id, "scaled", &[]).unwrap_err();
    assert_eq!(too_few.error, sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS);
    assert_eq!(too_few.expected, 1);

    let too_many = gdbridge_mock::call_method(id, "scaled", &[Arg::Int(1), Arg::Int(2)]).unwrap_err();
    assert_eq!(too_many.error, sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS);

    let wrong_type = gdbridge_mock::call_method(id, "scaled", &[Arg::Text("two".to_string())]).unwrap_err();
    assert_eq!(wrong_type.error, sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT);
    assert_eq!(wrong_type.argument, 0);
    assert_eq!(wrong_type.expected, sys::GDEXTENSION_VARIANT_TYPE_INT as i32);

    let unknown = gdbridge_mock::call_method(id, "missing", &[]).unwrap_err();
    assert_eq!(unknown.error, sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn abstract_classes_cannot_be_instantiated() {
    setup();
    assert_eq!(gdbridge_mock::construct("Shape"), None);
    assert!(Instance::<AbstractShape>::new_alloc().is_err());
}

#[test]
fn refcounted_instances_die_with_their_last_reference() {
    setup();
    let (object, instance) = Instance::<Counter>::new_alloc().unwrap();
    let id = object.instance_id();
    assert_eq!(object.get_reference_count().unwrap(), 1);
    instance.with_mut(|counter| counter.hits += 1).unwrap();

    drop(instance);
    drop(object);
    assert!(!gdbridge_mock::is_alive(id));
}

#[test]
fn rejected_overrides_do_not_register_the_class() {
    setup();
    assert!(!is_registered("Mismatched"));
    assert!(!gdbridge_mock::is_class_registered("Mismatched"));
    let mismatch = common::errors_containing("cannot override engine method Node::_process");
    assert_eq!(mismatch.len(), 1);
    assert!(mismatch[0].contains("expected (float) -> void"), "{}", mismatch[0]);
    assert!(mismatch[0].contains("found (int) -> void"), "{}", mismatch[0]);

    assert!(!is_registered("Stray"));
    assert!(!common::errors_containing("overrides '_jump', which no base class declares").is_empty());
}
