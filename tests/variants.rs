//! Variants and containers crossing registered methods.

mod common;

use std::ffi::c_void;

use gdbridge::class::ClassBuilder;
use gdbridge::prelude::*;
use gdbridge_mock::Arg;

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Ledger {
    #[bridge(base)]
    base: Base<Node>,
}

impl Ledger {
    fn total(&mut self, values: VariantArray) -> f64 {
        values
            .to_vec()
            .unwrap_or_default()
            .iter()
            .map(|value| value.to::<f64>().unwrap_or(0.0))
            .sum()
    }

    fn names(&mut self, count: i64) -> PackedStringArray {
        let names: Vec<String> = (0..count).map(|i| format!("item{}", i)).collect();
        PackedStringArray::from_slice(&names).unwrap_or_default()
    }

    fn lookup(&mut self, table: Dictionary, key: GString) -> Variant {
        table.get(&Variant::from(key)).ok().flatten().unwrap_or_default()
    }

    fn describe(&mut self, value: Variant) -> GString {
        GString::from(value.stringify().as_str())
    }
}

impl ClassHooks for Ledger {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .method("total", Ledger::total)
            .method("names", Ledger::names)
            .method("lookup", Ledger::lookup)
            .method("describe", Ledger::describe);
    }
}

struct VariantLibrary;

impl ExtensionLibrary for VariantLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Ledger>();
        }
    }
}

gdbridge::extension_entry!(variant_library_init, VariantLibrary);

fn setup() -> u64 {
    common::load(variant_library_init);
    gdbridge_mock::construct("Ledger").unwrap()
}

#[test]
fn non_ascii_text_survives_the_round_trip() {
    setup();
    let variant = Variant::from(GString::from("héllo"));
    assert_eq!(variant.get_type(), VariantType::String);
    assert_eq!(variant.to::<String>().unwrap(), "héllo");
    assert_eq!("héllo".to_string().to_variant().to::<GString>().unwrap().to_string(), "héllo");
}

#[test]
fn arrays_pass_through_the_pointer_convention() {
    let id = setup();
    let baseline = gdbridge_mock::live_containers();
    {
        let mut values = VariantArray::new();
        values.push(&1i64.to_variant()).unwrap();
        values.push(&2.5f64.to_variant()).unwrap();
        values.push(&Variant::nil()).unwrap();

        let args = [values.sys() as *const c_void];
        let mut ret = 0f64;
        assert!(gdbridge_mock::ptrcall_method(id, "total", &args, &mut ret as *mut f64 as *mut c_void));
        assert_eq!(ret, 3.5);
        // The callee took its own copy.
        assert_eq!(values.len().unwrap(), 3);
    }
    assert_eq!(gdbridge_mock::live_containers(), baseline);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn returned_containers_belong_to_the_caller() {
    let id = setup();
    let baseline = gdbridge_mock::live_containers();
    {
        let count = 3i64;
        let args = [&count as *const i64 as *const c_void];
        let mut raw = [0usize; 2];
        assert!(gdbridge_mock::ptrcall_method(id, "names", &args, raw.as_mut_ptr() as *mut c_void));
        let names = unsafe { PackedStringArray::from_opaque(raw) };
        assert_eq!(names.to_vec().unwrap(), ["item0", "item1", "item2"]);
    }
    assert_eq!(gdbridge_mock::live_containers(), baseline);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn dictionaries_and_variants_as_arguments() {
    let id = setup();
    let baseline = gdbridge_mock::live_containers();
    {
        let mut table = Dictionary::new();
        table
            .insert(&Variant::from(GString::from("speed")), &4i64.to_variant())
            .unwrap();
        let key = GString::from("speed");
        let args = [table.sys() as *const c_void, key.sys() as *const c_void];
        let mut ret = Variant::nil();
        assert!(gdbridge_mock::ptrcall_method(id, "lookup", &args, ret.sys_mut() as *mut c_void));
        assert_eq!(ret.to::<i64>().unwrap(), 4);

        let missing = GString::from("accel");
        let args = [table.sys() as *const c_void, missing.sys() as *const c_void];
        let mut ret = Variant::nil();
        assert!(gdbridge_mock::ptrcall_method(id, "lookup", &args, ret.sys_mut() as *mut c_void));
        assert!(ret.is_nil());
    }
    assert_eq!(gdbridge_mock::live_containers(), baseline);

    assert_eq!(
        gdbridge_mock::call_method(id, "describe", &[Arg::Int(12)]),
        Ok(Arg::Text("12".to_string()))
    );
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn decoding_follows_the_tag() {
    setup();
    let mut nested = VariantArray::new();
    nested.push(&GString::from("a").to_variant()).unwrap();
    nested.push(&3i64.to_variant()).unwrap();
    let variant = Variant::from(nested);

    match variant.decode() {
        Value::Array(array) => {
            let items = array.to_vec().unwrap();
            assert_eq!(items.len(), 2);
            assert!(matches!(items[0].decode(), Value::String(ref text) if text.to_string() == "a"));
            assert!(matches!(items[1].decode(), Value::Int(3)));
        }
        other => panic!("decoded as {:?}", other.variant_type()),
    }
    assert_eq!(variant.stringify(), "[a, 3]");

    assert!(1i64.to_variant().engine_eq(&1.0f64.to_variant()));
    assert!(!1i64.to_variant().engine_eq(&GString::from("1").to_variant()));
}
