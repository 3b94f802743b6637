//! Exported fields as the engine's property protocol sees them.

mod common;

use gdbridge::prelude::*;
use gdbridge::sys;
use gdbridge_mock::{Arg, PropertyRecord};

#[derive(ExtensionClass)]
#[bridge(base = Node, name = "Mover", hooks)]
struct Mover {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export, name = "Speed", default = "1.5")]
    speed: f64,
    #[bridge(export, hint = Enum, hint_string = "Walk,Run")]
    mode: i64,
    #[bridge(export)]
    label: GString,
    locked: bool,
}

impl ClassHooks for Mover {
    fn get_property(&self, name: &str) -> Option<Variant> {
        (name == "double_speed").then(|| (self.speed * 2.0).to_variant())
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> bool {
        if name != "locked" {
            return false;
        }
        self.locked = bool::from_variant(value).unwrap_or(false);
        true
    }

    fn validate_property(&self, property: &mut PropertyDescriptor) -> bool {
        if !self.locked {
            return false;
        }
        match property.name.as_str() {
            "Speed" => property.usage |= PropertyUsage::READ_ONLY,
            "mode" => property.hint_string = "Walk,Run,Fly".to_string(),
            _ => return false,
        }
        true
    }
}

/// Lists a computed property instead of its fields.
#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Gauge {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    level: i64,
}

impl ClassHooks for Gauge {
    fn property_list(&self) -> Option<Vec<PropertyDescriptor>> {
        Some(vec![PropertyDescriptor {
            hint: PropertyHint::Range,
            hint_string: "0,100".to_string(),
            ..PropertyDescriptor::new("percent", VariantType::Int)
        }])
    }

    fn get_property(&self, name: &str) -> Option<Variant> {
        (name == "percent").then(|| (self.level * 10).to_variant())
    }
}

struct PropertyLibrary;

impl ExtensionLibrary for PropertyLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Mover>().register::<Gauge>();
        }
    }
}

gdbridge::extension_entry!(property_library_init, PropertyLibrary);

fn setup() -> u64 {
    common::load(property_library_init);
    gdbridge_mock::construct("Mover").unwrap()
}

#[test]
fn exported_float_reads_and_writes_through_the_engine() {
    let id = setup();
    assert_eq!(gdbridge_mock::get_property(id, "Speed"), Some(Arg::Float(1.5)));

    assert!(gdbridge_mock::set_property(id, "Speed", &Arg::Float(2.0)));
    assert_eq!(gdbridge_mock::get_property(id, "Speed"), Some(Arg::Float(2.0)));
    // The field name reaches the same field.
    assert_eq!(gdbridge_mock::get_property(id, "speed"), Some(Arg::Float(2.0)));

    // Integers widen into float fields.
    assert!(gdbridge_mock::set_property(id, "Speed", &Arg::Int(3)));
    assert_eq!(
        common::node_instance::<Mover>(id).with(|mover| mover.speed).unwrap(),
        3.0
    );
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn unknown_and_mistyped_writes_are_refused() {
    let id = setup();
    assert_eq!(gdbridge_mock::get_property(id, "Accel"), None);
    assert!(!gdbridge_mock::set_property(id, "Accel", &Arg::Float(1.0)));

    assert!(!gdbridge_mock::set_property(id, "Speed", &Arg::Text("fast".to_string())));
    assert_eq!(gdbridge_mock::get_property(id, "Speed"), Some(Arg::Float(1.5)));
    assert!(!common::errors_containing("Mover::set failed: type mismatch").is_empty());

    // Plain fields are not properties.
    assert_eq!(gdbridge_mock::get_property(id, "locked"), None);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn fields_start_at_their_declared_defaults() {
    let id = setup();
    let instance = common::node_instance::<Mover>(id);
    instance
        .with(|mover| {
            assert_eq!(mover.speed, 1.5);
            assert_eq!(mover.mode, 0);
            assert_eq!(mover.label.to_string(), "");
            assert!(!mover.locked);
            assert_eq!(mover.base.instance_id(), id);
        })
        .unwrap();

    assert!(gdbridge_mock::set_property(id, "label", &Arg::Text("héllo".to_string())));
    assert_eq!(gdbridge_mock::get_property(id, "label"), Some(Arg::Text("héllo".to_string())));
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn property_list_describes_exported_fields() {
    let id = setup();
    let list = gdbridge_mock::property_list(id);
    let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Speed", "mode", "label"]);

    assert_eq!(list[0].variant_type, sys::GDEXTENSION_VARIANT_TYPE_FLOAT);
    assert_eq!(list[0].usage, sys::PROPERTY_USAGE_DEFAULT);
    assert_eq!(list[1].variant_type, sys::GDEXTENSION_VARIANT_TYPE_INT);
    assert_eq!(list[1].hint, sys::PROPERTY_HINT_ENUM);
    assert_eq!(list[1].hint_string, "Walk,Run");
    assert_eq!(list[2].variant_type, sys::GDEXTENSION_VARIANT_TYPE_STRING);
    assert_eq!(list[2].hint_string, "");
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn only_declared_defaults_are_revertible() {
    let id = setup();
    assert!(gdbridge_mock::set_property(id, "Speed", &Arg::Float(9.0)));
    assert!(gdbridge_mock::property_can_revert(id, "Speed"));
    assert_eq!(gdbridge_mock::property_get_revert(id, "Speed"), Some(Arg::Float(1.5)));

    assert!(!gdbridge_mock::property_can_revert(id, "mode"));
    assert_eq!(gdbridge_mock::property_get_revert(id, "mode"), None);
    assert!(!gdbridge_mock::property_can_revert(id, "Accel"));
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn hooks_take_precedence_over_fields() {
    let id = setup();
    assert_eq!(gdbridge_mock::get_property(id, "double_speed"), Some(Arg::Float(3.0)));
    assert!(gdbridge_mock::set_property(id, "locked", &Arg::Bool(true)));
    assert!(common::node_instance::<Mover>(id).with(|mover| mover.locked).unwrap());
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn validate_property_edits_the_engine_descriptor() {
    let id = setup();
    let list = gdbridge_mock::property_list(id);
    let speed = list.iter().find(|p| p.name == "Speed").unwrap();
    let mode = list.iter().find(|p| p.name == "mode").unwrap();

    // Unlocked instances leave descriptors alone.
    assert_eq!(&gdbridge_mock::validate_property(id, speed), speed);

    assert!(gdbridge_mock::set_property(id, "locked", &Arg::Bool(true)));
    let validated = gdbridge_mock::validate_property(id, speed);
    assert_eq!(validated.usage, sys::PROPERTY_USAGE_DEFAULT | sys::PROPERTY_USAGE_READ_ONLY);
    assert_eq!(validated.name, "Speed");

    let validated = gdbridge_mock::validate_property(id, mode);
    assert_eq!(
        validated,
        PropertyRecord {
            hint_string: "Walk,Run,Fly".to_string(),
            ..mode.clone()
        }
    );
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn custom_property_lists_replace_the_fields() {
    common::load(property_library_init);
    let id = gdbridge_mock::construct("Gauge").unwrap();
    assert!(gdbridge_mock::set_property(id, "level", &Arg::Int(4)));

    let list = gdbridge_mock::property_list(id);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "percent");
    assert_eq!(list[0].hint, sys::PROPERTY_HINT_RANGE);
    assert_eq!(list[0].hint_string, "0,100");
    assert_eq!(gdbridge_mock::get_property(id, "percent"), Some(Arg::Int(40)));
    assert!(gdbridge_mock::destroy(id));
}
