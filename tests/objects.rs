//! Engine objects held by host instances: children, references and teardown order.

mod common;

use std::ffi::c_void;
use std::ptr;
use std::sync::Mutex;

use gdbridge::class::ClassBuilder;
use gdbridge::handle::handles;
use gdbridge::prelude::*;
use gdbridge_mock::Arg;

#[derive(ExtensionClass)]
#[bridge(base = Node)]
struct Rig {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(child, name = "Sensor")]
    sensor: Option<Obj<Node>>,
    #[bridge(child)]
    arm: Option<Obj<Node>>,
}

/// Teardown events by holder instance id.
static TEARDOWN: Mutex<Vec<(u64, String)>> = Mutex::new(Vec::new());

fn events_of(id: u64) -> Vec<String> {
    let events = TEARDOWN.lock().unwrap();
    events.iter().filter(|(owner, _)| *owner == id).map(|(_, event)| event.clone()).collect()
}

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Holder {
    #[bridge(base)]
    base: Base<Node>,
    texture: Option<Obj<Resource>>,
}

impl ClassHooks for Holder {
    fn on_free(&mut self) {
        let id = self.base.instance_id();
        let texture = self.texture.as_ref().map(Obj::instance_id).unwrap_or_default();
        let mut events = TEARDOWN.lock().unwrap();
        events.push((id, format!(
            "on_free: texture refs {:?}, bound {}",
            gdbridge_mock::refcount(texture),
            handles().binding(self.base.sys()).is_some()
        )));
        // Released while the holder object is still alive.
        self.texture = None;
        events.push((id, format!("cleared: texture refs {:?}", gdbridge_mock::refcount(texture))));
    }
}

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Gallery {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    cover: Option<Obj<Resource>>,
}

impl ClassHooks for Gallery {
    fn on_free(&mut self) {
        let cover = self.cover.as_ref().map(Obj::instance_id).unwrap_or_default();
        let event = format!("on_free: cover refs {:?}", gdbridge_mock::refcount(cover));
        TEARDOWN.lock().unwrap().push((self.base.instance_id(), event));
    }
}

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Inspector {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    last_event: i64,
}

impl Inspector {
    fn weigh(&mut self, resource: Obj<Resource>) -> i64 {
        resource.instance_id() as i64
    }

    fn input(&mut self, event: Obj<InputEvent>) {
        self.last_event = event.instance_id() as i64;
    }
}

impl ClassHooks for Inspector {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .method("weigh", Inspector::weigh)
            .virtual_method("_input", Inspector::input);
    }
}

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Fuse {
    #[bridge(base)]
    base: Base<Node>,
}

impl Fuse {
    fn blow(&mut self) {
        if let Some(own) = self.base.to_obj() {
            own.free().unwrap();
        }
    }
}

impl ClassHooks for Fuse {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder.method("blow", Fuse::blow);
    }

    fn on_free(&mut self) {
        TEARDOWN.lock().unwrap().push((self.base.instance_id(), "on_free".to_string()));
    }
}

#[derive(ExtensionClass)]
#[bridge(base = RefCounted, hooks)]
struct Ticket {
    #[bridge(base)]
    base: Base<RefCounted>,
}

impl ClassHooks for Ticket {
    fn on_free(&mut self) {
        let revived = self.base.to_obj().is_some();
        let event = format!("on_free: revived {}", revived);
        TEARDOWN.lock().unwrap().push((self.base.instance_id(), event));
    }
}

struct ObjectLibrary;

impl ExtensionLibrary for ObjectLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar
                .register::<Rig>()
                .register::<Holder>()
                .register::<Gallery>()
                .register::<Inspector>()
                .register::<Fuse>()
                .register::<Ticket>();
        }
    }
}

gdbridge::extension_entry!(object_library_init, ObjectLibrary);

fn setup() {
    common::load(object_library_init);
}

#[test]
fn child_fields_are_created_under_the_instance() {
    setup();
    let id = gdbridge_mock::construct("Rig").unwrap();
    let children = gdbridge_mock::child_ids(id);
    assert_eq!(children.len(), 2);
    let names: Vec<String> = children.iter().filter_map(|child| gdbridge_mock::node_name(*child)).collect();
    assert_eq!(names, ["Sensor", "arm"]);

    let instance = common::node_instance::<Rig>(id);
    let sensor_id = instance
        .with(|rig| rig.sensor.as_ref().map(Obj::instance_id))
        .unwrap()
        .unwrap();
    assert_eq!(sensor_id, children[0]);
    drop(instance);

    // Children go with their parent.
    assert!(gdbridge_mock::destroy(id));
    assert!(!gdbridge_mock::is_alive(sensor_id));
}

#[test]
fn existing_children_are_reused_on_reassertion() {
    setup();
    let id = gdbridge_mock::construct("Rig").unwrap();
    let instance = common::node_instance::<Rig>(id);
    instance
        .with_mut(|rig| {
            rig.sensor = None;
            rig.assert_children().unwrap();
            assert!(rig.sensor.is_some());
        })
        .unwrap();
    assert_eq!(gdbridge_mock::child_ids(id).len(), 2);
    drop(instance);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn host_references_count_once_each() {
    setup();
    let texture = Obj::<Resource>::new_alloc().unwrap();
    let texture_id = texture.instance_id();
    assert_eq!(gdbridge_mock::refcount(texture_id), Some(1));

    let (holder, instance) = Instance::<Holder>::new_alloc().unwrap();
    instance.with_mut(|h| h.texture = Some(texture.clone())).unwrap();
    assert_eq!(gdbridge_mock::refcount(texture_id), Some(2));

    // Looking the instance up again does not touch engine counts.
    let again = Instance::<Holder>::of(&holder).unwrap();
    assert!(again.ptr_eq(&instance));
    assert_eq!(gdbridge_mock::refcount(texture_id), Some(2));

    drop((again, instance));
    holder.free().unwrap();
    assert_eq!(gdbridge_mock::refcount(texture_id), Some(1));
    drop(texture);
    assert!(!gdbridge_mock::is_alive(texture_id));
}

#[test]
fn teardown_runs_the_hook_before_releasing_references() {
    setup();
    let texture = Obj::<Resource>::new_alloc().unwrap();
    let texture_id = texture.instance_id();
    let id = gdbridge_mock::construct("Holder").unwrap();
    let address = gdbridge_mock::object_by_id(id).unwrap();
    common::node_instance::<Holder>(id)
        .with_mut(|h| h.texture = Some(texture))
        .unwrap();

    assert!(gdbridge_mock::destroy(id));
    assert_eq!(
        events_of(id),
        [
            "on_free: texture refs Some(1), bound true".to_string(),
            "cleared: texture refs None".to_string(),
        ]
    );
    assert!(handles().binding(address as gdbridge::sys::GDExtensionConstObjectPtr).is_none());
    assert!(!gdbridge_mock::is_alive(texture_id));
}

#[test]
fn exported_resources_live_until_teardown_finishes() {
    setup();
    let cover = Obj::<Resource>::new_alloc().unwrap();
    let cover_id = cover.instance_id();
    let id = gdbridge_mock::construct("Gallery").unwrap();

    assert!(gdbridge_mock::set_property(id, "cover", &Arg::Object(cover_id)));
    assert_eq!(gdbridge_mock::refcount(cover_id), Some(2));
    assert_eq!(gdbridge_mock::get_property(id, "cover"), Some(Arg::Object(cover_id)));
    assert_eq!(gdbridge_mock::refcount(cover_id), Some(2));

    // The field alone keeps the resource alive.
    drop(cover);
    assert_eq!(gdbridge_mock::refcount(cover_id), Some(1));

    assert!(gdbridge_mock::destroy(id));
    assert_eq!(events_of(id), ["on_free: cover refs Some(1)".to_string()]);
    assert!(!gdbridge_mock::is_alive(cover_id));
}

#[test]
fn object_arguments_leave_reference_counts_unchanged() {
    setup();
    let id = gdbridge_mock::construct("Inspector").unwrap();
    let resource = Obj::<Resource>::new_alloc().unwrap();
    let resource_id = resource.instance_id();
    assert_eq!(gdbridge_mock::refcount(resource_id), Some(1));

    let weighed = gdbridge_mock::call_method(id, "weigh", &[Arg::Object(resource_id)]);
    assert_eq!(weighed, Ok(Arg::Int(resource_id as i64)));
    assert_eq!(gdbridge_mock::refcount(resource_id), Some(1));

    let address = resource.sys() as usize;
    let args = [&address as *const usize as *const c_void];
    let mut ret = 0i64;
    assert!(gdbridge_mock::ptrcall_method(id, "weigh", &args, &mut ret as *mut i64 as *mut c_void));
    assert_eq!(ret, resource_id as i64);
    assert_eq!(gdbridge_mock::refcount(resource_id), Some(1));

    let event = Obj::<InputEvent>::new_alloc().unwrap();
    let event_id = event.instance_id();
    let address = event.sys() as usize;
    let args = [&address as *const usize as *const c_void];
    assert!(gdbridge_mock::call_virtual(id, "_input", &args, ptr::null_mut()));
    assert_eq!(gdbridge_mock::get_property(id, "last_event"), Some(Arg::Int(event_id as i64)));
    assert_eq!(gdbridge_mock::refcount(event_id), Some(1));

    drop((resource, event));
    assert!(!gdbridge_mock::is_alive(resource_id));
    assert!(!gdbridge_mock::is_alive(event_id));
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn freeing_an_instance_from_inside_its_own_call_tears_down_once() {
    setup();
    let id = gdbridge_mock::construct("Fuse").unwrap();
    assert_eq!(gdbridge_mock::call_method(id, "blow", &[]), Ok(Arg::Nil));
    assert!(!gdbridge_mock::is_alive(id));
    assert_eq!(events_of(id), ["on_free".to_string()]);

    let id = gdbridge_mock::construct("Fuse").unwrap();
    let instance = common::node_instance::<Fuse>(id);
    instance.with_mut(Fuse::blow).unwrap();
    assert!(!gdbridge_mock::is_alive(id));
    assert_eq!(events_of(id), ["on_free".to_string()]);
    assert!(matches!(instance.with(|_| ()), Err(BridgeError::StaleHandle { .. })));
}

#[test]
fn dying_objects_cannot_be_referenced_again() {
    setup();
    let id = gdbridge_mock::construct("Ticket").unwrap();
    assert!(gdbridge_mock::destroy(id));
    assert_eq!(events_of(id), ["on_free: revived false".to_string()]);
    assert!(!gdbridge_mock::is_alive(id));
}
