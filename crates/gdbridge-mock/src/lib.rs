//! In-process stand-in for the engine side of the extension interface.
//!
//! The mock serves every interface function the bridge resolves, keeps an
//! object database and a class database, and drives a library through its
//! entry point the way the engine does: load, initialize every level from
//! the library's minimum up to the editor level, and deinitialize in reverse
//! on unload.
//!
//! The harness functions at the bottom play the engine's role in tests:
//! constructing registered classes, reading and writing properties, calling
//! methods and virtuals, sending notifications and observing signals.

use std::ffi::{c_char, c_void, CStr};
use std::ptr;
use std::sync::{Arc, Mutex, PoisonError};

use gdbridge_sys as sys;

mod classdb;
mod containers;
mod engine;
mod objects;
mod variant;

use classdb::*;
use containers::*;
use objects::*;
use variant::*;

pub use containers::live_containers;
pub use engine::PropertyRecord;

use engine::engine;

/// A variant as the harness sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// String, string name or node path.
    Text(String),
    /// Object by instance id.
    Object(u64),
    /// Any other type, by variant tag.
    Other(u32),
}

impl Arg {
    pub(crate) fn from_slot(slot: &Slot) -> Arg {
        match slot.tag {
            sys::GDEXTENSION_VARIANT_TYPE_NIL => Arg::Nil,
            sys::GDEXTENSION_VARIANT_TYPE_BOOL => Arg::Bool(slot.payload[0] & 0xff != 0),
            sys::GDEXTENSION_VARIANT_TYPE_INT => Arg::Int(slot.payload[0] as i64),
            sys::GDEXTENSION_VARIANT_TYPE_FLOAT => Arg::Float(f64::from_bits(slot.payload[0])),
            sys::GDEXTENSION_VARIANT_TYPE_STRING
            | sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME
            | sys::GDEXTENSION_VARIANT_TYPE_NODE_PATH => {
                Arg::Text(unsafe { read_text(slot.payload.as_ptr().cast()) })
            }
            sys::GDEXTENSION_VARIANT_TYPE_OBJECT if slot.payload[0] == 0 => Arg::Nil,
            sys::GDEXTENSION_VARIANT_TYPE_OBJECT => Arg::Object(slot.payload[1]),
            other => Arg::Other(other),
        }
    }

    /// An owned variant; release it with `destroy_slot`.
    pub(crate) fn to_slot(&self) -> Slot {
        match self {
            Arg::Nil | Arg::Other(_) => Slot::default(),
            Arg::Bool(value) => bool_slot(*value),
            Arg::Int(value) => int_slot(*value),
            Arg::Float(value) => Slot {
                tag: sys::GDEXTENSION_VARIANT_TYPE_FLOAT,
                padding: 0,
                payload: [value.to_bits(), 0],
            },
            Arg::Text(text) => Slot {
                tag: sys::GDEXTENSION_VARIANT_TYPE_STRING,
                padding: 0,
                payload: [alloc(Data::from_text(text)) as u64, 0],
            },
            Arg::Object(id) => match address_of(*id).and_then(|address| Some((address, acquire(address)?))) {
                Some((address, id)) => Slot {
                    tag: sys::GDEXTENSION_VARIANT_TYPE_OBJECT,
                    padding: 0,
                    payload: [address as u64, id],
                },
                None => Slot::default(),
            },
        }
    }
}

// ============================================================================
// Interface resolution and library lifecycle
// ============================================================================

macro_rules! resolve {
    ($name:expr; $($func:ident),* $(,)?) => {
        match $name {
            $(stringify!($func) => Some(unsafe {
                std::mem::transmute::<*const (), unsafe extern "C" fn()>($func as *const ())
            }),)*
            _ => None,
        }
    };
}

unsafe extern "C" fn get_proc_address(name: *const c_char) -> sys::GDExtensionInterfaceFunctionPtr {
    if name.is_null() {
        return None;
    }
    let Ok(name) = (unsafe { CStr::from_ptr(name) }).to_str() else {
        return None;
    };
    resolve!(name;
        print_error,
        print_warning,
        variant_new_copy,
        variant_new_nil,
        variant_destroy,
        variant_evaluate,
        variant_stringify,
        get_variant_from_type_constructor,
        get_variant_to_type_constructor,
        variant_get_ptr_constructor,
        variant_get_ptr_destructor,
        variant_get_ptr_builtin_method,
        string_new_with_utf32_chars_and_len,
        string_to_utf32_chars,
        string_name_new_with_utf8_chars_and_len,
        packed_byte_array_operator_index,
        packed_int32_array_operator_index,
        packed_int64_array_operator_index,
        packed_float32_array_operator_index,
        packed_float64_array_operator_index,
        packed_string_array_operator_index,
        packed_vector2_array_operator_index,
        packed_vector3_array_operator_index,
        packed_color_array_operator_index,
        array_operator_index,
        dictionary_operator_index,
        object_method_bind_call,
        object_method_bind_ptrcall,
        object_destroy,
        global_get_singleton,
        object_set_instance,
        object_get_class_name,
        object_cast_to,
        object_get_instance_from_id,
        object_get_instance_id,
        classdb_construct_object,
        classdb_get_method_bind,
        classdb_get_class_tag,
        classdb_register_extension_class,
        classdb_register_extension_class_method,
        classdb_register_extension_class_signal,
        classdb_unregister_extension_class,
    )
}

struct Loaded(sys::GDExtensionInitialization);

// The userdata pointer is only handed back to the library that produced it.
unsafe impl Send for Loaded {}

static LOADED: Mutex<Option<Loaded>> = Mutex::new(None);

static LIBRARY_TOKEN: u8 = 0;

fn library_token() -> sys::GDExtensionClassLibraryPtr {
    ptr::addr_of!(LIBRARY_TOKEN) as sys::GDExtensionClassLibraryPtr
}

/// Loads a library through its entry point and initializes every level from
/// its minimum to the editor level. Returns false when the entry point
/// refused to load or a library is already loaded.
pub fn load_library(entry: sys::GDExtensionInitializationFunction) -> bool {
    if is_library_loaded() {
        return false;
    }
    let mut init = sys::GDExtensionInitialization {
        minimum_initialization_level: sys::GDEXTENSION_INITIALIZATION_CORE,
        userdata: ptr::null_mut(),
        initialize: None,
        deinitialize: None,
    };
    if unsafe { entry(Some(get_proc_address), library_token(), &mut init) } == 0 {
        return false;
    }
    if let Some(initialize) = init.initialize {
        for level in init.minimum_initialization_level..=sys::GDEXTENSION_INITIALIZATION_EDITOR {
            unsafe { initialize(init.userdata, level) };
        }
    }
    *LOADED.lock().unwrap_or_else(PoisonError::into_inner) = Some(Loaded(init));
    true
}

/// Deinitializes every level in reverse order. Returns false when nothing was loaded.
pub fn unload_library() -> bool {
    let loaded = LOADED.lock().unwrap_or_else(PoisonError::into_inner).take();
    let Some(Loaded(init)) = loaded else {
        return false;
    };
    if let Some(deinitialize) = init.deinitialize {
        for level in (init.minimum_initialization_level..=sys::GDEXTENSION_INITIALIZATION_EDITOR).rev() {
            unsafe { deinitialize(init.userdata, level) };
        }
    }
    true
}

pub fn is_library_loaded() -> bool {
    LOADED.lock().unwrap_or_else(PoisonError::into_inner).is_some()
}

// ============================================================================
// Harness: engine state
// ============================================================================

pub fn set_editor_hint(hint: bool) {
    engine().editor_hint = hint;
}

/// Error lines the library printed through the engine console.
pub fn printed_errors() -> Vec<String> {
    engine().errors.clone()
}

pub fn printed_warnings() -> Vec<String> {
    engine().warnings.clone()
}

pub fn is_class_registered(class: &str) -> bool {
    engine().classes.contains_key(class)
}

pub fn class_parent(class: &str) -> Option<String> {
    engine().classes.get(class)?.parent.clone()
}

/// Whether `class` was registered by an extension and asked to be abstract.
pub fn is_class_abstract(class: &str) -> bool {
    engine()
        .classes
        .get(class)
        .and_then(|info| info.extension.as_ref())
        .is_some_and(|extension| extension.callbacks.0.is_abstract != 0)
}

/// Registered method names of an extension class, sorted.
pub fn class_methods(class: &str) -> Vec<String> {
    let engine = engine();
    let mut methods: Vec<String> = engine
        .classes
        .get(class)
        .and_then(|info| info.extension.as_ref())
        .map(|extension| extension.methods.keys().cloned().collect())
        .unwrap_or_default();
    methods.sort();
    methods
}

/// Method flags, argument descriptors and return descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub flags: u32,
    pub arguments: Vec<PropertyRecord>,
    pub return_value: Option<PropertyRecord>,
}

pub fn method_signature(class: &str, method: &str) -> Option<MethodSignature> {
    let record = engine().find_method(class, method)?;
    Some(MethodSignature {
        flags: record.flags,
        arguments: record.arguments,
        return_value: record.return_value,
    })
}

/// Declared signals of an extension class with their argument descriptors, sorted by name.
pub fn class_signals(class: &str) -> Vec<(String, Vec<PropertyRecord>)> {
    let engine = engine();
    let mut signals: Vec<(String, Vec<PropertyRecord>)> = engine
        .classes
        .get(class)
        .and_then(|info| info.extension.as_ref())
        .map(|extension| extension.signals.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    signals.sort_by(|a, b| a.0.cmp(&b.0));
    signals
}

// ============================================================================
// Harness: objects
// ============================================================================

/// Constructs an object the way the engine does when a scene instantiates
/// `class`. Returns its instance id.
pub fn construct(class: &str) -> Option<u64> {
    let name = Token::name(class);
    let address = unsafe { classdb_construct_object(name.ptr()) } as usize;
    if address == 0 {
        return None;
    }
    engine().objects.get(&address).map(|object| object.id)
}

/// Frees an object. Returns false when the id is stale.
pub fn destroy(id: u64) -> bool {
    match address_of(id) {
        Some(address) => {
            destroy_object(address);
            true
        }
        None => false,
    }
}

/// Object address for an instance id.
pub fn object_by_id(id: u64) -> Option<usize> {
    address_of(id)
}

pub fn is_alive(id: u64) -> bool {
    address_of(id).is_some()
}

/// Number of objects the engine currently holds.
pub fn object_count() -> usize {
    engine().objects.len()
}

pub fn class_of(id: u64) -> Option<String> {
    let address = address_of(id)?;
    engine().objects.get(&address).map(|object| object.class.clone())
}

/// Engine reference count; `None` for objects that are not reference counted.
pub fn refcount(id: u64) -> Option<i64> {
    let address = address_of(id)?;
    engine().objects.get(&address)?.refcount
}

/// Drops one engine-held reference, freeing the object when it was the last.
pub fn unreference(id: u64) -> bool {
    match address_of(id) {
        Some(address) => {
            release(address, id);
            true
        }
        None => false,
    }
}

pub fn add_child(parent: u64, child: u64) -> bool {
    match (address_of(parent), address_of(child)) {
        (Some(parent), Some(child)) => attach(parent, child),
        _ => false,
    }
}

pub fn child_ids(id: u64) -> Vec<u64> {
    let Some(address) = address_of(id) else {
        return Vec::new();
    };
    let engine = engine();
    engine.objects.get(&address).map_or_else(Vec::new, |object| {
        object
            .children
            .iter()
            .filter_map(|child| engine.objects.get(child).map(|c| c.id))
            .collect()
    })
}

pub fn node_name(id: u64) -> Option<String> {
    let address = address_of(id)?;
    engine().objects.get(&address).map(|object| object.name.clone())
}

/// Calls `receiver` whenever the object emits `signal`.
pub fn connect(id: u64, signal: &str, receiver: impl Fn(&[Arg]) + Send + Sync + 'static) -> bool {
    let Some(address) = address_of(id) else {
        return false;
    };
    match engine().objects.get_mut(&address) {
        Some(object) => {
            object
                .receivers
                .entry(signal.to_string())
                .or_default()
                .push(Arc::new(receiver));
            true
        }
        None => false,
    }
}

pub fn notify(id: u64, what: i32) {
    if let Some(address) = address_of(id) {
        objects::notify(address, what, false);
    }
}

// ============================================================================
// Harness: extension instance callbacks
// ============================================================================

fn target(id: u64) -> Option<(engine::Callbacks, *mut c_void)> {
    let address = address_of(id)?;
    let (callbacks, instance) = engine().instance_of(address)?;
    Some((callbacks, instance as *mut c_void))
}

/// Whether the class provides an override for the virtual `method`.
pub fn has_virtual(class: &str, method: &str) -> bool {
    let callbacks = engine()
        .classes
        .get(class)
        .and_then(|info| info.extension.as_ref())
        .map(|extension| extension.callbacks);
    let Some(callbacks) = callbacks else {
        return false;
    };
    let name = Token::name(method);
    match callbacks.0.get_virtual_call_data_func {
        Some(lookup) => !unsafe { lookup(callbacks.userdata(), name.ptr()) }.is_null(),
        None => false,
    }
}

/// Calls a virtual through the pointer-call convention. Returns false when
/// the instance has no override.
pub fn call_virtual(id: u64, method: &str, args: &[*const c_void], ret: *mut c_void) -> bool {
    let Some((callbacks, instance)) = target(id) else {
        return false;
    };
    let name = Token::name(method);
    let (Some(lookup), Some(call)) = (
        callbacks.0.get_virtual_call_data_func,
        callbacks.0.call_virtual_with_data_func,
    ) else {
        return false;
    };
    unsafe {
        let data = lookup(callbacks.userdata(), name.ptr());
        if data.is_null() {
            return false;
        }
        call(instance, name.ptr(), data, args.as_ptr(), ret);
    }
    true
}

pub fn get_property(id: u64, property: &str) -> Option<Arg> {
    let (callbacks, instance) = target(id)?;
    let get = callbacks.0.get_func?;
    let name = Token::name(property);
    let mut slot = Slot::default();
    let found = unsafe { get(instance, name.ptr(), (&mut slot as *mut Slot).cast()) } != 0;
    let value = found.then(|| Arg::from_slot(&slot));
    unsafe { destroy_slot(&mut slot) };
    value
}

pub fn set_property(id: u64, property: &str, value: &Arg) -> bool {
    let Some((callbacks, instance)) = target(id) else {
        return false;
    };
    let Some(set) = callbacks.0.set_func else {
        return false;
    };
    let name = Token::name(property);
    let mut slot = value.to_slot();
    let handled = unsafe { set(instance, name.ptr(), (&slot as *const Slot).cast()) } != 0;
    unsafe { destroy_slot(&mut slot) };
    handled
}

pub fn property_list(id: u64) -> Vec<PropertyRecord> {
    let Some((callbacks, instance)) = target(id) else {
        return Vec::new();
    };
    let Some(get_list) = callbacks.0.get_property_list_func else {
        return Vec::new();
    };
    let mut count = 0u32;
    let list = unsafe { get_list(instance, &mut count) };
    if list.is_null() {
        return Vec::new();
    }
    let records = unsafe { std::slice::from_raw_parts(list, count as usize) }
        .iter()
        .map(|info| unsafe { read_property(info) })
        .collect();
    if let Some(free_list) = callbacks.0.free_property_list_func {
        unsafe { free_list(instance, list, count) };
    }
    records
}

pub fn property_can_revert(id: u64, property: &str) -> bool {
    let Some((callbacks, instance)) = target(id) else {
        return false;
    };
    let name = Token::name(property);
    callbacks
        .0
        .property_can_revert_func
        .is_some_and(|can_revert| unsafe { can_revert(instance, name.ptr()) } != 0)
}

pub fn property_get_revert(id: u64, property: &str) -> Option<Arg> {
    let (callbacks, instance) = target(id)?;
    let get_revert = callbacks.0.property_get_revert_func?;
    let name = Token::name(property);
    let mut slot = Slot::default();
    let found = unsafe { get_revert(instance, name.ptr(), (&mut slot as *mut Slot).cast()) } != 0;
    let value = found.then(|| Arg::from_slot(&slot));
    unsafe { destroy_slot(&mut slot) };
    value
}

/// Lets the instance adjust a property descriptor before the editor shows it.
/// Returns the descriptor as the instance left it.
pub fn validate_property(id: u64, property: &PropertyRecord) -> PropertyRecord {
    let Some((callbacks, instance)) = target(id) else {
        return property.clone();
    };
    let Some(validate) = callbacks.0.validate_property_func else {
        return property.clone();
    };
    let mut name = Token::name(&property.name);
    let mut class_name = Token::name(&property.class_name);
    let mut hint_string = Token::text(&property.hint_string);
    let mut info = sys::GDExtensionPropertyInfo {
        type_: property.variant_type,
        name: name.ptr_mut(),
        class_name: class_name.ptr_mut(),
        hint: property.hint,
        hint_string: hint_string.ptr_mut(),
        usage: property.usage,
    };
    unsafe { validate(instance, &mut info) };
    PropertyRecord {
        name: name.read(),
        variant_type: info.type_,
        class_name: class_name.read(),
        hint: info.hint,
        hint_string: hint_string.read(),
        usage: info.usage,
    }
}

/// The instance's own text form, when it provides one.
pub fn to_string(id: u64) -> Option<String> {
    let (callbacks, instance) = target(id)?;
    let to_string = callbacks.0.to_string_func?;
    let mut out = Token::text("");
    let mut valid = 0u8;
    unsafe { to_string(instance, &mut valid, out.ptr_mut()) };
    (valid != 0).then(|| out.read())
}

pub fn rid_of(id: u64) -> Option<u64> {
    let (callbacks, instance) = target(id)?;
    let get_rid = callbacks.0.get_rid_func?;
    Some(unsafe { get_rid(instance) })
}

/// Calls a registered method through the variant-call convention.
pub fn call_method(id: u64, method: &str, args: &[Arg]) -> Result<Arg, sys::GDExtensionCallError> {
    let instance_missing = sys::GDExtensionCallError {
        error: sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL,
        argument: 0,
        expected: 0,
    };
    let invalid_method = sys::GDExtensionCallError {
        error: sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD,
        ..instance_missing
    };
    let (_, instance) = target(id).ok_or(instance_missing)?;
    let class = class_of(id).ok_or(instance_missing)?;
    let record = engine().find_method(&class, method).ok_or(invalid_method)?;
    let call = record.call.ok_or(invalid_method)?;

    let mut slots: Vec<Slot> = args.iter().map(Arg::to_slot).collect();
    let ptrs: Vec<sys::GDExtensionConstVariantPtr> = slots.iter().map(|s| (s as *const Slot).cast()).collect();
    let mut ret = Slot::default();
    let mut error = sys::GDExtensionCallError::default();
    unsafe {
        call(
            record.userdata as *mut c_void,
            instance,
            ptrs.as_ptr(),
            ptrs.len() as i64,
            (&mut ret as *mut Slot).cast(),
            &mut error,
        );
    }
    let result = if error.error == sys::GDEXTENSION_CALL_OK {
        Ok(Arg::from_slot(&ret))
    } else {
        Err(error)
    };
    unsafe {
        destroy_slot(&mut ret);
        slots.iter_mut().for_each(|slot| destroy_slot(slot));
    }
    result
}

/// Calls a registered method through the pointer-call convention.
pub fn ptrcall_method(id: u64, method: &str, args: &[*const c_void], ret: *mut c_void) -> bool {
    let Some((_, instance)) = target(id) else {
        return false;
    };
    let Some(class) = class_of(id) else {
        return false;
    };
    let Some(record) = engine().find_method(&class, method) else {
        return false;
    };
    let Some(ptrcall) = record.ptrcall else {
        return false;
    };
    unsafe { ptrcall(record.userdata as *mut c_void, instance, args.as_ptr(), ret) };
    true
}
