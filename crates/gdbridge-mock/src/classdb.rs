//! Class database and the engine methods the bridge binds.

use std::ffi::{c_char, c_void, CStr};
use std::ptr;

use gdbridge_sys as sys;
use rustc_hash::FxHashMap;

use crate::containers::{read_text, write_token, Data};
use crate::engine::{engine, Callbacks, ExtensionInfo, MethodRecord, PropertyRecord};
use crate::objects::{adjust_refcount, attach, find_node, notify};
use crate::variant::{arg_ptr, int_slot, Slot};
use crate::Arg;

/// Engine methods reachable through `classdb_get_method_bind`. A bind is
/// its index plus one.
const METHOD_BINDS: [(&str, &str); 13] = [
    ("Object", "get_class"),
    ("Object", "get_instance_id"),
    ("Object", "notification"),
    ("Object", "emit_signal"),
    ("RefCounted", "reference"),
    ("RefCounted", "unreference"),
    ("RefCounted", "get_reference_count"),
    ("Node", "add_child"),
    ("Node", "get_node_or_null"),
    ("Node", "set_name"),
    ("Node", "get_name"),
    ("Node", "get_child_count"),
    ("Engine", "is_editor_hint"),
];

fn method_of(bind: sys::GDExtensionMethodBindPtr) -> Option<&'static str> {
    let index = (bind as usize).checked_sub(1)?;
    METHOD_BINDS.get(index).map(|(_, method)| *method)
}

pub(crate) unsafe fn read_property(info: &sys::GDExtensionPropertyInfo) -> PropertyRecord {
    unsafe {
        PropertyRecord {
            name: read_text(info.name),
            variant_type: info.type_,
            class_name: read_text(info.class_name),
            hint: info.hint,
            hint_string: read_text(info.hint_string),
            usage: info.usage,
        }
    }
}

unsafe fn read_properties(list: *const sys::GDExtensionPropertyInfo, count: usize) -> Vec<PropertyRecord> {
    if list.is_null() {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(list, count) }
        .iter()
        .map(|info| unsafe { read_property(info) })
        .collect()
}

unsafe fn c_text(text: *const c_char) -> String {
    if text.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

// ============================================================================
// Console
// ============================================================================

pub(crate) unsafe extern "C" fn print_error(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
    _notify: sys::GDExtensionBool,
) {
    let text = unsafe { c_text(description) };
    engine().errors.push(text);
}

pub(crate) unsafe extern "C" fn print_warning(
    description: *const c_char,
    _function: *const c_char,
    _file: *const c_char,
    _line: i32,
    _notify: sys::GDExtensionBool,
) {
    let text = unsafe { c_text(description) };
    engine().warnings.push(text);
}

// ============================================================================
// Class database
// ============================================================================

enum Construction {
    Builtin,
    Extension(Callbacks),
    Refused,
}

pub(crate) unsafe extern "C" fn classdb_construct_object(
    class: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionObjectPtr {
    let class = unsafe { read_text(class) };
    let plan = {
        let engine = engine();
        match engine.classes.get(&class) {
            None => Construction::Refused,
            Some(info) => match &info.extension {
                Some(extension) if extension.callbacks.0.is_abstract != 0 => Construction::Refused,
                Some(extension) => Construction::Extension(extension.callbacks),
                None if engine.singletons.contains_key(&class) => Construction::Refused,
                None => Construction::Builtin,
            },
        }
    };
    match plan {
        Construction::Builtin => engine().alloc_object(&class) as sys::GDExtensionObjectPtr,
        Construction::Extension(callbacks) => match callbacks.0.create_instance_func {
            Some(create) => unsafe { create(callbacks.userdata()) },
            None => ptr::null_mut(),
        },
        Construction::Refused => ptr::null_mut(),
    }
}

pub(crate) unsafe extern "C" fn classdb_get_method_bind(
    class: sys::GDExtensionConstStringNamePtr,
    method: sys::GDExtensionConstStringNamePtr,
    _hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr {
    let (class, method) = unsafe { (read_text(class), read_text(method)) };
    METHOD_BINDS
        .iter()
        .position(|(c, m)| *c == class && *m == method)
        .map_or(ptr::null(), |index| (index + 1) as sys::GDExtensionMethodBindPtr)
}

pub(crate) unsafe extern "C" fn classdb_get_class_tag(class: sys::GDExtensionConstStringNamePtr) -> *mut c_void {
    let class = unsafe { read_text(class) };
    engine()
        .classes
        .get(&class)
        .map_or(ptr::null_mut(), |info| info.tag as *mut c_void)
}

pub(crate) unsafe extern "C" fn classdb_register_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class: sys::GDExtensionConstStringNamePtr,
    parent: sys::GDExtensionConstStringNamePtr,
    info: *const sys::GDExtensionClassCreationInfo,
) {
    let (class, parent) = unsafe { (read_text(class), read_text(parent)) };
    let mut engine = engine();
    if engine.classes.contains_key(&class) {
        engine.errors.push(format!("class '{}' is already registered", class));
        return;
    }
    if !engine.classes.contains_key(&parent) {
        engine.errors.push(format!("parent '{}' of '{}' does not exist", parent, class));
        return;
    }
    let Some(info) = (unsafe { info.as_ref() }) else {
        return;
    };
    let extension = ExtensionInfo {
        callbacks: Callbacks(*info),
        methods: FxHashMap::default(),
        signals: FxHashMap::default(),
    };
    engine.add_class(&class, Some(parent), Some(extension));
}

pub(crate) unsafe extern "C" fn classdb_register_extension_class_method(
    _library: sys::GDExtensionClassLibraryPtr,
    class: sys::GDExtensionConstStringNamePtr,
    info: *const sys::GDExtensionClassMethodInfo,
) {
    let class = unsafe { read_text(class) };
    let Some(info) = (unsafe { info.as_ref() }) else {
        return;
    };
    let name = unsafe { read_text(info.name) };
    let record = unsafe {
        MethodRecord {
            userdata: info.method_userdata as usize,
            call: info.call_func,
            ptrcall: info.ptrcall_func,
            flags: info.method_flags,
            arguments: read_properties(info.arguments_info, info.argument_count as usize),
            return_value: match (info.has_return_value, info.return_value_info.as_ref()) {
                (0, _) | (_, None) => None,
                (_, Some(ret)) => Some(read_property(ret)),
            },
        }
    };
    let mut engine = engine();
    match engine.classes.get_mut(&class).and_then(|c| c.extension.as_mut()) {
        Some(extension) => {
            extension.methods.insert(name, record);
        }
        None => engine.errors.push(format!("cannot add method '{}' to unknown class '{}'", name, class)),
    }
}

pub(crate) unsafe extern "C" fn classdb_register_extension_class_signal(
    _library: sys::GDExtensionClassLibraryPtr,
    class: sys::GDExtensionConstStringNamePtr,
    signal: sys::GDExtensionConstStringNamePtr,
    arguments: *const sys::GDExtensionPropertyInfo,
    count: sys::GDExtensionInt,
) {
    let (class, signal) = unsafe { (read_text(class), read_text(signal)) };
    let arguments = unsafe { read_properties(arguments, count.max(0) as usize) };
    let mut engine = engine();
    match engine.classes.get_mut(&class).and_then(|c| c.extension.as_mut()) {
        Some(extension) => {
            extension.signals.insert(signal, arguments);
        }
        None => engine.errors.push(format!("cannot add signal '{}' to unknown class '{}'", signal, class)),
    }
}

pub(crate) unsafe extern "C" fn classdb_unregister_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class: sys::GDExtensionConstStringNamePtr,
) {
    let class = unsafe { read_text(class) };
    let mut engine = engine();
    let is_extension = engine.classes.get(&class).is_some_and(|info| info.extension.is_some());
    if is_extension {
        engine.classes.remove(&class);
    } else {
        engine.errors.push(format!("class '{}' is not an extension class", class));
    }
}

// ============================================================================
// Engine method binds
// ============================================================================

unsafe fn write_ret<T>(ret: sys::GDExtensionTypePtr, value: T) {
    if !ret.is_null() {
        unsafe { ptr::write(ret as *mut T, value) };
    }
}

pub(crate) unsafe extern "C" fn object_method_bind_ptrcall(
    bind: sys::GDExtensionMethodBindPtr,
    object: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let Some(method) = method_of(bind) else {
        return;
    };
    let address = object as usize;
    unsafe {
        match method {
            "get_class" => {
                let class = engine().objects.get(&address).map(|o| o.class.clone()).unwrap_or_default();
                write_token(ret, Data::from_text(&class));
            }
            "get_instance_id" => {
                let id = engine().objects.get(&address).map_or(0, |o| o.id);
                write_ret(ret, id as i64);
            }
            "notification" => {
                let what = ptr::read(arg_ptr(args, 0) as *const i64) as i32;
                let reversed = ptr::read(arg_ptr(args, 1) as *const u8) != 0;
                notify(address, what, reversed);
            }
            "reference" => {
                // An object under destruction cannot be revived.
                let dying = engine().objects.get(&address).is_none_or(|o| o.dying);
                let counted = !dying && matches!(adjust_refcount(address, None, 1), Some((_, Some(_))));
                write_ret(ret, counted as u8);
            }
            "unreference" => {
                let died = matches!(adjust_refcount(address, None, -1), Some((_, Some(count))) if count <= 0);
                write_ret(ret, died as u8);
            }
            "get_reference_count" => {
                let count = engine().objects.get(&address).and_then(|o| o.refcount).unwrap_or(0);
                write_ret(ret, count);
            }
            "add_child" => {
                let child = ptr::read(arg_ptr(args, 0) as *const usize);
                attach(address, child);
            }
            "get_node_or_null" => {
                let path = read_text(arg_ptr(args, 0));
                write_ret(ret, find_node(address, &path).unwrap_or(0));
            }
            "set_name" => {
                let name = read_text(arg_ptr(args, 0));
                if let Some(object) = engine().objects.get_mut(&address) {
                    object.name = name;
                }
            }
            "get_name" => {
                let name = engine().objects.get(&address).map(|o| o.name.clone()).unwrap_or_default();
                write_token(ret, Data::Name(name));
            }
            "get_child_count" => {
                let count = engine().objects.get(&address).map_or(0, |o| o.children.len());
                write_ret(ret, count as i64);
            }
            "is_editor_hint" => {
                let hint = engine().editor_hint;
                write_ret(ret, hint as u8);
            }
            _ => {}
        }
    }
}

pub(crate) unsafe extern "C" fn object_method_bind_call(
    bind: sys::GDExtensionMethodBindPtr,
    object: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstVariantPtr,
    argc: sys::GDExtensionInt,
    ret: sys::GDExtensionUninitializedVariantPtr,
    error: *mut sys::GDExtensionCallError,
) {
    unsafe {
        ptr::write(ret as *mut Slot, Slot::default());
        *error = sys::GDExtensionCallError::default();
    }
    let fail = |kind: sys::GDExtensionCallErrorType, argument: i32, expected: i32| unsafe {
        *error = sys::GDExtensionCallError {
            error: kind,
            argument,
            expected,
        };
    };
    if method_of(bind) != Some("emit_signal") {
        return fail(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD, 0, 0);
    }
    if argc < 1 {
        return fail(sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS, 0, 1);
    }
    let slots: Vec<&Slot> = (0..argc as usize)
        .map(|i| unsafe { &*(*args.add(i) as *const Slot) })
        .collect();
    let signal = match slots[0].tag {
        sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME | sys::GDEXTENSION_VARIANT_TYPE_STRING => unsafe {
            read_text(slots[0].payload.as_ptr().cast())
        },
        _ => {
            return fail(
                sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT,
                0,
                sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME as i32,
            )
        }
    };

    let receivers = {
        let engine = engine();
        let Some(data) = engine.objects.get(&(object as usize)) else {
            return fail(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL, 0, 0);
        };
        if !engine.declares_signal(&data.class, &signal) {
            return fail(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD, 0, 0);
        }
        data.receivers.get(&signal).cloned().unwrap_or_default()
    };
    let values: Vec<Arg> = slots[1..].iter().map(|slot| Arg::from_slot(slot)).collect();
    for receiver in receivers {
        receiver(&values);
    }
    unsafe { ptr::write(ret as *mut Slot, int_slot(0)) };
}
