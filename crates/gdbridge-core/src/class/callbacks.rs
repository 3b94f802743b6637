//! `extern "C"` callbacks handed to the engine for every extension class.
//!
//! Each callback is monomorphized for its host type. None of them lets a
//! panic or an error cross the ABI boundary: both are logged and the engine
//! receives the callback's neutral answer (false, null, an empty list or a
//! default return value). Once the interface is unloaded every callback
//! returns that neutral answer without touching host state.

use std::ffi::c_void;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use gdbridge_sys as sys;
use rustc_hash::FxHashMap;

use crate::builtin::{self, Container, GString, StringName};
use crate::classes::engine::is_editor_hint;
use crate::classes::{EngineClass, RefCountKind};
use crate::config::config;
use crate::error::{BridgeError, BridgeResult, CallError, CallErrorKind};
use crate::handle::{handles, HandleOwnership};
use crate::interface::{interface, is_loaded};
use crate::marshal::PtrValue;
use crate::obj::Base;
use crate::panic;
use crate::variant::{Variant, VariantType};

use super::builder::{HostMethod, VirtualEntry};
use super::instance::InstanceStorage;
use super::property::{PropertyDescriptor, SysPropertyList};
use super::registry::{self, ClassRecord};
use super::signal::SignalBinder;
use super::{ClassFlags, ExtensionClass};

/// Runs `f` unless the interface is gone, containing panics and errors.
fn contained<R>(callback: &'static str, class: &'static str, neutral: R, f: impl FnOnce() -> BridgeResult<R>) -> R {
    if !is_loaded() {
        return neutral;
    }
    match panic::catch(f) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            log::error!("{}::{} failed: {}", class, callback, err);
            neutral
        }
        Err(report) => {
            log::error!("{}::{} panicked: {}", class, callback, report);
            neutral
        }
    }
}

fn storage_of<H: ExtensionClass>(instance: sys::GDExtensionClassInstancePtr) -> Option<Arc<InstanceStorage<H>>> {
    handles().lookup_as::<InstanceStorage<H>>(instance as sys::GDExtensionConstObjectPtr)
}

/// True when user code of `H` must stay silent because the engine runs as an editor.
fn suppressed<H: ExtensionClass>() -> bool {
    if H::FLAGS.contains(ClassFlags::TOOL) || config().editor_runs_user_code {
        return false;
    }
    match is_editor_hint() {
        Ok(hint) => hint,
        Err(err) => {
            log::warn!("cannot query the editor hint: {}", err);
            false
        }
    }
}

unsafe fn name_of(name: sys::GDExtensionConstStringNamePtr) -> BridgeResult<String> {
    unsafe { StringName::borrowed(name) }.to_rust_string()
}

/// Callback table for `H`, pointing back at its record.
pub(crate) fn creation_info<H: ExtensionClass>(record: &'static ClassRecord) -> sys::GDExtensionClassCreationInfo {
    sys::GDExtensionClassCreationInfo {
        is_virtual: u8::from(record.flags.contains(ClassFlags::VIRTUAL)),
        is_abstract: u8::from(record.flags.contains(ClassFlags::ABSTRACT)),
        is_exposed: u8::from(record.flags.contains(ClassFlags::EXPOSED)),
        set_func: Some(set::<H>),
        get_func: Some(get::<H>),
        get_property_list_func: Some(get_property_list::<H>),
        free_property_list_func: Some(free_property_list),
        property_can_revert_func: Some(property_can_revert::<H>),
        property_get_revert_func: Some(property_get_revert::<H>),
        validate_property_func: Some(validate_property::<H>),
        notification_func: Some(notification::<H>),
        to_string_func: Some(to_string::<H>),
        reference_func: Some(reference),
        unreference_func: Some(unreference),
        create_instance_func: Some(create_instance::<H>),
        free_instance_func: Some(free_instance::<H>),
        get_virtual_call_data_func: Some(get_virtual_call_data::<H>),
        call_virtual_with_data_func: Some(call_virtual_with_data::<H>),
        get_rid_func: Some(get_rid::<H>),
        class_userdata: record as *const ClassRecord as *mut c_void,
    }
}

// ============================================================================
// Construction and destruction
// ============================================================================

unsafe extern "C" fn create_instance<H: ExtensionClass>(userdata: *mut c_void) -> sys::GDExtensionObjectPtr {
    contained("create_instance", H::CLASS_NAME, ptr::null_mut(), || {
        let Some(record) = (unsafe { ClassRecord::from_userdata(userdata) }) else {
            return Ok(ptr::null_mut());
        };
        let table = interface()?;
        let object = unsafe { (table.classdb_construct_object)(record.parent_token.sys()) };
        if object.is_null() {
            return Err(BridgeError::InvalidClass {
                class: H::CLASS_NAME.to_string(),
                reason: format!("the engine did not construct the parent {}", record.parent),
            });
        }

        match panic::catch(|| bind_instance::<H>(record, object)) {
            Ok(Ok(())) => Ok(object),
            Ok(Err(err)) => {
                unsafe { discard_instance::<H>(object) };
                Err(err)
            }
            Err(report) => {
                unsafe { discard_instance::<H>(object) };
                log::error!("{}::create_instance panicked: {}", H::CLASS_NAME, report);
                Ok(ptr::null_mut())
            }
        }
    })
}

/// Undoes a construction that failed half-way: drops whatever host state
/// exists, unbinds the object and destroys it.
unsafe fn discard_instance<H: ExtensionClass>(object: sys::GDExtensionObjectPtr) {
    if let Some(storage) = handles().lookup_as::<InstanceStorage<H>>(object) {
        storage.discard();
    }
    handles().release(object);
    match interface() {
        Ok(table) => unsafe { (table.object_destroy)(object) },
        Err(err) => log::error!("cannot destroy a half-built {}: {}", H::CLASS_NAME, err),
    }
}

fn bind_instance<H: ExtensionClass>(record: &'static ClassRecord, object: sys::GDExtensionObjectPtr) -> BridgeResult<()> {
    let table = interface()?;
    let instance_id = unsafe { (table.object_get_instance_id)(object) };
    let storage = Arc::new(InstanceStorage::<H>::new(object, instance_id));
    let ownership = match <H::Base as EngineClass>::REFCOUNT {
        RefCountKind::Always => HandleOwnership::Shared,
        _ => HandleOwnership::EngineOwned,
    };
    handles().bind(object, storage.clone(), ownership, record.level)?;
    // The instance pointer the engine passes back is the object itself.
    unsafe { (table.object_set_instance)(object, record.name_token.sys(), object) };

    let mut value = H::create(unsafe { Base::from_sys(object) });
    let mut binder = SignalBinder::new(object);
    value.bind_signals(&mut binder);
    *storage.signal_tasks.lock()? = binder.tasks;

    let mut guard = storage.try_lock()?;
    let value = guard.insert(value);
    if let Err(err) = value.assert_children() {
        log::error!("{}: cannot assert children: {}", H::CLASS_NAME, err);
    }
    value.on_create();
    log::trace!("created {} #{}", H::CLASS_NAME, instance_id);
    Ok(())
}

unsafe extern "C" fn free_instance<H: ExtensionClass>(
    _userdata: *mut c_void,
    instance: sys::GDExtensionClassInstancePtr,
) {
    contained("free_instance", H::CLASS_NAME, (), || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(());
        };
        // Runs `on_free` now, or when a callback further up the stack
        // releases the instance.
        storage.request_free();
        handles().release(instance as sys::GDExtensionConstObjectPtr);
        log::trace!("freed {} #{}", H::CLASS_NAME, storage.instance_id);
        Ok(())
    })
}

// ============================================================================
// Properties
// ============================================================================

unsafe extern "C" fn set<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    value: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionBool {
    contained("set", H::CLASS_NAME, 0, || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(0);
        };
        let name = unsafe { name_of(name)? };
        let value = unsafe { Variant::borrow_sys(value) };
        let mut guard = storage.try_lock()?;
        let Some(host) = guard.as_mut() else {
            return Ok(0);
        };
        if host.set_property(&name, value) {
            return Ok(1);
        }
        Ok(u8::from(host.set_field(&name, value)?))
    })
}

unsafe extern "C" fn get<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    contained("get", H::CLASS_NAME, 0, || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(0);
        };
        let name = unsafe { name_of(name)? };
        let guard = storage.try_lock()?;
        let Some(host) = guard.as_ref() else {
            return Ok(0);
        };
        match host.get_property(&name).or_else(|| host.get_field(&name)) {
            Some(value) => {
                unsafe { value.move_into_sys(ret) };
                Ok(1)
            }
            None => Ok(0),
        }
    })
}

/// Lists handed to the engine, keyed by address, until it frees them.
fn property_lists() -> MutexGuard<'static, FxHashMap<usize, Box<SysPropertyList>>> {
    static LISTS: OnceLock<Mutex<FxHashMap<usize, Box<SysPropertyList>>>> = OnceLock::new();
    let lists = LISTS.get_or_init(|| Mutex::new(FxHashMap::default()));
    match lists.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

unsafe extern "C" fn get_property_list<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    count: *mut u32,
) -> *const sys::GDExtensionPropertyInfo {
    if !count.is_null() {
        unsafe { *count = 0 };
    }
    contained("get_property_list", H::CLASS_NAME, ptr::null(), || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(ptr::null());
        };
        let custom = {
            let guard = storage.try_lock()?;
            guard.as_ref().and_then(|host| host.property_list())
        };
        let descriptors = match custom {
            Some(descriptors) => descriptors,
            None => match registry::find(H::CLASS_NAME) {
                Some(record) => record.meta.properties.iter().map(PropertyDescriptor::from).collect(),
                None => Vec::new(),
            },
        };
        if descriptors.is_empty() {
            return Ok(ptr::null());
        }

        let list = Box::new(SysPropertyList::new(&descriptors));
        let first = list.as_ptr();
        if !count.is_null() {
            unsafe { *count = list.len() as u32 };
        }
        property_lists().insert(first as usize, list);
        Ok(first)
    })
}

unsafe extern "C" fn free_property_list(
    _instance: sys::GDExtensionClassInstancePtr,
    list: *const sys::GDExtensionPropertyInfo,
    _count: u32,
) {
    if list.is_null() {
        return;
    }
    if property_lists().remove(&(list as usize)).is_none() {
        log::warn!("engine freed an unknown property list {:p}", list);
    }
}

unsafe extern "C" fn property_can_revert<H: ExtensionClass>(
    _instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionBool {
    contained("property_can_revert", H::CLASS_NAME, 0, || {
        let name = unsafe { name_of(name)? };
        Ok(u8::from(H::field_default(&name).is_some()))
    })
}

unsafe extern "C" fn property_get_revert<H: ExtensionClass>(
    _instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    contained("property_get_revert", H::CLASS_NAME, 0, || {
        let name = unsafe { name_of(name)? };
        match H::field_default(&name) {
            Some(value) => {
                unsafe { value.move_into_sys(ret) };
                Ok(1)
            }
            None => Ok(0),
        }
    })
}

unsafe extern "C" fn validate_property<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    property: *mut sys::GDExtensionPropertyInfo,
) -> sys::GDExtensionBool {
    contained("validate_property", H::CLASS_NAME, 0, || {
        let (Some(storage), Some(property)) = (storage_of::<H>(instance), unsafe { property.as_mut() }) else {
            return Ok(0);
        };
        let mut descriptor = unsafe { PropertyDescriptor::from_sys(property) };
        let guard = storage.try_lock()?;
        let Some(host) = guard.as_ref() else {
            return Ok(0);
        };
        if !host.validate_property(&mut descriptor) {
            return Ok(0);
        }
        unsafe { descriptor.write_back(property) };
        Ok(1)
    })
}

// ============================================================================
// Notifications and misc
// ============================================================================

unsafe extern "C" fn notification<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    what: i32,
    _reversed: sys::GDExtensionBool,
) {
    contained("notification", H::CLASS_NAME, (), || {
        if suppressed::<H>() {
            return Ok(());
        }
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(());
        };
        let mut guard = storage.try_lock()?;
        if let Some(host) = guard.as_mut() {
            host.on_notification(what);
        }
        Ok(())
    })
}

unsafe extern "C" fn to_string<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    is_valid: *mut sys::GDExtensionBool,
    out: sys::GDExtensionStringPtr,
) {
    if !is_valid.is_null() {
        unsafe { *is_valid = 0 };
    }
    contained("to_string", H::CLASS_NAME, (), || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(());
        };
        let text = {
            let guard = storage.try_lock()?;
            guard.as_ref().and_then(|host| host.to_string())
        };
        let Some(text) = text else {
            return Ok(());
        };
        // `out` holds a live string that is replaced.
        unsafe {
            builtin::destroy(VariantType::String, out);
            GString::from(text.as_str()).write_ret(out)?;
        }
        if !is_valid.is_null() {
            unsafe { *is_valid = 1 };
        }
        Ok(())
    })
}

// Reference counts of refcounted extension objects are kept by the engine
// and mirrored by `Obj`; nothing to do per instance.
unsafe extern "C" fn reference(_instance: sys::GDExtensionClassInstancePtr) {}

unsafe extern "C" fn unreference(_instance: sys::GDExtensionClassInstancePtr) {}

unsafe extern "C" fn get_rid<H: ExtensionClass>(instance: sys::GDExtensionClassInstancePtr) -> u64 {
    contained("get_rid", H::CLASS_NAME, 0, || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(0);
        };
        let guard = storage.try_lock()?;
        Ok(guard.as_ref().map_or(0, |host| host.get_rid().0))
    })
}

// ============================================================================
// Virtuals
// ============================================================================

unsafe extern "C" fn get_virtual_call_data<H: ExtensionClass>(
    userdata: *mut c_void,
    name: sys::GDExtensionConstStringNamePtr,
) -> *mut c_void {
    contained("get_virtual_call_data", H::CLASS_NAME, ptr::null_mut(), || {
        let Some(record) = (unsafe { ClassRecord::from_userdata(userdata) }) else {
            return Ok(ptr::null_mut());
        };
        if suppressed::<H>() {
            return Ok(ptr::null_mut());
        }
        let name = unsafe { name_of(name)? };
        let entry = record
            .tables::<H>()
            .and_then(|tables| tables.virtuals.iter().find(|entry| entry.engine_name == name));
        Ok(entry.map_or(ptr::null_mut(), |entry| {
            &**entry as *const VirtualEntry<H> as *mut c_void
        }))
    })
}

unsafe extern "C" fn call_virtual_with_data<H: ExtensionClass>(
    instance: sys::GDExtensionClassInstancePtr,
    _name: sys::GDExtensionConstStringNamePtr,
    data: *mut c_void,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let Some(entry) = (unsafe { (data as *const VirtualEntry<H>).as_ref() }) else {
        return;
    };
    let method = &entry.method;
    let completed = contained(entry.engine_name, H::CLASS_NAME, false, || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(false);
        };
        let mut guard = storage.try_lock()?;
        let Some(host) = guard.as_mut() else {
            return Ok(false);
        };
        match panic::catch(|| (method.ptrcall)(host, args, ret)) {
            Ok(result) => result.map(|()| true),
            Err(report) => {
                log::error!(
                    "{} panicked while overriding {}::{} at {}: {}",
                    method.host_name,
                    H::CLASS_NAME,
                    entry.engine_name,
                    report.location(),
                    report.message
                );
                Ok(false)
            }
        }
    });
    if !completed && !ret.is_null() {
        unsafe { (method.write_default)(ret) };
    }
}

// ============================================================================
// Registered methods
// ============================================================================

pub(crate) unsafe extern "C" fn method_call<H: ExtensionClass>(
    userdata: *mut c_void,
    instance: sys::GDExtensionClassInstancePtr,
    args: *const sys::GDExtensionConstVariantPtr,
    argc: sys::GDExtensionInt,
    ret: sys::GDExtensionVariantPtr,
    error: *mut sys::GDExtensionCallError,
) {
    let Some(method) = (unsafe { (userdata as *const HostMethod<H>).as_ref() }) else {
        return;
    };
    let outcome = contained(method.name, H::CLASS_NAME, None, || {
        let args: Vec<&Variant> = (0..argc.max(0) as usize)
            .map(|index| unsafe { Variant::borrow_sys(*args.add(index)) })
            .collect();
        let failure = |kind| CallError {
            method: method.name.to_string(),
            kind,
            argument: 0,
            expected: 0,
        };
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(Some(Err(failure(CallErrorKind::InstanceIsNull))));
        };
        let mut guard = storage.try_lock()?;
        let Some(host) = guard.as_mut() else {
            return Ok(Some(Err(failure(CallErrorKind::InstanceIsNull))));
        };
        Ok(Some((method.varcall)(host, &args)))
    });

    let result = match outcome {
        Some(Ok(value)) => value,
        Some(Err(call_error)) => {
            if let Some(error) = unsafe { error.as_mut() } {
                call_error.write_sys(error);
            }
            Variant::nil()
        }
        None => {
            if let Some(error) = unsafe { error.as_mut() } {
                error.error = sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD;
            }
            Variant::nil()
        }
    };
    if !ret.is_null() {
        unsafe { result.move_into_sys(ret) };
    }
}

pub(crate) unsafe extern "C" fn method_ptrcall<H: ExtensionClass>(
    userdata: *mut c_void,
    instance: sys::GDExtensionClassInstancePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let Some(method) = (unsafe { (userdata as *const HostMethod<H>).as_ref() }) else {
        return;
    };
    let completed = contained(method.name, H::CLASS_NAME, false, || {
        let Some(storage) = storage_of::<H>(instance) else {
            return Ok(false);
        };
        let mut guard = storage.try_lock()?;
        let Some(host) = guard.as_mut() else {
            return Ok(false);
        };
        (method.ptrcall)(host, args, ret).map(|()| true)
    });
    if !completed && !ret.is_null() {
        unsafe { (method.write_default)(ret) };
    }
}
