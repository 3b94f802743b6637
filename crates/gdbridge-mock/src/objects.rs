//! Object database functions: lifetime, reference counts, casts and ids.

use std::ffi::c_void;
use std::ptr;

use gdbridge_sys as sys;

use crate::containers::{read_text, write_token, Data};
use crate::engine::{engine, free_object_cell, Callbacks};

/// Adds a reference to a live object. Returns its instance id.
pub(crate) fn acquire(address: usize) -> Option<u64> {
    adjust_refcount(address, None, 1).map(|(id, _)| id)
}

/// Drops a reference held by a variant, destroying the object at zero.
pub(crate) fn release(address: usize, id: u64) {
    if let Some((_, Some(0))) = adjust_refcount(address, Some(id), -1) {
        destroy_object(address);
    }
}

/// Changes the count of a reference-counted object and runs the extension's
/// reference hooks. Returns the id and the new count.
pub(crate) fn adjust_refcount(address: usize, expected: Option<u64>, delta: i64) -> Option<(u64, Option<i64>)> {
    let (id, count, hooks) = {
        let mut engine = engine();
        let object = engine.objects.get_mut(&address)?;
        if expected.is_some_and(|id| id != object.id) {
            return None;
        }
        let id = object.id;
        let dying = object.dying;
        let count = object.refcount.as_mut().map(|count| {
            *count += delta;
            *count
        });
        let hooks = match count {
            Some(_) if !dying => engine.instance_of(address),
            _ => None,
        };
        (id, count, hooks)
    };
    if let Some((callbacks, instance)) = hooks {
        let hook = if delta > 0 {
            callbacks.0.reference_func
        } else {
            callbacks.0.unreference_func
        };
        if let Some(hook) = hook {
            unsafe { hook(instance as *mut c_void) };
        }
    }
    Some((id, count))
}

pub(crate) fn is_alive(address: usize, id: u64) -> bool {
    engine().objects.get(&address).is_some_and(|object| object.id == id)
}

pub(crate) fn describe(address: usize, id: u64) -> String {
    match engine().objects.get(&address) {
        Some(object) if object.id == id => format!("<{}#{}>", object.class, object.id),
        Some(_) | None if address != 0 => "<Freed Object>".to_string(),
        _ => "<null>".to_string(),
    }
}

pub(crate) fn address_of(id: u64) -> Option<usize> {
    engine().ids.get(&id).copied()
}

/// Sends a notification to the extension instance bound to `address`.
pub(crate) fn notify(address: usize, what: i32, reversed: bool) {
    let target = engine().instance_of(address);
    if let Some((callbacks, instance)) = target {
        if let Some(notification) = callbacks.0.notification_func {
            unsafe { notification(instance as *mut c_void, what, reversed as u8) };
        }
    }
}

/// Deletes an object: predelete notification, instance release, children
/// first, then the database entry.
pub(crate) fn destroy_object(address: usize) {
    let (target, children): (Option<(Callbacks, usize)>, Vec<usize>) = {
        let mut engine = engine();
        let Some(object) = engine.objects.get_mut(&address) else {
            return;
        };
        if object.dying {
            return;
        }
        object.dying = true;
        let children = object.children.clone();
        (engine.instance_of(address), children)
    };

    if let Some((callbacks, instance)) = target {
        unsafe {
            if let Some(notification) = callbacks.0.notification_func {
                notification(instance as *mut c_void, sys::NOTIFICATION_PREDELETE, 1);
            }
            if let Some(free) = callbacks.0.free_instance_func {
                free(callbacks.userdata(), instance as *mut c_void);
            }
        }
    }
    for child in children {
        destroy_object(child);
    }

    let removed = {
        let mut engine = engine();
        let removed = engine.objects.remove(&address);
        if let Some(object) = &removed {
            engine.ids.remove(&object.id);
            if let Some(parent) = object.parent.and_then(|p| engine.objects.get_mut(&p)) {
                parent.children.retain(|child| *child != address);
            }
        }
        removed
    };
    // Receivers may own host state; drop them without the lock.
    drop(removed);
    free_object_cell(address);
}

/// Makes `child` the last child of `parent`.
pub(crate) fn attach(parent: usize, child: usize) -> bool {
    let mut engine = engine();
    if parent == child || !engine.objects.contains_key(&parent) {
        return false;
    }
    let Some(previous) = engine.objects.get_mut(&child).map(|c| c.parent.replace(parent)) else {
        return false;
    };
    if let Some(old) = previous.and_then(|p| engine.objects.get_mut(&p)) {
        old.children.retain(|c| *c != child);
    }
    if let Some(object) = engine.objects.get_mut(&parent) {
        object.children.push(child);
    }
    true
}

/// Resolves a relative node path from `from`.
pub(crate) fn find_node(from: usize, path: &str) -> Option<usize> {
    if path.is_empty() {
        return None;
    }
    let engine = engine();
    let mut current = from;
    for part in path.split('/').filter(|part| !part.is_empty() && *part != ".") {
        let node = engine.objects.get(&current)?;
        current = if part == ".." {
            node.parent?
        } else {
            *node
                .children
                .iter()
                .find(|child| engine.objects.get(*child).is_some_and(|c| c.name == part))?
        };
    }
    Some(current)
}

// ============================================================================
// Interface functions
// ============================================================================

pub(crate) unsafe extern "C" fn object_destroy(object: sys::GDExtensionObjectPtr) {
    destroy_object(object as usize);
}

pub(crate) unsafe extern "C" fn global_get_singleton(
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionObjectPtr {
    let name = unsafe { read_text(name) };
    engine()
        .singletons
        .get(&name)
        .map_or(ptr::null_mut(), |address| *address as sys::GDExtensionObjectPtr)
}

pub(crate) unsafe extern "C" fn object_set_instance(
    object: sys::GDExtensionObjectPtr,
    class: sys::GDExtensionConstStringNamePtr,
    instance: sys::GDExtensionClassInstancePtr,
) {
    let class = unsafe { read_text(class) };
    if let Some(object) = engine().objects.get_mut(&(object as usize)) {
        object.class = class.clone();
        object.instance = Some((class, instance as usize));
    }
}

pub(crate) unsafe extern "C" fn object_get_class_name(
    object: sys::GDExtensionConstObjectPtr,
    _library: sys::GDExtensionClassLibraryPtr,
    class: sys::GDExtensionUninitializedStringNamePtr,
) -> sys::GDExtensionBool {
    let name = engine().objects.get(&(object as usize)).map(|o| o.class.clone());
    match name {
        Some(name) => {
            unsafe { write_token(class, Data::Name(name)) };
            1
        }
        None => 0,
    }
}

pub(crate) unsafe extern "C" fn object_cast_to(
    object: sys::GDExtensionConstObjectPtr,
    tag: *mut c_void,
) -> sys::GDExtensionObjectPtr {
    let engine = engine();
    let Some(data) = engine.objects.get(&(object as usize)) else {
        return ptr::null_mut();
    };
    match engine.class_by_tag(tag as usize) {
        Some(target) if engine.inherits(&data.class, &target) => object as sys::GDExtensionObjectPtr,
        _ => ptr::null_mut(),
    }
}

pub(crate) unsafe extern "C" fn object_get_instance_from_id(id: sys::GDObjectInstanceID) -> sys::GDExtensionObjectPtr {
    address_of(id).map_or(ptr::null_mut(), |address| address as sys::GDExtensionObjectPtr)
}

pub(crate) unsafe extern "C" fn object_get_instance_id(object: sys::GDExtensionConstObjectPtr) -> sys::GDObjectInstanceID {
    engine().objects.get(&(object as usize)).map_or(0, |o| o.id)
}
