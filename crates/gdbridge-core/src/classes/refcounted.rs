//! `RefCounted` methods.
//!
//! Taking and dropping references is done by [`Obj`] itself; the raw calls
//! are exposed to the crate only so the count stays balanced.

use gdbridge_sys as sys;

use crate::error::BridgeResult;
use crate::obj::Obj;

use super::{ptrcall, Inherits, RefCounted};

/// Takes one engine reference. Returns false if the object is being destroyed.
pub(crate) fn reference_raw(object: sys::GDExtensionObjectPtr) -> BridgeResult<bool> {
    ptrcall("RefCounted", "reference", object, |_| Ok(()))
}

/// Drops one engine reference. Returns true when it was the last one.
pub(crate) fn unreference_raw(object: sys::GDExtensionObjectPtr) -> BridgeResult<bool> {
    ptrcall("RefCounted", "unreference", object, |_| Ok(()))
}

impl<T: Inherits<RefCounted>> Obj<T> {
    pub fn get_reference_count(&self) -> BridgeResult<i64> {
        ptrcall("RefCounted", "get_reference_count", self.checked_sys()?, |_| Ok(()))
    }
}
