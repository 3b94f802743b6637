//! Host references to engine objects.
//!
//! An [`Obj<T>`] holds the object pointer together with the engine instance
//! id captured when the handle was created. Before the pointer is used it is
//! revalidated through the id, so a handle to an object the engine already
//! destroyed reports [`BridgeError::StaleHandle`] instead of being
//! dereferenced.
//!
//! For reference-counted objects every `Obj` owns exactly one engine
//! reference: creating one from a borrowed pointer takes a reference, `Drop`
//! gives it back and destroys the object once the engine reports it was the
//! last one. The handle registry mirrors the number of outstanding host
//! references per object.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::Deref;
use std::ptr;

use gdbridge_sys as sys;

use crate::builtin::{Container, StringName};
use crate::classes::{refcounted, EngineClass, Inherits, RefCountKind};
use crate::config::{config, InitLevel};
use crate::error::{BridgeError, BridgeResult, ConversionError};
use crate::handle::handles;
use crate::interface::{interface, is_loaded};
use crate::marshal::PtrValue;
use crate::variant::{FromVariant, ToVariant, Variant, VariantType, VariantTyped};

/// A reference to an engine object of class `T` or a subclass.
#[repr(C)]
pub struct Obj<T: EngineClass> {
    ptr: usize,
    instance_id: u64,
    refcounted: bool,
    _marker: PhantomData<fn() -> T>,
}

// Engine objects are addressed by pointer; thread affinity is the engine's contract.
unsafe impl<T: EngineClass> Send for Obj<T> {}

fn is_refcounted<T: EngineClass>(ptr: sys::GDExtensionObjectPtr) -> bool {
    match T::REFCOUNT {
        RefCountKind::Always => true,
        RefCountKind::Never => false,
        RefCountKind::Dynamic => match interface() {
            Ok(table) => {
                let tag = table.class_tag("RefCounted");
                !tag.is_null() && !unsafe { (table.object_cast_to)(ptr, tag) }.is_null()
            }
            Err(_) => false,
        },
    }
}

fn tracking_level() -> InitLevel {
    config().minimum_level
}

impl<T: EngineClass> Obj<T> {
    fn from_parts(ptr: sys::GDExtensionObjectPtr, refcounted: bool) -> Self {
        let instance_id = match interface() {
            Ok(table) if !ptr.is_null() => unsafe { (table.object_get_instance_id)(ptr) },
            _ => 0,
        };
        Self {
            ptr: ptr as usize,
            instance_id,
            refcounted,
            _marker: PhantomData,
        }
    }

    /// Takes a new reference to an object the caller only borrows.
    ///
    /// Returns `None` for a reference-counted object the engine is already
    /// destroying.
    ///
    /// # Safety
    /// `ptr` must be null or a live object of class `T`.
    pub unsafe fn from_sys_borrowed(ptr: sys::GDExtensionObjectPtr) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let refcounted = is_refcounted::<T>(ptr);
        if refcounted {
            match refcounted::reference_raw(ptr) {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!("{} at {:p} is being destroyed and cannot be referenced", T::CLASS_NAME, ptr);
                    return None;
                }
                Err(err) => {
                    log::error!("cannot reference {}: {}", T::CLASS_NAME, err);
                    return None;
                }
            }
            handles().retain(ptr, tracking_level());
        }
        Some(Self::from_parts(ptr, refcounted))
    }

    /// Adopts a reference the engine already transferred to the caller.
    ///
    /// # Safety
    /// `ptr` must be null or a live object of class `T`, and for reference
    /// counted objects one engine reference must belong to the caller.
    pub unsafe fn from_sys_owned(ptr: sys::GDExtensionObjectPtr) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let refcounted = is_refcounted::<T>(ptr);
        if refcounted {
            handles().retain(ptr, tracking_level());
        }
        Some(Self::from_parts(ptr, refcounted))
    }

    /// Constructs a new engine object of class `T`.
    pub fn new_alloc() -> BridgeResult<Self> {
        let table = interface()?;
        let class_name = StringName::from(T::CLASS_NAME);
        let ptr = unsafe { (table.classdb_construct_object)(class_name.sys()) };
        if ptr.is_null() {
            return Err(BridgeError::InvalidClass {
                class: T::CLASS_NAME.to_string(),
                reason: "the engine cannot construct it".to_string(),
            });
        }
        unsafe { Self::from_sys_borrowed(ptr) }.ok_or_else(|| BridgeError::InvalidClass {
            class: T::CLASS_NAME.to_string(),
            reason: "the engine returned an object that cannot be referenced".to_string(),
        })
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Raw pointer, without checking that the object is still alive.
    pub fn sys(&self) -> sys::GDExtensionObjectPtr {
        self.ptr as sys::GDExtensionObjectPtr
    }

    pub fn is_refcounted(&self) -> bool {
        self.refcounted
    }

    /// True while the engine still knows the object under this instance id.
    pub fn is_valid(&self) -> bool {
        if self.ptr == 0 {
            return false;
        }
        match interface() {
            Ok(table) => unsafe { (table.object_get_instance_from_id)(self.instance_id) as usize == self.ptr },
            Err(_) => false,
        }
    }

    /// Raw pointer of a live object.
    pub fn checked_sys(&self) -> BridgeResult<sys::GDExtensionObjectPtr> {
        if self.is_valid() {
            Ok(self.sys())
        } else {
            Err(BridgeError::StaleHandle {
                instance_id: self.instance_id,
            })
        }
    }

    /// Converts into a handle to a base class.
    pub fn upcast<B: EngineClass>(self) -> Obj<B>
    where
        T: Inherits<B>,
    {
        let this = ManuallyDrop::new(self);
        Obj {
            ptr: this.ptr,
            instance_id: this.instance_id,
            refcounted: this.refcounted,
            _marker: PhantomData,
        }
    }

    /// Views this handle as a handle to a base class.
    pub fn upcast_ref<B: EngineClass>(&self) -> &Obj<B>
    where
        T: Inherits<B>,
    {
        // `Obj` is `repr(C)` and its layout does not depend on the class parameter.
        unsafe { &*(self as *const Obj<T> as *const Obj<B>) }
    }

    /// Checked conversion to another class. Gives the handle back on failure.
    pub fn cast<U: EngineClass>(self) -> Result<Obj<U>, Self> {
        let Ok(table) = interface() else {
            return Err(self);
        };
        let tag = table.class_tag(U::CLASS_NAME);
        if tag.is_null() || !self.is_valid() {
            return Err(self);
        }
        if unsafe { (table.object_cast_to)(self.sys(), tag) }.is_null() {
            return Err(self);
        }
        let this = ManuallyDrop::new(self);
        Ok(Obj {
            ptr: this.ptr,
            instance_id: this.instance_id,
            refcounted: this.refcounted,
            _marker: PhantomData,
        })
    }

    /// Destroys an object the host constructed.
    ///
    /// Reference-counted objects are destroyed by dropping their last
    /// reference and are rejected here.
    pub fn free(self) -> BridgeResult<()> {
        if self.refcounted {
            return Err(BridgeError::InvalidClass {
                class: T::CLASS_NAME.to_string(),
                reason: "reference-counted objects are released, not freed".to_string(),
            });
        }
        let ptr = self.checked_sys()?;
        let table = interface()?;
        mem::forget(self);
        unsafe { (table.object_destroy)(ptr) };
        Ok(())
    }

    /// Gives up the handle without releasing its reference.
    fn leak(self) -> sys::GDExtensionObjectPtr {
        let this = ManuallyDrop::new(self);
        if this.refcounted {
            handles().release_ref(this.sys());
        }
        this.sys()
    }
}

impl<T: EngineClass> Clone for Obj<T> {
    fn clone(&self) -> Self {
        if !self.refcounted {
            return Self {
                ptr: self.ptr,
                instance_id: self.instance_id,
                refcounted: false,
                _marker: PhantomData,
            };
        }
        if self.is_valid() && refcounted::reference_raw(self.sys()).is_ok() {
            handles().retain(self.sys(), tracking_level());
        } else {
            log::warn!("cloned a stale {} handle", T::CLASS_NAME);
        }
        Self {
            ptr: self.ptr,
            instance_id: self.instance_id,
            refcounted: true,
            _marker: PhantomData,
        }
    }
}

impl<T: EngineClass> Drop for Obj<T> {
    fn drop(&mut self) {
        if !self.refcounted || self.ptr == 0 {
            return;
        }
        handles().release_ref(self.sys());
        if !is_loaded() || !self.is_valid() {
            return;
        }
        match refcounted::unreference_raw(self.sys()) {
            Ok(true) => {
                if let Ok(table) = interface() {
                    unsafe { (table.object_destroy)(self.sys()) };
                }
            }
            Ok(false) => {}
            Err(err) => log::error!("cannot release {}: {}", T::CLASS_NAME, err),
        }
    }
}

impl<T: EngineClass> PartialEq for Obj<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.instance_id == other.instance_id
    }
}

impl<T: EngineClass> Eq for Obj<T> {}

impl<T: EngineClass> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj<{}>({:#x}, id {})", T::CLASS_NAME, self.ptr, self.instance_id)
    }
}

// ============================================================================
// Marshalling
// ============================================================================

impl<T: EngineClass> VariantTyped for Obj<T> {
    const VARIANT_TYPE: VariantType = VariantType::Object;

    fn class_name() -> &'static str {
        T::CLASS_NAME
    }
}

impl<T: EngineClass> VariantTyped for Option<Obj<T>> {
    const VARIANT_TYPE: VariantType = VariantType::Object;

    fn class_name() -> &'static str {
        T::CLASS_NAME
    }
}

impl<T: EngineClass> PtrValue for Obj<T> {
    type Raw = usize;

    fn to_raw(&self) -> BridgeResult<usize> {
        Ok(self.checked_sys()? as usize)
    }

    unsafe fn from_raw(raw: usize) -> Self {
        match unsafe { Self::from_sys_owned(raw as sys::GDExtensionObjectPtr) } {
            Some(obj) => obj,
            None => Self::from_parts(ptr::null_mut(), false),
        }
    }

    unsafe fn from_arg(arg: sys::GDExtensionConstTypePtr) -> Self {
        let raw = unsafe { ptr::read(arg as *const usize) };
        match unsafe { Self::from_sys_borrowed(raw as sys::GDExtensionObjectPtr) } {
            Some(obj) => obj,
            None => Self::from_parts(ptr::null_mut(), false),
        }
    }

    unsafe fn write_ret(self, ret: sys::GDExtensionTypePtr) -> BridgeResult<()> {
        self.checked_sys()?;
        let raw = self.leak();
        unsafe { ptr::write(ret as *mut usize, raw as usize) };
        Ok(())
    }

    unsafe fn drop_raw(raw: *mut c_void) {
        drop(unsafe { Self::from_raw(ptr::read(raw as *const usize)) });
    }
}

impl<T: EngineClass> PtrValue for Option<Obj<T>> {
    type Raw = usize;

    fn to_raw(&self) -> BridgeResult<usize> {
        match self {
            Some(obj) => obj.to_raw(),
            None => Ok(0),
        }
    }

    unsafe fn from_raw(raw: usize) -> Self {
        unsafe { Obj::from_sys_owned(raw as sys::GDExtensionObjectPtr) }
    }

    unsafe fn from_arg(arg: sys::GDExtensionConstTypePtr) -> Self {
        unsafe { Obj::from_sys_borrowed(ptr::read(arg as *const usize) as sys::GDExtensionObjectPtr) }
    }

    unsafe fn write_ret(self, ret: sys::GDExtensionTypePtr) -> BridgeResult<()> {
        match self {
            Some(obj) => unsafe { obj.write_ret(ret) },
            None => {
                unsafe { ptr::write(ret as *mut usize, 0) };
                Ok(())
            }
        }
    }

    unsafe fn drop_raw(raw: *mut c_void) {
        drop(unsafe { Self::from_raw(ptr::read(raw as *const usize)) });
    }
}

impl<T: EngineClass> ToVariant for Obj<T> {
    fn to_variant(&self) -> Variant {
        match self.checked_sys() {
            Ok(ptr) => {
                let raw = ptr as usize;
                Variant::from_type_ptr(VariantType::Object, (&raw as *const usize).cast())
            }
            Err(err) => {
                log::error!("{}", err);
                Variant::nil()
            }
        }
    }
}

impl<T: EngineClass> FromVariant for Obj<T> {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        let mut raw: usize = 0;
        variant.to_type_ptr(VariantType::Object, (&mut raw as *mut usize).cast())?;
        if raw == 0 {
            return Err(ConversionError::NullToken { tag: "Object" });
        }
        let object = unsafe { Obj::<crate::classes::Object>::from_sys_borrowed(raw as sys::GDExtensionObjectPtr) }
            .ok_or(ConversionError::NullToken { tag: "Object" })?;
        object.cast::<T>().map_err(|_| ConversionError::TypeMismatch {
            expected: T::CLASS_NAME,
            actual: "Object",
        })
    }
}

impl<T: EngineClass> From<Obj<T>> for Variant {
    fn from(value: Obj<T>) -> Self {
        value.to_variant()
    }
}

// ============================================================================
// Base handles
// ============================================================================

/// Non-owning handle from an extension instance to its own engine object.
///
/// The engine object owns the instance, so the instance must not keep it
/// alive; `Base` never takes or releases a reference.
pub struct Base<T: EngineClass> {
    obj: ManuallyDrop<Obj<T>>,
}

impl<T: EngineClass> Base<T> {
    /// # Safety
    /// `ptr` must be the live engine object the instance is being bound to.
    pub(crate) unsafe fn from_sys(ptr: sys::GDExtensionObjectPtr) -> Self {
        Self {
            obj: ManuallyDrop::new(Obj::from_parts(ptr, false)),
        }
    }

    /// A counted reference to the same object.
    pub fn to_obj(&self) -> Option<Obj<T>> {
        if !self.obj.is_valid() {
            return None;
        }
        unsafe { Obj::from_sys_borrowed(self.obj.sys()) }
    }
}

impl<T: EngineClass> Deref for Base<T> {
    type Target = Obj<T>;

    fn deref(&self) -> &Obj<T> {
        &self.obj
    }
}

impl<T: EngineClass> fmt::Debug for Base<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base({:?})", *self.obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{Node, Object, RefCounted, Resource};
    use crate::test_support;

    #[test]
    fn refcounted_handles_balance_the_engine_count() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        assert!(resource.is_refcounted());
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 1);
        assert_eq!(handles().host_refs(resource.sys()), 1);

        let second = resource.clone();
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 2);
        assert_eq!(handles().host_refs(resource.sys()), 2);

        drop(second);
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 1);

        let id = resource.instance_id();
        drop(resource);
        assert!(gdbridge_mock::object_by_id(id).is_none());
    }

    #[test]
    fn freed_objects_become_stale() {
        test_support::load();
        let node = Obj::<Node>::new_alloc().unwrap();
        let copy = node.clone();
        let id = node.instance_id();
        node.free().unwrap();
        assert!(!copy.is_valid());
        assert_eq!(
            copy.checked_sys().unwrap_err(),
            BridgeError::StaleHandle { instance_id: id }
        );
    }

    #[test]
    fn refcounted_objects_cannot_be_freed() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        assert!(matches!(resource.free(), Err(BridgeError::InvalidClass { .. })));
    }

    #[test]
    fn casts_are_checked_by_the_engine() {
        test_support::load();
        let node = Obj::<Node>::new_alloc().unwrap();
        let object: Obj<Object> = node.clone().upcast();
        assert!(!object.is_refcounted());
        let back = object.cast::<Node>().unwrap();
        assert_eq!(back, node);
        let wrong = back.cast::<Resource>().unwrap_err();
        wrong.free().unwrap();
    }

    #[test]
    fn dynamic_refcount_is_detected() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        let as_object = unsafe { Obj::<Object>::from_sys_borrowed(resource.sys()) }.unwrap();
        assert!(as_object.is_refcounted());
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 2);
    }

    #[test]
    fn variants_hold_their_own_reference() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        let variant = resource.to_variant();
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 2);

        let back: Obj<Resource> = variant.to().unwrap();
        assert_eq!(back, resource);
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 3);

        drop(back);
        drop(variant);
        assert_eq!(resource.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 1);
    }

    #[test]
    fn wrong_class_in_variant_is_a_mismatch() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        let variant = resource.to_variant();
        assert_eq!(
            variant.to::<Obj<Node>>().unwrap_err(),
            ConversionError::TypeMismatch {
                expected: "Node",
                actual: "Object"
            }
        );
    }

    #[test]
    fn returning_through_a_pointer_transfers_the_reference() {
        test_support::load();
        let resource = Obj::<Resource>::new_alloc().unwrap();
        let keep = resource.clone();
        let mut slot: usize = 0;
        unsafe { resource.write_ret((&mut slot as *mut usize).cast()).unwrap() };
        assert_eq!(keep.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 2);
        assert_eq!(handles().host_refs(keep.sys()), 1);

        let adopted = unsafe { Obj::<Resource>::from_raw(slot) };
        assert_eq!(keep.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 2);
        drop(adopted);
        assert_eq!(keep.upcast_ref::<RefCounted>().get_reference_count().unwrap(), 1);
    }
}
