//! Engine builtin types.
//!
//! Plain-data types (vectors, rects, colors, ...) are layout mirrors in
//! [`math`]. Container types (strings, names, paths, arrays, dictionaries and
//! packed arrays) are opaque tokens of one or two words referring to storage
//! the engine manages. Every token carries an [`Ownership`] tag:
//!
//! - `Owned` tokens are destroyed exactly once, on drop, unless ownership is
//!   transferred into a variant or a return slot first.
//! - `Borrowed` tokens view engine storage for the duration of a call and are
//!   never destroyed. The first mutable access copies the storage into an
//!   owned token, so writes never reach the engine's original.
//! - `Consumed` tokens were transferred out. Any further use is reported as
//!   [`BridgeError::ContainerConsumed`] instead of touching freed storage.

use std::mem::MaybeUninit;

use gdbridge_sys as sys;

use crate::error::{BridgeError, BridgeResult};
use crate::interface::interface;
use crate::marshal::PtrValue;
use crate::variant::VariantType;

mod array;
mod dictionary;
mod math;
mod packed;
mod string;

pub use array::VariantArray;
pub use dictionary::Dictionary;
pub use math::*;
pub use packed::*;
pub use string::{GString, NodePath, StringName};

/// Ownership tag of a host-held container token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
    Consumed,
}

/// Operations shared by every container token type.
pub trait Container: PtrValue + Default + Clone {
    fn ownership(&self) -> Ownership;

    fn sys(&self) -> sys::GDExtensionConstTypePtr;

    /// Pointer for mutation. A borrowed token is first detached into an
    /// owned copy.
    fn sys_mut(&mut self) -> sys::GDExtensionTypePtr;

    /// Invalidates the token after its ownership moved elsewhere.
    fn mark_consumed(&mut self);

    /// Fails with a logged diagnostic when the token was consumed.
    fn ensure_live(&self) -> BridgeResult<()>;

    /// Builds an owned token from a pointer the engine initializes in place.
    ///
    /// # Safety
    /// `init` must fully initialize the token it is given.
    unsafe fn construct_with(init: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self;
}

// ============================================================================
// Engine lifecycle helpers
// ============================================================================

/// Default-constructs a token of type `ty` in place.
pub(crate) unsafe fn construct_default(ty: VariantType, dest: sys::GDExtensionUninitializedTypePtr) {
    let ctor = interface().ok().and_then(|i| i.lifecycle(ty).construct_default);
    match ctor {
        Some(ctor) => unsafe { ctor(dest, std::ptr::null()) },
        None => log::error!("cannot construct {}: engine constructor unavailable", ty.name()),
    }
}

/// Copy-constructs a token of type `ty` from `src`.
pub(crate) unsafe fn construct_copy(
    ty: VariantType,
    dest: sys::GDExtensionUninitializedTypePtr,
    src: sys::GDExtensionConstTypePtr,
) {
    let ctor = interface().ok().and_then(|i| i.lifecycle(ty).construct_copy);
    match ctor {
        Some(ctor) => {
            let args = [src];
            unsafe { ctor(dest, args.as_ptr()) }
        }
        None => log::error!("cannot copy {}: engine constructor unavailable", ty.name()),
    }
}

/// Constructs a token of type `ty` with the engine constructor at `index`,
/// passing a single argument.
pub(crate) unsafe fn construct_from(
    ty: VariantType,
    index: i32,
    dest: sys::GDExtensionUninitializedTypePtr,
    src: sys::GDExtensionConstTypePtr,
) -> BridgeResult<()> {
    let table = interface()?;
    let ctor = if index == 2 {
        table.lifecycle(ty).construct_convert
    } else {
        unsafe { (table.variant_get_ptr_constructor)(ty.to_sys(), index) }
    };
    let ctor = ctor.ok_or(BridgeError::MissingMethod {
        class: ty.name(),
        method: "<constructor>",
    })?;
    let args = [src];
    unsafe { ctor(dest, args.as_ptr()) };
    Ok(())
}

/// Destroys an owned token of type `ty`.
pub(crate) unsafe fn destroy(ty: VariantType, token: sys::GDExtensionTypePtr) {
    match interface() {
        Ok(table) => {
            if let Some(dtor) = table.lifecycle(ty).destroy {
                unsafe { dtor(token) };
            }
        }
        Err(_) => log::debug!("{} token outlived the engine interface", ty.name()),
    }
}

/// Calls a builtin method of a container (`size`, `append`, ...) through the
/// pointer-call convention.
pub(crate) unsafe fn call_builtin<R: PtrValue>(
    ty: VariantType,
    method: &'static str,
    base: sys::GDExtensionTypePtr,
    args: &[sys::GDExtensionConstTypePtr],
) -> BridgeResult<R> {
    let func = interface()?.builtin_method(ty, method)?;
    let mut ret = MaybeUninit::<R::Raw>::zeroed();
    unsafe {
        func(base, args.as_ptr(), ret.as_mut_ptr().cast(), args.len() as i32);
        Ok(R::from_raw(ret.assume_init()))
    }
}

/// Declares a container token type backed by `$words` machine words.
macro_rules! builtin_container {
    ($(#[$attr:meta])* $name:ident, $vty:ident, $words:literal) => {
        $(#[$attr])*
        pub struct $name {
            opaque: [usize; $words],
            ownership: $crate::builtin::Ownership,
        }

        // The engine synchronizes its container storage internally.
        unsafe impl Send for $name {}

        impl $name {
            /// Adopts an owned token produced by the engine.
            ///
            /// # Safety
            /// `opaque` must be a live token the caller owns.
            pub unsafe fn from_opaque(opaque: [usize; $words]) -> Self {
                Self {
                    opaque,
                    ownership: $crate::builtin::Ownership::Owned,
                }
            }

            /// Views a token owned by the engine without taking ownership.
            ///
            /// # Safety
            /// `ptr` must point to a live token that outlives the returned value.
            pub unsafe fn borrowed(ptr: ::gdbridge_sys::GDExtensionConstTypePtr) -> Self {
                Self {
                    opaque: unsafe { ::std::ptr::read(ptr as *const [usize; $words]) },
                    ownership: $crate::builtin::Ownership::Borrowed,
                }
            }

            /// Owned copy of this token.
            pub fn to_owned_copy(&self) -> $crate::error::BridgeResult<Self> {
                $crate::builtin::Container::ensure_live(self)?;
                Ok(unsafe {
                    <Self as $crate::builtin::Container>::construct_with(|dest| {
                        $crate::builtin::construct_copy(
                            $crate::variant::VariantType::$vty,
                            dest,
                            self.opaque.as_ptr().cast(),
                        )
                    })
                })
            }

            /// Gives up ownership without destroying the token.
            pub(crate) fn into_opaque(self) -> [usize; $words] {
                let this = ::std::mem::ManuallyDrop::new(self);
                this.opaque
            }
        }

        impl $crate::builtin::Container for $name {
            fn ownership(&self) -> $crate::builtin::Ownership {
                self.ownership
            }

            fn sys(&self) -> ::gdbridge_sys::GDExtensionConstTypePtr {
                self.opaque.as_ptr().cast()
            }

            fn sys_mut(&mut self) -> ::gdbridge_sys::GDExtensionTypePtr {
                if self.ownership == $crate::builtin::Ownership::Borrowed {
                    let mut owned = [0usize; $words];
                    unsafe {
                        $crate::builtin::construct_copy(
                            $crate::variant::VariantType::$vty,
                            owned.as_mut_ptr().cast(),
                            self.opaque.as_ptr().cast(),
                        )
                    };
                    self.opaque = owned;
                    self.ownership = $crate::builtin::Ownership::Owned;
                }
                self.opaque.as_mut_ptr().cast()
            }

            fn mark_consumed(&mut self) {
                self.opaque = [0; $words];
                self.ownership = $crate::builtin::Ownership::Consumed;
            }

            fn ensure_live(&self) -> $crate::error::BridgeResult<()> {
                if self.ownership == $crate::builtin::Ownership::Consumed {
                    log::error!("{} token used after it was transferred", stringify!($name));
                    return Err($crate::error::BridgeError::ContainerConsumed {
                        type_name: stringify!($name),
                    });
                }
                Ok(())
            }

            unsafe fn construct_with(
                init: impl FnOnce(::gdbridge_sys::GDExtensionUninitializedTypePtr),
            ) -> Self {
                let mut opaque = [0usize; $words];
                init(opaque.as_mut_ptr().cast());
                unsafe { Self::from_opaque(opaque) }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                unsafe {
                    <Self as $crate::builtin::Container>::construct_with(|dest| {
                        $crate::builtin::construct_default($crate::variant::VariantType::$vty, dest)
                    })
                }
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                self.to_owned_copy().unwrap_or_default()
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                if self.ownership == $crate::builtin::Ownership::Owned {
                    unsafe {
                        $crate::builtin::destroy(
                            $crate::variant::VariantType::$vty,
                            self.opaque.as_mut_ptr().cast(),
                        )
                    };
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("token", &format_args!("{:#x}", self.opaque[0]))
                    .field("ownership", &self.ownership)
                    .finish()
            }
        }

        impl $crate::variant::VariantTyped for $name {
            const VARIANT_TYPE: $crate::variant::VariantType = $crate::variant::VariantType::$vty;
        }

        impl $crate::marshal::PtrValue for $name {
            type Raw = [usize; $words];

            fn to_raw(&self) -> $crate::error::BridgeResult<[usize; $words]> {
                $crate::builtin::Container::ensure_live(self)?;
                Ok(self.opaque)
            }

            unsafe fn from_raw(raw: [usize; $words]) -> Self {
                unsafe { Self::from_opaque(raw) }
            }

            unsafe fn from_arg(arg: ::gdbridge_sys::GDExtensionConstTypePtr) -> Self {
                unsafe {
                    <Self as $crate::builtin::Container>::construct_with(|dest| {
                        $crate::builtin::construct_copy($crate::variant::VariantType::$vty, dest, arg)
                    })
                }
            }

            unsafe fn write_ret(
                self,
                ret: ::gdbridge_sys::GDExtensionTypePtr,
            ) -> $crate::error::BridgeResult<()> {
                match self.ownership {
                    $crate::builtin::Ownership::Owned => {
                        let opaque = self.into_opaque();
                        unsafe { ::std::ptr::write(ret as *mut [usize; $words], opaque) };
                        Ok(())
                    }
                    $crate::builtin::Ownership::Borrowed => {
                        unsafe {
                            $crate::builtin::construct_copy(
                                $crate::variant::VariantType::$vty,
                                ret,
                                self.opaque.as_ptr().cast(),
                            )
                        };
                        Ok(())
                    }
                    $crate::builtin::Ownership::Consumed => {
                        $crate::builtin::Container::ensure_live(&self)
                    }
                }
            }

            unsafe fn write_default(ret: ::gdbridge_sys::GDExtensionTypePtr) {
                unsafe { $crate::builtin::construct_default($crate::variant::VariantType::$vty, ret) };
            }

            unsafe fn drop_raw(raw: *mut ::std::ffi::c_void) {
                unsafe { $crate::builtin::destroy($crate::variant::VariantType::$vty, raw) };
            }
        }

        impl $crate::variant::ToVariant for $name {
            fn to_variant(&self) -> $crate::variant::Variant {
                $crate::variant::Variant::from_container(self)
            }
        }

        impl $crate::variant::FromVariant for $name {
            fn from_variant(
                variant: &$crate::variant::Variant,
            ) -> Result<Self, $crate::error::ConversionError> {
                variant.to_container()
            }
        }

        impl From<$name> for $crate::variant::Variant {
            fn from(mut value: $name) -> Self {
                $crate::variant::Variant::take_from(&mut value)
            }
        }
    };
}

pub(crate) use builtin_container;
