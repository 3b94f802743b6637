//! Pointer-call marshalling.
//!
//! The engine's fast call path passes every argument as a pointer to its raw
//! representation and writes the result into caller-provided storage.
//! [`PtrValue`] describes that raw representation for a host type and the
//! ownership rules of moving it across the boundary:
//!
//! - arguments are borrowed: packing an argument never transfers ownership,
//!   and a receiving side that keeps an argument takes its own copy;
//! - return values are owned: the writer hands its ownership (one container
//!   token, or one reference of a reference-counted object) to the reader.
//!
//! Engine integers travel as 64-bit and floats as double precision regardless
//! of the host type's width.

use std::ffi::c_void;
use std::mem;
use std::ptr;

use gdbridge_sys as sys;

use crate::builtin::{
    Aabb, Basis, Color, Plane, Projection, Quaternion, Rect2, Rect2i, Rid, Transform2D,
    Transform3D, Vector2, Vector2i, Vector3, Vector3i, Vector4, Vector4i,
};
use crate::error::{BridgeResult, ConversionError};
use crate::variant::{VariantType, VariantTyped};

/// A host type that can be passed through the pointer-call convention.
pub trait PtrValue: VariantTyped + Sized {
    /// The bytes the engine reads or writes through the pointer.
    type Raw: Copy;

    /// Raw representation for use as a borrowed argument.
    fn to_raw(&self) -> BridgeResult<Self::Raw>;

    /// Takes ownership of a raw value written by the engine.
    ///
    /// # Safety
    /// `raw` must be a valid, owned value of this type.
    unsafe fn from_raw(raw: Self::Raw) -> Self;

    /// Reads a borrowed argument. Owning types take their own copy.
    ///
    /// # Safety
    /// `arg` must point to a valid raw value of this type.
    unsafe fn from_arg(arg: sys::GDExtensionConstTypePtr) -> Self {
        unsafe { Self::from_raw(ptr::read(arg as *const Self::Raw)) }
    }

    /// Moves the value into uninitialized return storage.
    ///
    /// # Safety
    /// `ret` must point to writable storage of at least `size_of::<Raw>()` bytes.
    unsafe fn write_ret(self, ret: sys::GDExtensionTypePtr) -> BridgeResult<()> {
        let raw = self.to_raw()?;
        unsafe { ptr::write(ret as *mut Self::Raw, raw) };
        Ok(())
    }

    /// Writes the neutral value into return storage when a call cannot produce one.
    ///
    /// # Safety
    /// Same as [`PtrValue::write_ret`].
    unsafe fn write_default(ret: sys::GDExtensionTypePtr) {
        // Plain-data raw representations are valid when all-zero.
        unsafe { ptr::write(ret as *mut Self::Raw, mem::zeroed()) };
    }

    /// Releases a raw return value nobody read.
    ///
    /// # Safety
    /// `raw` must point to a valid, owned raw value of this type.
    unsafe fn drop_raw(raw: *mut c_void) {
        let _ = raw;
    }
}

// ============================================================================
// Primitive implementations
// ============================================================================

impl PtrValue for () {
    type Raw = ();

    fn to_raw(&self) -> BridgeResult<()> {
        Ok(())
    }

    unsafe fn from_raw(_raw: ()) -> Self {}

    // Void calls pass a null return pointer.
    unsafe fn write_ret(self, _ret: sys::GDExtensionTypePtr) -> BridgeResult<()> {
        Ok(())
    }

    unsafe fn write_default(_ret: sys::GDExtensionTypePtr) {}
}

impl PtrValue for bool {
    type Raw = u8;

    fn to_raw(&self) -> BridgeResult<u8> {
        Ok(*self as u8)
    }

    unsafe fn from_raw(raw: u8) -> Self {
        raw != 0
    }
}

macro_rules! impl_ptr_int {
    ($($ty:ty),*) => {
        $(
            impl PtrValue for $ty {
                type Raw = i64;

                fn to_raw(&self) -> BridgeResult<i64> {
                    Ok(*self as i64)
                }

                /// An engine integer outside the range of the host type reads as zero.
                #[allow(clippy::useless_conversion)]
                unsafe fn from_raw(raw: i64) -> Self {
                    <$ty>::try_from(raw).unwrap_or_else(|_| {
                        log::error!(
                            "{}",
                            ConversionError::IntegerOverflow {
                                value: raw,
                                target_type: stringify!($ty),
                            }
                        );
                        0
                    })
                }
            }
        )*
    };
}

impl_ptr_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_ptr_float {
    ($($ty:ty),*) => {
        $(
            impl PtrValue for $ty {
                type Raw = f64;

                fn to_raw(&self) -> BridgeResult<f64> {
                    Ok(*self as f64)
                }

                unsafe fn from_raw(raw: f64) -> Self {
                    raw as $ty
                }
            }
        )*
    };
}

impl_ptr_float!(f32, f64);

macro_rules! impl_ptr_plain {
    ($($ty:ty),*) => {
        $(
            impl PtrValue for $ty {
                type Raw = $ty;

                fn to_raw(&self) -> BridgeResult<$ty> {
                    Ok(*self)
                }

                unsafe fn from_raw(raw: $ty) -> Self {
                    raw
                }
            }
        )*
    };
}

impl_ptr_plain!(
    Vector2, Vector2i, Vector3, Vector3i, Vector4, Vector4i, Rect2, Rect2i, Plane, Quaternion,
    Color, Rid, Transform2D, Aabb, Basis, Transform3D, Projection
);

/// Number of pointer-sized cells a raw value of type `T` occupies.
pub const fn cells_for<T>() -> usize {
    mem::size_of::<T>().div_ceil(mem::size_of::<u64>())
}

/// Checks that a raw value's declared variant type matches what the engine expects.
pub fn expect_type<T: PtrValue>(actual: VariantType) -> Result<(), ConversionError> {
    if T::VARIANT_TYPE == actual {
        Ok(())
    } else {
        Err(ConversionError::TypeMismatch {
            expected: T::VARIANT_TYPE.name(),
            actual: actual.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_to_engine_int() {
        assert_eq!(7i32.to_raw().unwrap(), 7i64);
        assert_eq!(unsafe { i32::from_raw(-3) }, -3);
        assert_eq!(unsafe { u8::from_raw(255) }, 255u8);
    }

    #[test]
    fn out_of_range_integers_read_as_zero() {
        assert_eq!(unsafe { u8::from_raw(256) }, 0);
        assert_eq!(unsafe { i8::from_raw(-129) }, 0);
        assert_eq!(unsafe { u32::from_raw(-1) }, 0);
        assert_eq!(unsafe { i32::from_raw(i64::from(i32::MIN)) }, i32::MIN);

        let raw: i64 = 1 << 40;
        let value = unsafe { i32::from_arg(&raw as *const i64 as sys::GDExtensionConstTypePtr) };
        assert_eq!(value, 0);
    }

    #[test]
    fn floats_travel_as_double() {
        assert_eq!(1.5f32.to_raw().unwrap(), 1.5f64);
        assert_eq!(unsafe { f32::from_raw(2.25) }, 2.25f32);
    }

    #[test]
    fn cell_counts() {
        assert_eq!(cells_for::<()>(), 0);
        assert_eq!(cells_for::<u8>(), 1);
        assert_eq!(cells_for::<i64>(), 1);
        assert_eq!(cells_for::<Vector3>(), 2);
        assert_eq!(cells_for::<Color>(), 2);
        assert_eq!(cells_for::<[usize; 2]>(), 2);
    }

    #[test]
    fn read_argument_from_pointer() {
        let raw: i64 = 42;
        let value = unsafe { i64::from_arg(&raw as *const i64 as sys::GDExtensionConstTypePtr) };
        assert_eq!(value, 42);
    }

    #[test]
    fn write_return_into_storage() {
        let mut storage: f64 = 0.0;
        unsafe {
            0.5f64
                .write_ret(&mut storage as *mut f64 as sys::GDExtensionTypePtr)
                .unwrap()
        };
        assert_eq!(storage, 0.5);
    }

    #[test]
    fn default_return_is_zeroed() {
        let mut storage: i64 = 99;
        unsafe { i64::write_default(&mut storage as *mut i64 as sys::GDExtensionTypePtr) };
        assert_eq!(storage, 0);
    }

    #[test]
    fn expect_type_reports_mismatch() {
        assert!(expect_type::<i64>(VariantType::Int).is_ok());
        assert_eq!(
            expect_type::<i64>(VariantType::Float),
            Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: "float"
            })
        );
    }
}
