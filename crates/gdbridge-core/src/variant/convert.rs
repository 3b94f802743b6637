//! Conversions between host values and variants.
//!
//! Integer conversions are range checked; narrowing a variant integer into a
//! smaller host type fails with [`ConversionError::IntegerOverflow`] rather
//! than truncating.

use std::ptr;

use gdbridge_sys as sys;

use super::{Variant, VariantType};
use crate::builtin::{
    Aabb, Basis, Color, GString, Plane, Projection, Quaternion, Rect2, Rect2i, Rid, Transform2D,
    Transform3D, Vector2, Vector2i, Vector3, Vector3i, Vector4, Vector4i,
};
use crate::error::{BridgeResult, ConversionError};
use crate::interface::interface;
use crate::marshal::PtrValue;

/// A host type with a fixed engine type.
pub trait VariantTyped {
    const VARIANT_TYPE: VariantType;

    /// Engine class name for object-typed values, empty otherwise.
    fn class_name() -> &'static str {
        ""
    }

    /// Name used in signatures and diagnostics.
    fn type_label() -> &'static str {
        match Self::class_name() {
            "" => Self::VARIANT_TYPE.name(),
            class => class,
        }
    }
}

pub trait ToVariant {
    fn to_variant(&self) -> Variant;
}

pub trait FromVariant: Sized {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError>;
}

impl<T: ToVariant + ?Sized> ToVariant for &T {
    fn to_variant(&self) -> Variant {
        (**self).to_variant()
    }
}

// ============================================================================
// Variant itself
// ============================================================================

impl VariantTyped for Variant {
    const VARIANT_TYPE: VariantType = VariantType::Nil;

    fn type_label() -> &'static str {
        "Variant"
    }
}

impl ToVariant for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromVariant for Variant {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        Ok(variant.clone())
    }
}

impl PtrValue for Variant {
    type Raw = sys::GDExtensionVariantStorage;

    fn to_raw(&self) -> BridgeResult<Self::Raw> {
        Ok(self.storage)
    }

    unsafe fn from_raw(raw: Self::Raw) -> Self {
        Variant { storage: raw }
    }

    unsafe fn from_arg(arg: sys::GDExtensionConstTypePtr) -> Self {
        unsafe { Variant::from_sys_copy(arg) }
    }

    unsafe fn write_ret(self, ret: sys::GDExtensionTypePtr) -> BridgeResult<()> {
        unsafe { self.move_into_sys(ret) };
        Ok(())
    }

    unsafe fn write_default(ret: sys::GDExtensionTypePtr) {
        unsafe { Variant::nil().move_into_sys(ret) };
    }

    unsafe fn drop_raw(raw: *mut std::ffi::c_void) {
        if let Ok(table) = interface() {
            unsafe { (table.variant_destroy)(raw) };
        }
    }
}

// ============================================================================
// Unit, bool, integers, floats
// ============================================================================

impl VariantTyped for () {
    const VARIANT_TYPE: VariantType = VariantType::Nil;

    fn type_label() -> &'static str {
        "void"
    }
}

impl ToVariant for () {
    fn to_variant(&self) -> Variant {
        Variant::nil()
    }
}

impl FromVariant for () {
    fn from_variant(_variant: &Variant) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl VariantTyped for bool {
    const VARIANT_TYPE: VariantType = VariantType::Bool;
}

impl ToVariant for bool {
    fn to_variant(&self) -> Variant {
        Variant::from_inline(VariantType::Bool, *self as u8)
    }
}

impl FromVariant for bool {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        variant.expect_type(VariantType::Bool)?;
        Ok(variant.read_inline::<u8>() != 0)
    }
}

impl VariantTyped for i64 {
    const VARIANT_TYPE: VariantType = VariantType::Int;
}

impl ToVariant for i64 {
    fn to_variant(&self) -> Variant {
        Variant::from_inline(VariantType::Int, *self)
    }
}

impl FromVariant for i64 {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        variant.expect_type(VariantType::Int)?;
        Ok(variant.read_inline::<i64>())
    }
}

macro_rules! impl_variant_int {
    ($($ty:ty),*) => {
        $(
            impl VariantTyped for $ty {
                const VARIANT_TYPE: VariantType = VariantType::Int;
            }

            impl ToVariant for $ty {
                fn to_variant(&self) -> Variant {
                    Variant::from_inline(VariantType::Int, *self as i64)
                }
            }

            impl FromVariant for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
                    let value = i64::from_variant(variant)?;
                    <$ty>::try_from(value).map_err(|_| ConversionError::IntegerOverflow {
                        value,
                        target_type: stringify!($ty),
                    })
                }
            }
        )*
    };
}

impl_variant_int!(i8, i16, i32, u8, u16, u32, u64);

impl VariantTyped for f64 {
    const VARIANT_TYPE: VariantType = VariantType::Float;
}

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        Variant::from_inline(VariantType::Float, *self)
    }
}

impl FromVariant for f64 {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        // Integers widen to floats like they do in the engine.
        if variant.get_type() == VariantType::Int {
            return Ok(variant.read_inline::<i64>() as f64);
        }
        variant.expect_type(VariantType::Float)?;
        Ok(variant.read_inline::<f64>())
    }
}

impl VariantTyped for f32 {
    const VARIANT_TYPE: VariantType = VariantType::Float;
}

impl ToVariant for f32 {
    fn to_variant(&self) -> Variant {
        Variant::from_inline(VariantType::Float, *self as f64)
    }
}

impl FromVariant for f32 {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        Ok(f64::from_variant(variant)? as f32)
    }
}

// ============================================================================
// Plain-data builtins
// ============================================================================

macro_rules! impl_variant_inline {
    ($($ty:ident),*) => {
        $(
            impl VariantTyped for $ty {
                const VARIANT_TYPE: VariantType = VariantType::$ty;
            }

            impl ToVariant for $ty {
                fn to_variant(&self) -> Variant {
                    Variant::from_inline(VariantType::$ty, *self)
                }
            }

            impl FromVariant for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
                    variant.expect_type(VariantType::$ty)?;
                    Ok(variant.read_inline::<$ty>())
                }
            }
        )*
    };
}

impl_variant_inline!(
    Vector2, Vector2i, Rect2, Rect2i, Vector3, Vector3i, Vector4, Vector4i, Plane, Quaternion,
    Color, Rid
);

macro_rules! impl_variant_boxed {
    ($($ty:ident),*) => {
        $(
            impl VariantTyped for $ty {
                const VARIANT_TYPE: VariantType = VariantType::$ty;
            }

            impl ToVariant for $ty {
                fn to_variant(&self) -> Variant {
                    Variant::from_type_ptr(VariantType::$ty, ptr::from_ref(self).cast())
                }
            }

            impl FromVariant for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
                    variant.read_boxed::<$ty>(VariantType::$ty)
                }
            }
        )*
    };
}

impl_variant_boxed!(Transform2D, Aabb, Basis, Transform3D, Projection);

// ============================================================================
// Rust strings
// ============================================================================

impl VariantTyped for String {
    const VARIANT_TYPE: VariantType = VariantType::String;
}

impl ToVariant for str {
    fn to_variant(&self) -> Variant {
        Variant::from(GString::from(self))
    }
}

impl ToVariant for String {
    fn to_variant(&self) -> Variant {
        self.as_str().to_variant()
    }
}

impl FromVariant for String {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        let text = GString::from_variant(variant)?;
        text.to_rust_string()
            .map_err(|_| ConversionError::NullToken { tag: "String" })
    }
}

// ============================================================================
// Optional values
// ============================================================================

impl<T: ToVariant> ToVariant for Option<T> {
    fn to_variant(&self) -> Variant {
        match self {
            Some(value) => value.to_variant(),
            None => Variant::nil(),
        }
    }
}

impl<T: FromVariant> FromVariant for Option<T> {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        if variant.is_nil() {
            return Ok(None);
        }
        T::from_variant(variant).map(Some)
    }
}

// ============================================================================
// From impls
// ============================================================================

macro_rules! impl_from_for_variant {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Variant {
                fn from(value: $ty) -> Self {
                    value.to_variant()
                }
            }
        )*
    };
}

impl_from_for_variant!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, &str, String, Vector2, Vector2i, Rect2,
    Rect2i, Vector3, Vector3i, Vector4, Vector4i, Plane, Quaternion, Color, Rid, Transform2D,
    Aabb, Basis, Transform3D, Projection
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn integers_round_trip_and_check_range() {
        assert_eq!(Variant::from(-5i32).to::<i32>().unwrap(), -5);
        assert_eq!(Variant::from(u32::MAX).to::<u32>().unwrap(), u32::MAX);
        assert_eq!(
            Variant::from(300i64).to::<u8>().unwrap_err(),
            ConversionError::IntegerOverflow {
                value: 300,
                target_type: "u8"
            }
        );
        assert_eq!(
            Variant::from(-1i64).to::<u64>().unwrap_err(),
            ConversionError::IntegerOverflow {
                value: -1,
                target_type: "u64"
            }
        );
    }

    #[test]
    fn inline_values_round_trip_without_the_engine() {
        assert!(Variant::from(true).to::<bool>().unwrap());
        assert_eq!(Variant::from(2.5f64).to::<f64>().unwrap(), 2.5);
        assert_eq!(Variant::from(3i64).to::<f32>().unwrap(), 3.0);
        let rect = Rect2i {
            position: Vector2i { x: 1, y: 2 },
            size: Vector2i { x: 3, y: 4 },
        };
        assert_eq!(Variant::from(rect).to::<Rect2i>().unwrap(), rect);
        let color = Color::rgba(0.1, 0.2, 0.3, 0.4);
        assert_eq!(Variant::from(color).to::<Color>().unwrap(), color);
        assert_eq!(Variant::from(Rid(77)).to::<Rid>().unwrap(), Rid(77));
    }

    #[test]
    fn type_mismatch_names_both_types() {
        assert_eq!(
            Variant::from(1.0f64).to::<bool>().unwrap_err(),
            ConversionError::TypeMismatch {
                expected: "bool",
                actual: "float"
            }
        );
    }

    #[test]
    fn boxed_values_round_trip_through_the_engine() {
        test_support::load();
        let transform = Transform3D {
            origin: Vector3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let variant = Variant::from(transform);
        assert_eq!(variant.get_type(), VariantType::Transform3D);
        assert_eq!(variant.to::<Transform3D>().unwrap(), transform);

        let projection = Projection::default();
        assert_eq!(Variant::from(projection).to::<Projection>().unwrap(), projection);
    }

    #[test]
    fn options_map_to_nil() {
        assert!(None::<i64>.to_variant().is_nil());
        assert_eq!(Variant::nil().to::<Option<i64>>().unwrap(), None);
        assert_eq!(Variant::from(4i64).to::<Option<i64>>().unwrap(), Some(4));
    }

    #[test]
    fn rust_strings_round_trip() {
        test_support::load();
        let variant = Variant::from("héllo");
        assert_eq!(variant.get_type(), VariantType::String);
        assert_eq!(variant.to::<String>().unwrap(), "héllo");
        assert_eq!(String::type_label(), "String");
        assert_eq!(<()>::type_label(), "void");
    }
}
