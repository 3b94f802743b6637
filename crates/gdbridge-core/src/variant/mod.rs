//! The engine's tagged dynamic value.
//!
//! A [`Variant`] is 24 bytes: a 32-bit type tag at offset 0 and the payload at
//! offset 8. Small plain-data payloads are stored inline and read or written
//! directly. Everything else is engine-managed and only ever touched through
//! the engine's typed constructors, so the codec never assumes anything about
//! the layout of a managed payload.
//!
//! The tag is always inspected before the payload. An out-of-range tag is
//! decoded as nil and logged.

use std::any::Any;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ptr;

use gdbridge_sys as sys;

use crate::builtin::*;
use crate::classes::Object;
use crate::error::ConversionError;
use crate::interface::interface;
use crate::obj::Obj;

mod convert;
mod variant_type;

pub use convert::{FromVariant, ToVariant, VariantTyped};
pub use variant_type::{PayloadKind, VariantType};

/// An engine variant owned by the host.
#[repr(C, align(8))]
pub struct Variant {
    storage: sys::GDExtensionVariantStorage,
}

// Managed payloads are reference counted by the engine.
unsafe impl Send for Variant {}

impl Variant {
    pub const fn nil() -> Self {
        Self {
            storage: sys::GDExtensionVariantStorage {
                tag: sys::GDEXTENSION_VARIANT_TYPE_NIL,
                padding: 0,
                payload: [0; 2],
            },
        }
    }

    /// Raw tag as stored, without range checking.
    pub fn raw_tag(&self) -> u32 {
        self.storage.tag
    }

    /// Type carried by this variant. Out-of-range tags read as nil.
    pub fn get_type(&self) -> VariantType {
        VariantType::from_sys(self.storage.tag).unwrap_or(VariantType::Nil)
    }

    pub fn is_nil(&self) -> bool {
        self.get_type() == VariantType::Nil
    }

    pub fn sys(&self) -> sys::GDExtensionConstVariantPtr {
        (&self.storage as *const sys::GDExtensionVariantStorage).cast()
    }

    pub fn sys_mut(&mut self) -> sys::GDExtensionVariantPtr {
        (&mut self.storage as *mut sys::GDExtensionVariantStorage).cast()
    }

    /// Reinterprets an engine-owned variant without copying it.
    ///
    /// # Safety
    /// `ptr` must point to a live variant that outlives `'a`.
    pub unsafe fn borrow_sys<'a>(ptr: sys::GDExtensionConstVariantPtr) -> &'a Variant {
        unsafe { &*(ptr as *const Variant) }
    }

    /// Copies an engine-owned variant into a host-owned one.
    ///
    /// # Safety
    /// `ptr` must point to a live variant.
    pub unsafe fn from_sys_copy(ptr: sys::GDExtensionConstVariantPtr) -> Variant {
        unsafe { Self::borrow_sys(ptr) }.clone()
    }

    /// Adopts a variant the engine wrote into uninitialized storage.
    ///
    /// # Safety
    /// `init` must initialize the variant it is given.
    pub unsafe fn from_sys_init(init: impl FnOnce(sys::GDExtensionUninitializedVariantPtr)) -> Variant {
        let mut storage = MaybeUninit::<sys::GDExtensionVariantStorage>::zeroed();
        init(storage.as_mut_ptr().cast());
        Variant {
            storage: unsafe { storage.assume_init() },
        }
    }

    /// Moves this variant into uninitialized engine storage.
    ///
    /// # Safety
    /// `dest` must be writable and uninitialized.
    pub unsafe fn move_into_sys(self, dest: sys::GDExtensionUninitializedVariantPtr) {
        let this = mem::ManuallyDrop::new(self);
        unsafe { ptr::write(dest as *mut sys::GDExtensionVariantStorage, this.storage) };
    }

    // ========================================================================
    // Payload access
    // ========================================================================

    /// Stores a plain-data payload inline.
    pub(crate) fn from_inline<T: Copy>(ty: VariantType, value: T) -> Variant {
        debug_assert_eq!(ty.payload_kind(), PayloadKind::Inline);
        debug_assert!(mem::size_of::<T>() <= mem::size_of::<[u64; 2]>());
        let mut variant = Variant::nil();
        variant.storage.tag = ty.to_sys();
        unsafe { ptr::write_unaligned(variant.storage.payload.as_mut_ptr().cast::<T>(), value) };
        variant
    }

    /// Reads an inline payload after the tag was checked.
    pub(crate) fn read_inline<T: Copy>(&self) -> T {
        unsafe { ptr::read_unaligned(self.storage.payload.as_ptr().cast::<T>()) }
    }

    /// Builds a variant of type `ty` from a value the engine reads through `src`.
    pub(crate) fn from_type_ptr(ty: VariantType, src: sys::GDExtensionConstTypePtr) -> Variant {
        let ctor = match interface() {
            Ok(table) => table.lifecycle(ty).from_type,
            Err(err) => {
                log::error!("cannot build {} variant: {}", ty.name(), err);
                return Variant::nil();
            }
        };
        match ctor {
            Some(ctor) => unsafe { Variant::from_sys_init(|dest| ctor(dest, src as sys::GDExtensionTypePtr)) },
            None => {
                log::error!("engine has no variant constructor for {}", ty.name());
                Variant::nil()
            }
        }
    }

    /// Writes this variant's payload into `dest` through the engine's typed decoder.
    pub(crate) fn to_type_ptr(
        &self,
        ty: VariantType,
        dest: sys::GDExtensionUninitializedTypePtr,
    ) -> Result<(), ConversionError> {
        self.expect_type(ty)?;
        let ctor = interface()
            .ok()
            .and_then(|table| table.lifecycle(ty).to_type)
            .ok_or(ConversionError::Unrecognised { type_name: ty.name() })?;
        unsafe { ctor(dest, self.sys() as sys::GDExtensionVariantPtr) };
        Ok(())
    }

    pub(crate) fn expect_type(&self, ty: VariantType) -> Result<(), ConversionError> {
        let actual = VariantType::from_sys(self.storage.tag)?;
        if actual != ty {
            return Err(ConversionError::TypeMismatch {
                expected: ty.name(),
                actual: actual.name(),
            });
        }
        Ok(())
    }

    /// Reads a plain-data payload the engine keeps out of line.
    pub(crate) fn read_boxed<T: Copy>(&self, ty: VariantType) -> Result<T, ConversionError> {
        let mut out = MaybeUninit::<T>::zeroed();
        self.to_type_ptr(ty, out.as_mut_ptr().cast())?;
        Ok(unsafe { out.assume_init() })
    }

    // ========================================================================
    // Containers
    // ========================================================================

    /// Copies a container into a new variant. The container stays valid.
    pub fn from_container<C: Container>(value: &C) -> Variant {
        if value.ensure_live().is_err() {
            return Variant::nil();
        }
        Variant::from_type_ptr(C::VARIANT_TYPE, value.sys())
    }

    /// Moves a container into a new variant.
    ///
    /// Owned tokens are transferred and marked consumed; borrowed tokens are
    /// copied and remain valid. A consumed token yields nil and a diagnostic.
    pub fn take_from<C: Container>(value: &mut C) -> Variant {
        match value.ownership() {
            Ownership::Owned => {
                let variant = Variant::from_type_ptr(C::VARIANT_TYPE, value.sys());
                unsafe { destroy(C::VARIANT_TYPE, value.sys_mut()) };
                value.mark_consumed();
                variant
            }
            Ownership::Borrowed => Variant::from_container(value),
            Ownership::Consumed => {
                let _ = value.ensure_live();
                Variant::nil()
            }
        }
    }

    /// Extracts an owned container token.
    pub fn to_container<C: Container>(&self) -> Result<C, ConversionError> {
        self.expect_type(C::VARIANT_TYPE)?;
        let mut result = Ok(());
        let mut value =
            unsafe { C::construct_with(|dest| result = self.to_type_ptr(C::VARIANT_TYPE, dest)) };
        if let Err(err) = result {
            value.mark_consumed();
            return Err(err);
        }
        if unsafe { ptr::read(value.sys() as *const usize) } == 0 {
            value.mark_consumed();
            return Err(ConversionError::NullToken {
                tag: C::VARIANT_TYPE.name(),
            });
        }
        Ok(value)
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Converts to a host type.
    pub fn to<T: FromVariant>(&self) -> Result<T, ConversionError> {
        T::from_variant(self)
    }

    /// Converts to a host type, logging and falling back to the type's default on failure.
    pub fn to_or_default<T: FromVariant + Default>(&self) -> T {
        self.to().unwrap_or_else(|err| {
            log::error!("{}", err);
            T::default()
        })
    }

    /// Converts any recognised host value. Unrecognised types become nil and
    /// are logged.
    pub fn from_any<T: Any>(value: &T) -> Variant {
        match Self::try_from_any(value) {
            Ok(variant) => variant,
            Err(err) => {
                log::error!("{}", err);
                Variant::nil()
            }
        }
    }

    pub fn try_from_any<T: Any>(value: &T) -> Result<Variant, ConversionError> {
        let any = value as &dyn Any;
        macro_rules! try_types {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(value) = any.downcast_ref::<$ty>() {
                        return Ok(value.to_variant());
                    }
                )*
            };
        }
        try_types!(
            Variant, Value, (), bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String,
            &'static str, GString, StringName, NodePath, Vector2, Vector2i, Rect2, Rect2i, Vector3,
            Vector3i, Transform2D, Vector4, Vector4i, Plane, Quaternion, Aabb, Basis, Transform3D,
            Projection, Color, Rid, Dictionary, VariantArray, PackedByteArray, PackedInt32Array,
            PackedInt64Array, PackedFloat32Array, PackedFloat64Array, PackedStringArray,
            PackedVector2Array, PackedVector3Array, PackedColorArray, Obj<Object>,
        );
        Err(ConversionError::Unrecognised {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Decodes into the host value matching the tag.
    pub fn decode(&self) -> Value {
        match self.try_decode() {
            Ok(value) => value,
            Err(err) => {
                log::error!("decoding variant as nil: {}", err);
                Value::Nil
            }
        }
    }

    pub fn try_decode(&self) -> Result<Value, ConversionError> {
        let ty = VariantType::from_sys(self.storage.tag)?;
        Ok(match ty {
            VariantType::Nil => Value::Nil,
            VariantType::Bool => Value::Bool(self.to()?),
            VariantType::Int => Value::Int(self.to()?),
            VariantType::Float => Value::Float(self.to()?),
            VariantType::String => Value::String(self.to()?),
            VariantType::Vector2 => Value::Vector2(self.to()?),
            VariantType::Vector2i => Value::Vector2i(self.to()?),
            VariantType::Rect2 => Value::Rect2(self.to()?),
            VariantType::Rect2i => Value::Rect2i(self.to()?),
            VariantType::Vector3 => Value::Vector3(self.to()?),
            VariantType::Vector3i => Value::Vector3i(self.to()?),
            VariantType::Transform2D => Value::Transform2D(self.to()?),
            VariantType::Vector4 => Value::Vector4(self.to()?),
            VariantType::Vector4i => Value::Vector4i(self.to()?),
            VariantType::Plane => Value::Plane(self.to()?),
            VariantType::Quaternion => Value::Quaternion(self.to()?),
            VariantType::Aabb => Value::Aabb(self.to()?),
            VariantType::Basis => Value::Basis(self.to()?),
            VariantType::Transform3D => Value::Transform3D(self.to()?),
            VariantType::Projection => Value::Projection(self.to()?),
            VariantType::Color => Value::Color(self.to()?),
            VariantType::StringName => Value::StringName(self.to()?),
            VariantType::NodePath => Value::NodePath(self.to()?),
            VariantType::Rid => Value::Rid(self.to()?),
            VariantType::Object => match self.to::<Obj<Object>>() {
                Ok(object) => Value::Object(Some(object)),
                Err(ConversionError::NullToken { .. }) => Value::Object(None),
                Err(err) => return Err(err),
            },
            VariantType::Callable => Value::Callable(self.clone()),
            VariantType::Signal => Value::Signal(self.clone()),
            VariantType::Dictionary => Value::Dictionary(self.to()?),
            VariantType::Array => Value::Array(self.to()?),
            VariantType::PackedByteArray => Value::PackedByteArray(self.to()?),
            VariantType::PackedInt32Array => Value::PackedInt32Array(self.to()?),
            VariantType::PackedInt64Array => Value::PackedInt64Array(self.to()?),
            VariantType::PackedFloat32Array => Value::PackedFloat32Array(self.to()?),
            VariantType::PackedFloat64Array => Value::PackedFloat64Array(self.to()?),
            VariantType::PackedStringArray => Value::PackedStringArray(self.to()?),
            VariantType::PackedVector2Array => Value::PackedVector2Array(self.to()?),
            VariantType::PackedVector3Array => Value::PackedVector3Array(self.to()?),
            VariantType::PackedColorArray => Value::PackedColorArray(self.to()?),
        })
    }

    // ========================================================================
    // Engine operators
    // ========================================================================

    /// Equality under the engine's own comparison operator.
    pub fn engine_eq(&self, other: &Variant) -> bool {
        let Ok(table) = interface() else {
            return self.storage == other.storage;
        };
        let mut valid: sys::GDExtensionBool = 0;
        let result = unsafe {
            Variant::from_sys_init(|dest| {
                (table.variant_evaluate)(
                    sys::GDEXTENSION_VARIANT_OP_EQUAL,
                    self.sys(),
                    other.sys(),
                    dest,
                    &mut valid,
                )
            })
        };
        valid != 0 && result.to::<bool>().unwrap_or(false)
    }

    /// The engine's textual representation.
    pub fn stringify(&self) -> String {
        let Ok(table) = interface() else {
            return format!("<{}>", self.get_type().name());
        };
        let text = unsafe {
            GString::construct_with(|dest| {
                construct_default(VariantType::String, dest);
                (table.variant_stringify)(self.sys(), dest);
            })
        };
        text.to_rust_string().unwrap_or_default()
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::nil()
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        if !self.get_type().needs_engine_lifecycle() {
            return Variant {
                storage: self.storage,
            };
        }
        match interface() {
            Ok(table) => unsafe {
                Variant::from_sys_init(|dest| (table.variant_new_copy)(dest, self.sys()))
            },
            Err(err) => {
                log::error!("cannot copy {} variant: {}", self.get_type().name(), err);
                Variant::nil()
            }
        }
    }
}

impl Drop for Variant {
    fn drop(&mut self) {
        if !self.get_type().needs_engine_lifecycle() {
            return;
        }
        if let Ok(table) = interface() {
            unsafe { (table.variant_destroy)(self.sys_mut()) };
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.engine_eq(other)
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match VariantType::from_sys(self.storage.tag) {
            Ok(ty) if ty.payload_kind() == PayloadKind::Inline || ty == VariantType::Nil => {
                write!(f, "{}({})", ty.name(), self.stringify())
            }
            Ok(ty) => write!(f, "{}(..)", ty.name()),
            Err(_) => write!(f, "Variant(tag {})", self.storage.tag),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

// ============================================================================
// Decoded values
// ============================================================================

/// Host value of every variant type.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(GString),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Rect2(Rect2),
    Rect2i(Rect2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Transform2D(Transform2D),
    Vector4(Vector4),
    Vector4i(Vector4i),
    Plane(Plane),
    Quaternion(Quaternion),
    Aabb(Aabb),
    Basis(Basis),
    Transform3D(Transform3D),
    Projection(Projection),
    Color(Color),
    StringName(StringName),
    NodePath(NodePath),
    Rid(Rid),
    Object(Option<Obj<Object>>),
    /// Callables are kept as variants; the bridge never inspects them.
    Callable(Variant),
    Signal(Variant),
    Dictionary(Dictionary),
    Array(VariantArray),
    PackedByteArray(PackedByteArray),
    PackedInt32Array(PackedInt32Array),
    PackedInt64Array(PackedInt64Array),
    PackedFloat32Array(PackedFloat32Array),
    PackedFloat64Array(PackedFloat64Array),
    PackedStringArray(PackedStringArray),
    PackedVector2Array(PackedVector2Array),
    PackedVector3Array(PackedVector3Array),
    PackedColorArray(PackedColorArray),
}

impl Value {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Value::Nil => VariantType::Nil,
            Value::Bool(_) => VariantType::Bool,
            Value::Int(_) => VariantType::Int,
            Value::Float(_) => VariantType::Float,
            Value::String(_) => VariantType::String,
            Value::Vector2(_) => VariantType::Vector2,
            Value::Vector2i(_) => VariantType::Vector2i,
            Value::Rect2(_) => VariantType::Rect2,
            Value::Rect2i(_) => VariantType::Rect2i,
            Value::Vector3(_) => VariantType::Vector3,
            Value::Vector3i(_) => VariantType::Vector3i,
            Value::Transform2D(_) => VariantType::Transform2D,
            Value::Vector4(_) => VariantType::Vector4,
            Value::Vector4i(_) => VariantType::Vector4i,
            Value::Plane(_) => VariantType::Plane,
            Value::Quaternion(_) => VariantType::Quaternion,
            Value::Aabb(_) => VariantType::Aabb,
            Value::Basis(_) => VariantType::Basis,
            Value::Transform3D(_) => VariantType::Transform3D,
            Value::Projection(_) => VariantType::Projection,
            Value::Color(_) => VariantType::Color,
            Value::StringName(_) => VariantType::StringName,
            Value::NodePath(_) => VariantType::NodePath,
            Value::Rid(_) => VariantType::Rid,
            Value::Object(_) => VariantType::Object,
            Value::Callable(_) => VariantType::Callable,
            Value::Signal(_) => VariantType::Signal,
            Value::Dictionary(_) => VariantType::Dictionary,
            Value::Array(_) => VariantType::Array,
            Value::PackedByteArray(_) => VariantType::PackedByteArray,
            Value::PackedInt32Array(_) => VariantType::PackedInt32Array,
            Value::PackedInt64Array(_) => VariantType::PackedInt64Array,
            Value::PackedFloat32Array(_) => VariantType::PackedFloat32Array,
            Value::PackedFloat64Array(_) => VariantType::PackedFloat64Array,
            Value::PackedStringArray(_) => VariantType::PackedStringArray,
            Value::PackedVector2Array(_) => VariantType::PackedVector2Array,
            Value::PackedVector3Array(_) => VariantType::PackedVector3Array,
            Value::PackedColorArray(_) => VariantType::PackedColorArray,
        }
    }
}

impl From<Value> for Variant {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => Variant::nil(),
            Value::Bool(v) => v.to_variant(),
            Value::Int(v) => v.to_variant(),
            Value::Float(v) => v.to_variant(),
            Value::String(v) => v.into(),
            Value::Vector2(v) => v.to_variant(),
            Value::Vector2i(v) => v.to_variant(),
            Value::Rect2(v) => v.to_variant(),
            Value::Rect2i(v) => v.to_variant(),
            Value::Vector3(v) => v.to_variant(),
            Value::Vector3i(v) => v.to_variant(),
            Value::Transform2D(v) => v.to_variant(),
            Value::Vector4(v) => v.to_variant(),
            Value::Vector4i(v) => v.to_variant(),
            Value::Plane(v) => v.to_variant(),
            Value::Quaternion(v) => v.to_variant(),
            Value::Aabb(v) => v.to_variant(),
            Value::Basis(v) => v.to_variant(),
            Value::Transform3D(v) => v.to_variant(),
            Value::Projection(v) => v.to_variant(),
            Value::Color(v) => v.to_variant(),
            Value::StringName(v) => v.into(),
            Value::NodePath(v) => v.into(),
            Value::Rid(v) => v.to_variant(),
            Value::Object(v) => v.to_variant(),
            Value::Callable(v) | Value::Signal(v) => v,
            Value::Dictionary(v) => v.into(),
            Value::Array(v) => v.into(),
            Value::PackedByteArray(v) => v.into(),
            Value::PackedInt32Array(v) => v.into(),
            Value::PackedInt64Array(v) => v.into(),
            Value::PackedFloat32Array(v) => v.into(),
            Value::PackedFloat64Array(v) => v.into(),
            Value::PackedStringArray(v) => v.into(),
            Value::PackedVector2Array(v) => v.into(),
            Value::PackedVector3Array(v) => v.into(),
            Value::PackedColorArray(v) => v.into(),
        }
    }
}

impl ToVariant for Value {
    fn to_variant(&self) -> Variant {
        Variant::from(self.clone())
    }
}

impl FromVariant for Value {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        variant.try_decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn layout_is_24_bytes_with_payload_at_8() {
        assert_eq!(mem::size_of::<Variant>(), sys::GDEXTENSION_VARIANT_SIZE);
        let variant = Variant::from(0x0102_0304_0506_0708i64);
        let bytes: [u8; 24] = unsafe { mem::transmute_copy(&variant) };
        assert_eq!(&bytes[0..4], &sys::GDEXTENSION_VARIANT_TYPE_INT.to_le_bytes());
        assert_eq!(&bytes[8..16], &0x0102_0304_0506_0708i64.to_le_bytes());
    }

    #[test]
    fn out_of_range_tag_decodes_as_nil() {
        let mut variant = Variant::nil();
        variant.storage.tag = 200;
        assert_eq!(variant.get_type(), VariantType::Nil);
        assert!(matches!(variant.decode(), Value::Nil));
        assert_eq!(variant.try_decode().unwrap_err(), ConversionError::UnknownTag(200));
        // Never handed to the engine destructor.
        mem::forget(variant);
    }

    #[test]
    fn null_container_token_decodes_as_nil() {
        test_support::load();
        let mut variant = Variant::nil();
        variant.storage.tag = VariantType::Dictionary.to_sys();
        assert_eq!(
            variant.to::<Dictionary>().unwrap_err(),
            ConversionError::NullToken { tag: "Dictionary" }
        );
        assert!(matches!(variant.decode(), Value::Nil));
        mem::forget(variant);
    }

    #[test]
    fn every_decoded_value_reports_its_tag() {
        test_support::load();
        let samples = [
            Variant::nil(),
            Variant::from(true),
            Variant::from(3i64),
            Variant::from(0.25f64),
            Variant::from("text"),
            Variant::from(Vector2::new(1.0, 2.0)),
            Variant::from(Transform2D::default()),
            Variant::from(Basis::default()),
            Variant::from(Color::rgba(1.0, 0.5, 0.0, 1.0)),
            Variant::from(StringName::from("name")),
            Variant::from(Rid(9)),
            Variant::from(VariantArray::new()),
            Variant::from(PackedInt32Array::from_slice(&[1, 2]).unwrap()),
        ];
        for variant in &samples {
            assert_eq!(variant.decode().variant_type(), variant.get_type());
        }
    }

    #[test]
    fn decoded_value_encodes_back_to_an_equal_variant() {
        test_support::load();
        let original = Variant::from(Aabb {
            position: Vector3::new(1.0, 2.0, 3.0),
            size: Vector3::new(4.0, 5.0, 6.0),
        });
        let round = Variant::from(original.decode());
        assert!(original.engine_eq(&round));
        assert!(!original.engine_eq(&Variant::from(1i64)));
    }

    #[test]
    fn unrecognised_host_type_becomes_nil() {
        struct Opaque;
        test_support::load();
        let variant = Variant::from_any(&Opaque);
        assert!(variant.is_nil());
        assert!(matches!(
            Variant::try_from_any(&Opaque),
            Err(ConversionError::Unrecognised { .. })
        ));
        assert_eq!(Variant::from_any(&5i32).to::<i64>().unwrap(), 5);
    }

    #[test]
    fn stringify_uses_engine_text() {
        test_support::load();
        assert_eq!(Variant::from(42i64).stringify(), "42");
        assert_eq!(Variant::from("hi").stringify(), "hi");
        assert_eq!(Variant::nil().stringify(), "<null>");
    }
}
