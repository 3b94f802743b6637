use gdbridge_sys as sys;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::ConversionError;

/// The engine's variant type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum VariantType {
    Nil = sys::GDEXTENSION_VARIANT_TYPE_NIL,
    Bool = sys::GDEXTENSION_VARIANT_TYPE_BOOL,
    Int = sys::GDEXTENSION_VARIANT_TYPE_INT,
    Float = sys::GDEXTENSION_VARIANT_TYPE_FLOAT,
    String = sys::GDEXTENSION_VARIANT_TYPE_STRING,
    Vector2 = sys::GDEXTENSION_VARIANT_TYPE_VECTOR2,
    Vector2i = sys::GDEXTENSION_VARIANT_TYPE_VECTOR2I,
    Rect2 = sys::GDEXTENSION_VARIANT_TYPE_RECT2,
    Rect2i = sys::GDEXTENSION_VARIANT_TYPE_RECT2I,
    Vector3 = sys::GDEXTENSION_VARIANT_TYPE_VECTOR3,
    Vector3i = sys::GDEXTENSION_VARIANT_TYPE_VECTOR3I,
    Transform2D = sys::GDEXTENSION_VARIANT_TYPE_TRANSFORM2D,
    Vector4 = sys::GDEXTENSION_VARIANT_TYPE_VECTOR4,
    Vector4i = sys::GDEXTENSION_VARIANT_TYPE_VECTOR4I,
    Plane = sys::GDEXTENSION_VARIANT_TYPE_PLANE,
    Quaternion = sys::GDEXTENSION_VARIANT_TYPE_QUATERNION,
    Aabb = sys::GDEXTENSION_VARIANT_TYPE_AABB,
    Basis = sys::GDEXTENSION_VARIANT_TYPE_BASIS,
    Transform3D = sys::GDEXTENSION_VARIANT_TYPE_TRANSFORM3D,
    Projection = sys::GDEXTENSION_VARIANT_TYPE_PROJECTION,
    Color = sys::GDEXTENSION_VARIANT_TYPE_COLOR,
    StringName = sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME,
    NodePath = sys::GDEXTENSION_VARIANT_TYPE_NODE_PATH,
    Rid = sys::GDEXTENSION_VARIANT_TYPE_RID,
    Object = sys::GDEXTENSION_VARIANT_TYPE_OBJECT,
    Callable = sys::GDEXTENSION_VARIANT_TYPE_CALLABLE,
    Signal = sys::GDEXTENSION_VARIANT_TYPE_SIGNAL,
    Dictionary = sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY,
    Array = sys::GDEXTENSION_VARIANT_TYPE_ARRAY,
    PackedByteArray = sys::GDEXTENSION_VARIANT_TYPE_PACKED_BYTE_ARRAY,
    PackedInt32Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_INT32_ARRAY,
    PackedInt64Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_INT64_ARRAY,
    PackedFloat32Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT32_ARRAY,
    PackedFloat64Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT64_ARRAY,
    PackedStringArray = sys::GDEXTENSION_VARIANT_TYPE_PACKED_STRING_ARRAY,
    PackedVector2Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR2_ARRAY,
    PackedVector3Array = sys::GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR3_ARRAY,
    PackedColorArray = sys::GDEXTENSION_VARIANT_TYPE_PACKED_COLOR_ARRAY,
}

/// How a type's payload is stored inside a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// No payload.
    Empty,
    /// Plain data stored at the payload offset.
    Inline,
    /// Plain data the engine keeps out of line; read through its constructors.
    Boxed,
    /// Engine-managed storage that must be destroyed.
    Managed,
}

impl VariantType {
    /// Reads a raw tag, rejecting values outside the known range.
    pub fn from_sys(tag: sys::GDExtensionVariantType) -> Result<Self, ConversionError> {
        VariantType::try_from(tag).map_err(|_| ConversionError::UnknownTag(tag))
    }

    pub fn to_sys(self) -> sys::GDExtensionVariantType {
        self.into()
    }

    pub fn name(self) -> &'static str {
        match self {
            VariantType::Nil => "Nil",
            VariantType::Bool => "bool",
            VariantType::Int => "int",
            VariantType::Float => "float",
            VariantType::String => "String",
            VariantType::Vector2 => "Vector2",
            VariantType::Vector2i => "Vector2i",
            VariantType::Rect2 => "Rect2",
            VariantType::Rect2i => "Rect2i",
            VariantType::Vector3 => "Vector3",
            VariantType::Vector3i => "Vector3i",
            VariantType::Transform2D => "Transform2D",
            VariantType::Vector4 => "Vector4",
            VariantType::Vector4i => "Vector4i",
            VariantType::Plane => "Plane",
            VariantType::Quaternion => "Quaternion",
            VariantType::Aabb => "AABB",
            VariantType::Basis => "Basis",
            VariantType::Transform3D => "Transform3D",
            VariantType::Projection => "Projection",
            VariantType::Color => "Color",
            VariantType::StringName => "StringName",
            VariantType::NodePath => "NodePath",
            VariantType::Rid => "RID",
            VariantType::Object => "Object",
            VariantType::Callable => "Callable",
            VariantType::Signal => "Signal",
            VariantType::Dictionary => "Dictionary",
            VariantType::Array => "Array",
            VariantType::PackedByteArray => "PackedByteArray",
            VariantType::PackedInt32Array => "PackedInt32Array",
            VariantType::PackedInt64Array => "PackedInt64Array",
            VariantType::PackedFloat32Array => "PackedFloat32Array",
            VariantType::PackedFloat64Array => "PackedFloat64Array",
            VariantType::PackedStringArray => "PackedStringArray",
            VariantType::PackedVector2Array => "PackedVector2Array",
            VariantType::PackedVector3Array => "PackedVector3Array",
            VariantType::PackedColorArray => "PackedColorArray",
        }
    }

    /// Size in bytes of the value when passed by pointer-call.
    pub fn ptr_size(self) -> usize {
        match self {
            VariantType::Nil => 0,
            VariantType::Bool => 1,
            VariantType::Int | VariantType::Float | VariantType::Rid => 8,
            VariantType::Vector2 | VariantType::Vector2i => 8,
            VariantType::Vector3 | VariantType::Vector3i => 12,
            VariantType::Rect2
            | VariantType::Rect2i
            | VariantType::Vector4
            | VariantType::Vector4i
            | VariantType::Plane
            | VariantType::Quaternion
            | VariantType::Color => 16,
            VariantType::Transform2D | VariantType::Aabb => 24,
            VariantType::Basis => 36,
            VariantType::Transform3D => 48,
            VariantType::Projection => 64,
            VariantType::String
            | VariantType::StringName
            | VariantType::NodePath
            | VariantType::Object
            | VariantType::Dictionary
            | VariantType::Array => 8,
            VariantType::Callable | VariantType::Signal => 16,
            VariantType::PackedByteArray
            | VariantType::PackedInt32Array
            | VariantType::PackedInt64Array
            | VariantType::PackedFloat32Array
            | VariantType::PackedFloat64Array
            | VariantType::PackedStringArray
            | VariantType::PackedVector2Array
            | VariantType::PackedVector3Array
            | VariantType::PackedColorArray => 16,
        }
    }

    pub fn payload_kind(self) -> PayloadKind {
        match self {
            VariantType::Nil => PayloadKind::Empty,
            VariantType::Bool
            | VariantType::Int
            | VariantType::Float
            | VariantType::Vector2
            | VariantType::Vector2i
            | VariantType::Rect2
            | VariantType::Rect2i
            | VariantType::Vector3
            | VariantType::Vector3i
            | VariantType::Vector4
            | VariantType::Vector4i
            | VariantType::Plane
            | VariantType::Quaternion
            | VariantType::Color
            | VariantType::Rid => PayloadKind::Inline,
            VariantType::Transform2D
            | VariantType::Aabb
            | VariantType::Basis
            | VariantType::Transform3D
            | VariantType::Projection => PayloadKind::Boxed,
            _ => PayloadKind::Managed,
        }
    }

    /// True when copying or dropping a variant of this type needs the engine.
    pub fn needs_engine_lifecycle(self) -> bool {
        matches!(self.payload_kind(), PayloadKind::Boxed | PayloadKind::Managed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_round_trips() {
        for tag in 0..sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX {
            let ty = VariantType::from_sys(tag).unwrap();
            assert_eq!(ty.to_sys(), tag);
        }
    }

    #[test]
    fn out_of_range_tag_is_rejected() {
        assert_eq!(
            VariantType::from_sys(sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX),
            Err(ConversionError::UnknownTag(38))
        );
    }

    #[test]
    fn inline_payloads_fit_the_variant() {
        for tag in 0..sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX {
            let ty = VariantType::from_sys(tag).unwrap();
            if ty.payload_kind() == PayloadKind::Inline {
                assert!(
                    ty.ptr_size()
                        <= sys::GDEXTENSION_VARIANT_SIZE - sys::GDEXTENSION_VARIANT_PAYLOAD_OFFSET,
                    "{} does not fit",
                    ty.name()
                );
            }
        }
    }

    #[test]
    fn containers_need_the_engine() {
        assert!(VariantType::String.needs_engine_lifecycle());
        assert!(VariantType::PackedColorArray.needs_engine_lifecycle());
        assert!(!VariantType::Vector3.needs_engine_lifecycle());
        assert!(!VariantType::Nil.needs_engine_lifecycle());
    }
}
