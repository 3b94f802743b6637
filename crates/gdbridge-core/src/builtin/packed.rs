//! Packed arrays.
//!
//! Packed arrays store their elements contiguously, so besides element access
//! they support bulk exchange with Rust slices through the address of the
//! first element.

use std::ptr;

use gdbridge_sys as sys;

use super::{builtin_container, call_builtin, Color, Container, GString, Vector2, Vector3};
use crate::error::BridgeResult;
use crate::interface::{interface, InterfaceTable};
use crate::variant::VariantType;

macro_rules! packed_array {
    ($(#[$attr:meta])* $name:ident, $vty:ident, $elem:ty, $index:ident) => {
        builtin_container!($(#[$attr])* $name, $vty, 2);

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn len(&self) -> BridgeResult<usize> {
                self.ensure_live()?;
                let len: i64 = unsafe {
                    call_builtin(VariantType::$vty, "size", self.sys() as sys::GDExtensionTypePtr, &[])?
                };
                Ok(len.max(0) as usize)
            }

            pub fn is_empty(&self) -> BridgeResult<bool> {
                Ok(self.len()? == 0)
            }

            pub fn resize(&mut self, len: usize) -> BridgeResult<()> {
                self.ensure_live()?;
                let len = len as i64;
                let _: i64 = unsafe {
                    call_builtin(
                        VariantType::$vty,
                        "resize",
                        self.sys_mut(),
                        &[&len as *const i64 as sys::GDExtensionConstTypePtr],
                    )?
                };
                Ok(())
            }

            fn element(&self, table: &InterfaceTable, index: usize) -> *const $elem {
                unsafe { (table.$index)(self.sys() as sys::GDExtensionTypePtr, index as i64) as *const $elem }
            }

            fn element_mut(&mut self, table: &InterfaceTable, index: usize) -> *mut $elem {
                unsafe { (table.$index)(self.sys_mut(), index as i64) as *mut $elem }
            }

            pub fn get(&self, index: usize) -> BridgeResult<Option<$elem>> {
                if index >= self.len()? {
                    return Ok(None);
                }
                let element = self.element(interface()?, index);
                if element.is_null() {
                    return Ok(None);
                }
                Ok(Some(unsafe { ptr::read(element) }))
            }

            /// Replaces the element at `index`. Returns false when out of bounds.
            pub fn set(&mut self, index: usize, value: $elem) -> BridgeResult<bool> {
                if index >= self.len()? {
                    return Ok(false);
                }
                let element = self.element_mut(interface()?, index);
                if element.is_null() {
                    return Ok(false);
                }
                unsafe { ptr::write(element, value) };
                Ok(true)
            }

            /// Copies every element out in one pass.
            pub fn to_vec(&self) -> BridgeResult<Vec<$elem>> {
                let len = self.len()?;
                if len == 0 {
                    return Ok(Vec::new());
                }
                let first = self.element(interface()?, 0);
                if first.is_null() {
                    return Ok(Vec::new());
                }
                Ok(unsafe { std::slice::from_raw_parts(first, len) }.to_vec())
            }

            /// Builds an array holding a copy of `values`.
            pub fn from_slice(values: &[$elem]) -> BridgeResult<Self> {
                let mut array = Self::new();
                array.resize(values.len())?;
                if !values.is_empty() {
                    let first = array.element_mut(interface()?, 0);
                    if !first.is_null() {
                        unsafe { ptr::copy_nonoverlapping(values.as_ptr(), first, values.len()) };
                    }
                }
                Ok(array)
            }
        }
    };
}

packed_array!(PackedByteArray, PackedByteArray, u8, packed_byte_array_operator_index);
packed_array!(PackedInt32Array, PackedInt32Array, i32, packed_int32_array_operator_index);
packed_array!(PackedInt64Array, PackedInt64Array, i64, packed_int64_array_operator_index);
packed_array!(PackedFloat32Array, PackedFloat32Array, f32, packed_float32_array_operator_index);
packed_array!(PackedFloat64Array, PackedFloat64Array, f64, packed_float64_array_operator_index);
packed_array!(PackedVector2Array, PackedVector2Array, Vector2, packed_vector2_array_operator_index);
packed_array!(PackedVector3Array, PackedVector3Array, Vector3, packed_vector3_array_operator_index);
packed_array!(PackedColorArray, PackedColorArray, Color, packed_color_array_operator_index);

builtin_container!(
    /// Packed array of engine strings. Elements are string tokens owned by the array.
    PackedStringArray,
    PackedStringArray,
    2
);

impl PackedStringArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> BridgeResult<usize> {
        self.ensure_live()?;
        let len: i64 = unsafe {
            call_builtin(
                VariantType::PackedStringArray,
                "size",
                self.sys() as sys::GDExtensionTypePtr,
                &[],
            )?
        };
        Ok(len.max(0) as usize)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn push(&mut self, value: &str) -> BridgeResult<()> {
        self.ensure_live()?;
        let value = GString::from(value);
        let _: bool = unsafe {
            call_builtin(
                VariantType::PackedStringArray,
                "append",
                self.sys_mut(),
                &[value.sys()],
            )?
        };
        Ok(())
    }

    pub fn get(&self, index: usize) -> BridgeResult<Option<String>> {
        if index >= self.len()? {
            return Ok(None);
        }
        let table = interface()?;
        let element = unsafe {
            (table.packed_string_array_operator_index)(self.sys() as sys::GDExtensionTypePtr, index as i64)
        };
        if element.is_null() {
            return Ok(None);
        }
        let borrowed = unsafe { GString::borrowed(element) };
        borrowed.to_rust_string().map(Some)
    }

    pub fn to_vec(&self) -> BridgeResult<Vec<String>> {
        let len = self.len()?;
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            if let Some(value) = self.get(index)? {
                out.push(value);
            }
        }
        Ok(out)
    }

    pub fn from_slice<S: AsRef<str>>(values: &[S]) -> BridgeResult<Self> {
        let mut array = Self::new();
        for value in values {
            array.push(value.as_ref())?;
        }
        Ok(array)
    }
}
