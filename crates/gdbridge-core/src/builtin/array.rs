use gdbridge_sys as sys;

use super::{builtin_container, call_builtin, Container};
use crate::error::BridgeResult;
use crate::interface::interface;
use crate::variant::{ToVariant, Variant, VariantType};

builtin_container!(
    /// The engine's untyped array of variants.
    VariantArray,
    Array,
    1
);

impl VariantArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> BridgeResult<usize> {
        self.ensure_live()?;
        let len: i64 = unsafe { call_builtin(VariantType::Array, "size", self.sys() as sys::GDExtensionTypePtr, &[])? };
        Ok(len.max(0) as usize)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> BridgeResult<Option<Variant>> {
        if index >= self.len()? {
            return Ok(None);
        }
        let table = interface()?;
        let element =
            unsafe { (table.array_operator_index)(self.sys() as sys::GDExtensionTypePtr, index as i64) };
        if element.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { Variant::from_sys_copy(element) }))
    }

    /// Replaces the element at `index`. Returns false when out of bounds.
    pub fn set(&mut self, index: usize, value: &Variant) -> BridgeResult<bool> {
        if index >= self.len()? {
            return Ok(false);
        }
        let table = interface()?;
        let element = unsafe { (table.array_operator_index)(self.sys_mut(), index as i64) };
        if element.is_null() {
            return Ok(false);
        }
        unsafe {
            (table.variant_destroy)(element);
            (table.variant_new_copy)(element, value.sys());
        }
        Ok(true)
    }

    pub fn push(&mut self, value: &Variant) -> BridgeResult<()> {
        self.ensure_live()?;
        unsafe { call_builtin::<()>(VariantType::Array, "append", self.sys_mut(), &[value.sys()]) }
    }

    pub fn resize(&mut self, len: usize) -> BridgeResult<()> {
        self.ensure_live()?;
        let len = len as i64;
        let _: i64 = unsafe {
            call_builtin(
                VariantType::Array,
                "resize",
                self.sys_mut(),
                &[&len as *const i64 as sys::GDExtensionConstTypePtr],
            )?
        };
        Ok(())
    }

    pub fn clear(&mut self) -> BridgeResult<()> {
        self.ensure_live()?;
        unsafe { call_builtin::<()>(VariantType::Array, "clear", self.sys_mut(), &[]) }
    }

    /// Copies every element out.
    pub fn to_vec(&self) -> BridgeResult<Vec<Variant>> {
        let len = self.len()?;
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            if let Some(value) = self.get(index)? {
                out.push(value);
            }
        }
        Ok(out)
    }

    pub fn from_slice<T: ToVariant>(values: &[T]) -> BridgeResult<Self> {
        let mut array = Self::new();
        for value in values {
            array.push(&value.to_variant())?;
        }
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn push_get_set() {
        test_support::load();
        let mut array = VariantArray::new();
        assert!(array.is_empty().unwrap());

        array.push(&Variant::from(1i64)).unwrap();
        array.push(&Variant::from("two")).unwrap();
        assert_eq!(array.len().unwrap(), 2);
        assert_eq!(array.get(0).unwrap().unwrap().to::<i64>().unwrap(), 1);
        assert_eq!(array.get(1).unwrap().unwrap().to::<String>().unwrap(), "two");
        assert!(array.get(2).unwrap().is_none());

        assert!(array.set(0, &Variant::from(7i64)).unwrap());
        assert!(!array.set(5, &Variant::nil()).unwrap());
        assert_eq!(array.get(0).unwrap().unwrap().to::<i64>().unwrap(), 7);
    }

    #[test]
    fn resize_and_clear() {
        test_support::load();
        let mut array = VariantArray::from_slice(&[1i64, 2, 3]).unwrap();
        array.resize(5).unwrap();
        assert_eq!(array.len().unwrap(), 5);
        assert!(array.get(4).unwrap().unwrap().is_nil());
        array.clear().unwrap();
        assert!(array.is_empty().unwrap());
    }

    #[test]
    fn consumed_array_reports_instead_of_touching_storage() {
        test_support::load();
        let mut array = VariantArray::from_slice(&[1i64]).unwrap();
        let variant = Variant::take_from(&mut array);
        assert_eq!(variant.get_type(), VariantType::Array);
        assert!(matches!(
            array.len(),
            Err(crate::error::BridgeError::ContainerConsumed { type_name: "VariantArray" })
        ));
    }
}
