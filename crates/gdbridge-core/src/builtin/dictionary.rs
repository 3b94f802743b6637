use gdbridge_sys as sys;

use super::{builtin_container, call_builtin, Container, VariantArray};
use crate::error::BridgeResult;
use crate::interface::interface;
use crate::variant::{Variant, VariantType};

builtin_container!(
    /// The engine's variant-keyed dictionary.
    Dictionary,
    Dictionary,
    1
);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> BridgeResult<usize> {
        self.ensure_live()?;
        let len: i64 = unsafe {
            call_builtin(VariantType::Dictionary, "size", self.sys() as sys::GDExtensionTypePtr, &[])?
        };
        Ok(len.max(0) as usize)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn contains_key(&self, key: &Variant) -> BridgeResult<bool> {
        self.ensure_live()?;
        unsafe {
            call_builtin(
                VariantType::Dictionary,
                "has",
                self.sys() as sys::GDExtensionTypePtr,
                &[key.sys()],
            )
        }
    }

    /// Copy of the value stored under `key`.
    pub fn get(&self, key: &Variant) -> BridgeResult<Option<Variant>> {
        // Indexing inserts missing keys, so check first.
        if !self.contains_key(key)? {
            return Ok(None);
        }
        let table = interface()?;
        let value = unsafe {
            (table.dictionary_operator_index)(self.sys() as sys::GDExtensionTypePtr, key.sys())
        };
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { Variant::from_sys_copy(value) }))
    }

    pub fn insert(&mut self, key: &Variant, value: &Variant) -> BridgeResult<()> {
        self.ensure_live()?;
        let table = interface()?;
        let slot = unsafe { (table.dictionary_operator_index)(self.sys_mut(), key.sys()) };
        if slot.is_null() {
            return Ok(());
        }
        unsafe {
            (table.variant_destroy)(slot);
            (table.variant_new_copy)(slot, value.sys());
        }
        Ok(())
    }

    /// Removes `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &Variant) -> BridgeResult<bool> {
        self.ensure_live()?;
        unsafe { call_builtin(VariantType::Dictionary, "erase", self.sys_mut(), &[key.sys()]) }
    }

    pub fn keys(&self) -> BridgeResult<VariantArray> {
        self.ensure_live()?;
        unsafe {
            call_builtin(VariantType::Dictionary, "keys", self.sys() as sys::GDExtensionTypePtr, &[])
        }
    }

    pub fn clear(&mut self) -> BridgeResult<()> {
        self.ensure_live()?;
        unsafe { call_builtin::<()>(VariantType::Dictionary, "clear", self.sys_mut(), &[]) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn insert_get_remove() {
        test_support::load();
        let mut dict = Dictionary::new();
        let key = Variant::from("speed");
        dict.insert(&key, &Variant::from(1.5f64)).unwrap();

        assert_eq!(dict.len().unwrap(), 1);
        assert!(dict.contains_key(&key).unwrap());
        assert_eq!(dict.get(&key).unwrap().unwrap().to::<f64>().unwrap(), 1.5);
        assert!(dict.get(&Variant::from("missing")).unwrap().is_none());
        assert_eq!(dict.len().unwrap(), 1);

        assert!(dict.remove(&key).unwrap());
        assert!(!dict.remove(&key).unwrap());
        assert!(dict.is_empty().unwrap());
    }

    #[test]
    fn keys_preserve_insertion_order() {
        test_support::load();
        let mut dict = Dictionary::new();
        dict.insert(&Variant::from(3i64), &Variant::nil()).unwrap();
        dict.insert(&Variant::from(1i64), &Variant::nil()).unwrap();

        let keys = dict.keys().unwrap().to_vec().unwrap();
        let keys: Vec<i64> = keys.iter().map(|k| k.to::<i64>().unwrap()).collect();
        assert_eq!(keys, vec![3, 1]);
    }
}
