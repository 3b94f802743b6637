//! String-like tokens.
//!
//! The engine stores text as UTF-32. Conversions from Rust strings transcode
//! through the engine's wide-character entry points; code points the engine
//! holds that are not valid Unicode scalar values become U+FFFD.

use std::fmt;
use std::ptr;

use gdbridge_sys as sys;

use super::{builtin_container, construct_from, Container};
use crate::error::BridgeResult;
use crate::interface::interface;
use crate::variant::VariantType;

builtin_container!(
    /// The engine's string type.
    GString,
    String,
    1
);

builtin_container!(
    /// Interned engine string used for class, method, property and signal names.
    StringName,
    StringName,
    1
);

builtin_container!(
    /// Scene-tree path.
    NodePath,
    NodePath,
    1
);

// String constructor index taking a node path.
const STRING_FROM_NODE_PATH: i32 = 3;

// ============================================================================
// GString
// ============================================================================

impl GString {
    /// Builds an engine string from UTF-8 text.
    pub fn new(text: &str) -> Self {
        let chars: Vec<u32> = text.chars().map(u32::from).collect();
        match interface() {
            Ok(table) => unsafe {
                Self::construct_with(|dest| {
                    (table.string_new_with_utf32_chars_and_len)(
                        dest,
                        chars.as_ptr(),
                        chars.len() as i64,
                    )
                })
            },
            Err(err) => {
                log::error!("cannot build string: {}", err);
                Self::default()
            }
        }
    }

    /// Number of UTF-32 code units.
    pub fn len(&self) -> BridgeResult<usize> {
        self.ensure_live()?;
        let table = interface()?;
        let len = unsafe { (table.string_to_utf32_chars)(self.sys(), ptr::null_mut(), 0) };
        Ok(len.max(0) as usize)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Transcodes into a Rust string.
    pub fn to_rust_string(&self) -> BridgeResult<String> {
        let len = self.len()?;
        let table = interface()?;
        let mut chars = vec![0u32; len];
        unsafe { (table.string_to_utf32_chars)(self.sys(), chars.as_mut_ptr(), len as i64) };
        Ok(chars
            .into_iter()
            .map(|c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }
}

impl From<&str> for GString {
    fn from(text: &str) -> Self {
        GString::new(text)
    }
}

impl From<&String> for GString {
    fn from(text: &String) -> Self {
        GString::new(text)
    }
}

impl From<&StringName> for GString {
    fn from(name: &StringName) -> Self {
        convert(VariantType::String, 2, name.sys())
    }
}

impl From<&NodePath> for GString {
    fn from(path: &NodePath) -> Self {
        convert(VariantType::String, STRING_FROM_NODE_PATH, path.sys())
    }
}

impl fmt::Display for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rust_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl PartialEq for GString {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self.to_rust_string(), other.to_rust_string()),
            (Ok(a), Ok(b)) if a == b
        )
    }
}

// ============================================================================
// StringName
// ============================================================================

impl StringName {
    pub fn new(text: &str) -> Self {
        let utf8 = interface()
            .ok()
            .and_then(|table| table.string_name_new_with_utf8_chars_and_len);
        match utf8 {
            Some(func) => unsafe {
                Self::construct_with(|dest| func(dest, text.as_ptr().cast(), text.len() as i64))
            },
            // Older engines only offer the conversion from a string.
            None => StringName::from(&GString::new(text)),
        }
    }

    pub fn to_rust_string(&self) -> BridgeResult<String> {
        self.ensure_live()?;
        GString::from(self).to_rust_string()
    }
}

impl From<&str> for StringName {
    fn from(text: &str) -> Self {
        StringName::new(text)
    }
}

impl From<&GString> for StringName {
    fn from(text: &GString) -> Self {
        convert(VariantType::StringName, 2, text.sys())
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rust_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self.to_rust_string(), other.to_rust_string()),
            (Ok(a), Ok(b)) if a == b
        )
    }
}

// ============================================================================
// NodePath
// ============================================================================

impl NodePath {
    pub fn new(path: &str) -> Self {
        NodePath::from(&GString::new(path))
    }

    pub fn to_rust_string(&self) -> BridgeResult<String> {
        self.ensure_live()?;
        GString::from(self).to_rust_string()
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        NodePath::new(path)
    }
}

impl From<&GString> for NodePath {
    fn from(path: &GString) -> Self {
        convert(VariantType::NodePath, 2, path.sys())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rust_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn convert<T: Container>(ty: VariantType, index: i32, src: sys::GDExtensionConstTypePtr) -> T {
    let mut result = Ok(());
    let value = unsafe { T::construct_with(|dest| result = construct_from(ty, index, dest, src)) };
    match result {
        Ok(()) => value,
        Err(err) => {
            log::error!("cannot convert to {}: {}", ty.name(), err);
            // The token was never initialized; do not let it reach the destructor.
            let mut value = value;
            value.mark_consumed();
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn string_round_trips_non_ascii() {
        test_support::load();
        let text = GString::from("héllo wörld ✓");
        assert_eq!(text.len().unwrap(), 13);
        assert_eq!(text.to_rust_string().unwrap(), "héllo wörld ✓");
    }

    #[test]
    fn empty_string() {
        test_support::load();
        let text = GString::default();
        assert!(text.is_empty().unwrap());
        assert_eq!(text.to_string(), "");
    }

    #[test]
    fn names_and_paths_convert_through_strings() {
        test_support::load();
        let name = StringName::from("_ready");
        assert_eq!(name.to_rust_string().unwrap(), "_ready");
        assert_eq!(name, StringName::from(&GString::from("_ready")));

        let path = NodePath::from("Body/Sprite");
        assert_eq!(path.to_string(), "Body/Sprite");
    }

    #[test]
    fn clone_is_an_independent_owned_token() {
        test_support::load();
        let before = gdbridge_mock::live_containers();
        let text = GString::from("copy me");
        let copy = text.clone();
        drop(text);
        assert_eq!(copy.to_rust_string().unwrap(), "copy me");
        drop(copy);
        assert_eq!(gdbridge_mock::live_containers(), before);
    }
}
