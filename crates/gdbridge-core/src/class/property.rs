//! Property descriptors.
//!
//! [`PropertyMeta`] is the static description generated for an exported
//! field. [`PropertyDescriptor`] is its owned, editable form handed to
//! host hooks. [`SysPropertyList`] converts descriptors into the engine's
//! C layout and keeps the name and hint tokens alive while the engine reads
//! them.

use bitflags::bitflags;
use gdbridge_sys as sys;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::builtin::{self, Container, GString, StringName};
use crate::variant::{VariantType, VariantTyped};

/// Editor hint attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum PropertyHint {
    #[default]
    None = sys::PROPERTY_HINT_NONE,
    Range = sys::PROPERTY_HINT_RANGE,
    Enum = sys::PROPERTY_HINT_ENUM,
    EnumSuggestion = sys::PROPERTY_HINT_ENUM_SUGGESTION,
    ExpEasing = sys::PROPERTY_HINT_EXP_EASING,
    Link = sys::PROPERTY_HINT_LINK,
    Flags = sys::PROPERTY_HINT_FLAGS,
    File = sys::PROPERTY_HINT_FILE,
    Dir = sys::PROPERTY_HINT_DIR,
    GlobalFile = sys::PROPERTY_HINT_GLOBAL_FILE,
    GlobalDir = sys::PROPERTY_HINT_GLOBAL_DIR,
    ResourceType = sys::PROPERTY_HINT_RESOURCE_TYPE,
    MultilineText = sys::PROPERTY_HINT_MULTILINE_TEXT,
    Expression = sys::PROPERTY_HINT_EXPRESSION,
    PlaceholderText = sys::PROPERTY_HINT_PLACEHOLDER_TEXT,
    ColorNoAlpha = sys::PROPERTY_HINT_COLOR_NO_ALPHA,
    NodeType = sys::PROPERTY_HINT_NODE_TYPE,
}

impl PropertyHint {
    /// Unknown engine hints read as `None`.
    pub fn from_sys(raw: u32) -> Self {
        PropertyHint::try_from(raw).unwrap_or_default()
    }
}

bitflags! {
    /// Where a property shows up and how it is stored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyUsage: u32 {
        const STORAGE = sys::PROPERTY_USAGE_STORAGE;
        const EDITOR = sys::PROPERTY_USAGE_EDITOR;
        const INTERNAL = sys::PROPERTY_USAGE_INTERNAL;
        const CHECKABLE = sys::PROPERTY_USAGE_CHECKABLE;
        const CHECKED = sys::PROPERTY_USAGE_CHECKED;
        const GROUP = sys::PROPERTY_USAGE_GROUP;
        const CATEGORY = sys::PROPERTY_USAGE_CATEGORY;
        const READ_ONLY = sys::PROPERTY_USAGE_READ_ONLY;
        const DEFAULT = sys::PROPERTY_USAGE_DEFAULT;
    }
}

impl Default for PropertyUsage {
    fn default() -> Self {
        PropertyUsage::DEFAULT
    }
}

/// Static description of an exported field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyMeta {
    /// Name the engine sees.
    pub name: &'static str,
    /// Name of the host field.
    pub field: &'static str,
    pub variant_type: VariantType,
    pub class_name: &'static str,
    pub hint: PropertyHint,
    pub hint_string: &'static str,
    pub usage: PropertyUsage,
}

impl PropertyMeta {
    pub fn of<T: VariantTyped>(name: &'static str) -> Self {
        let class_name = T::class_name();
        let (hint, hint_string) = match class_name {
            "" => (PropertyHint::None, ""),
            "Resource" | "InputEvent" => (PropertyHint::ResourceType, class_name),
            _ => (PropertyHint::None, ""),
        };
        Self {
            name,
            field: name,
            variant_type: T::VARIANT_TYPE,
            class_name,
            hint,
            hint_string,
            usage: PropertyUsage::DEFAULT,
        }
    }

    pub fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    pub fn hint(mut self, hint: PropertyHint, hint_string: &'static str) -> Self {
        self.hint = hint;
        self.hint_string = hint_string;
        self
    }

    pub fn usage(mut self, usage: PropertyUsage) -> Self {
        self.usage = usage;
        self
    }

    /// True when `name` refers to this property by engine name or field name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.field == name
    }
}

/// Owned property descriptor, as produced for or edited by host hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub variant_type: VariantType,
    pub class_name: String,
    pub hint: PropertyHint,
    pub hint_string: String,
    pub usage: PropertyUsage,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, variant_type: VariantType) -> Self {
        Self {
            name: name.into(),
            variant_type,
            class_name: String::new(),
            hint: PropertyHint::None,
            hint_string: String::new(),
            usage: PropertyUsage::DEFAULT,
        }
    }

    /// Reads an engine-owned descriptor.
    ///
    /// # Safety
    /// The tokens in `info` must be live for the duration of the call.
    pub unsafe fn from_sys(info: &sys::GDExtensionPropertyInfo) -> Self {
        let read_name = |ptr: sys::GDExtensionStringNamePtr| {
            if ptr.is_null() {
                String::new()
            } else {
                unsafe { StringName::borrowed(ptr) }.to_string()
            }
        };
        let hint_string = if info.hint_string.is_null() {
            String::new()
        } else {
            unsafe { GString::borrowed(info.hint_string) }.to_string()
        };
        Self {
            name: read_name(info.name),
            variant_type: VariantType::from_sys(info.type_).unwrap_or(VariantType::Nil),
            class_name: read_name(info.class_name),
            hint: PropertyHint::from_sys(info.hint),
            hint_string,
            usage: PropertyUsage::from_bits_retain(info.usage),
        }
    }

    /// Writes the editable parts (hint, hint string, usage) back into an
    /// engine-owned descriptor. The name and type stay untouched.
    ///
    /// # Safety
    /// `info.hint_string` must be null or point to a live string token.
    pub unsafe fn write_back(&self, info: &mut sys::GDExtensionPropertyInfo) {
        info.hint = self.hint.into();
        info.usage = self.usage.bits();
        if info.hint_string.is_null() {
            return;
        }
        let current = unsafe { GString::borrowed(info.hint_string) }.to_string();
        if current == self.hint_string {
            return;
        }
        let replacement = GString::from(self.hint_string.as_str());
        unsafe {
            builtin::destroy(VariantType::String, info.hint_string);
            builtin::construct_copy(VariantType::String, info.hint_string, replacement.sys());
        }
    }
}

impl From<&PropertyMeta> for PropertyDescriptor {
    fn from(meta: &PropertyMeta) -> Self {
        Self {
            name: meta.name.to_string(),
            variant_type: meta.variant_type,
            class_name: meta.class_name.to_string(),
            hint: meta.hint,
            hint_string: meta.hint_string.to_string(),
            usage: meta.usage,
        }
    }
}

/// Descriptors in the engine's layout, together with the tokens they point to.
pub struct SysPropertyList {
    infos: Vec<sys::GDExtensionPropertyInfo>,
    // Boxed slices never reallocate, so the pointers in `infos` stay valid.
    _names: Box<[StringName]>,
    _class_names: Box<[StringName]>,
    _hint_strings: Box<[GString]>,
}

// The tokens are only reached through the engine while the list is alive.
unsafe impl Send for SysPropertyList {}

impl SysPropertyList {
    pub fn new(descriptors: &[PropertyDescriptor]) -> Self {
        let mut names: Box<[StringName]> = descriptors
            .iter()
            .map(|d| StringName::from(d.name.as_str()))
            .collect();
        let mut class_names: Box<[StringName]> = descriptors
            .iter()
            .map(|d| StringName::from(d.class_name.as_str()))
            .collect();
        let mut hint_strings: Box<[GString]> = descriptors
            .iter()
            .map(|d| GString::from(d.hint_string.as_str()))
            .collect();

        let infos = descriptors
            .iter()
            .zip(names.iter_mut())
            .zip(class_names.iter_mut())
            .zip(hint_strings.iter_mut())
            .map(|(((d, name), class_name), hint_string)| sys::GDExtensionPropertyInfo {
                type_: d.variant_type.to_sys(),
                name: name.sys_mut(),
                class_name: class_name.sys_mut(),
                hint: d.hint.into(),
                hint_string: hint_string.sys_mut(),
                usage: d.usage.bits(),
            })
            .collect();

        Self {
            infos,
            _names: names,
            _class_names: class_names,
            _hint_strings: hint_strings,
        }
    }

    pub fn from_meta(metas: &[PropertyMeta]) -> Self {
        let descriptors: Vec<PropertyDescriptor> = metas.iter().map(PropertyDescriptor::from).collect();
        Self::new(&descriptors)
    }

    pub fn as_ptr(&self) -> *const sys::GDExtensionPropertyInfo {
        self.infos.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut sys::GDExtensionPropertyInfo {
        self.infos.as_mut_ptr()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
