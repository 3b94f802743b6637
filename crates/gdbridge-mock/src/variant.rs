//! Variant storage, typed constructors and builtin methods.
//!
//! Plain data up to 16 bytes lives in the payload. Larger plain data is
//! boxed and the payload holds the box address. Containers hold their token
//! and objects hold `[address, instance id]`.

use std::ffi::c_void;
use std::ptr;

use gdbridge_sys as sys;

use crate::containers::{self, duplicate_word, get, read_text, token_word, view, write_token, write_word, Data};
use crate::objects;

pub(crate) type Slot = sys::GDExtensionVariantStorage;

const TYPE_NAMES: [&str; 38] = [
    "Nil", "bool", "int", "float", "String", "Vector2", "Vector2i", "Rect2", "Rect2i", "Vector3",
    "Vector3i", "Transform2D", "Vector4", "Vector4i", "Plane", "Quaternion", "AABB", "Basis",
    "Transform3D", "Projection", "Color", "StringName", "NodePath", "RID", "Object", "Callable",
    "Signal", "Dictionary", "Array", "PackedByteArray", "PackedInt32Array", "PackedInt64Array",
    "PackedFloat32Array", "PackedFloat64Array", "PackedStringArray", "PackedVector2Array",
    "PackedVector3Array", "PackedColorArray",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Nil,
    Inline(usize),
    Boxed(usize),
    Container,
    Object,
}

pub(crate) fn kind(ty: u32) -> Kind {
    use Kind::*;
    match ty {
        sys::GDEXTENSION_VARIANT_TYPE_NIL => Nil,
        sys::GDEXTENSION_VARIANT_TYPE_BOOL => Inline(1),
        sys::GDEXTENSION_VARIANT_TYPE_INT
        | sys::GDEXTENSION_VARIANT_TYPE_FLOAT
        | sys::GDEXTENSION_VARIANT_TYPE_VECTOR2
        | sys::GDEXTENSION_VARIANT_TYPE_VECTOR2I
        | sys::GDEXTENSION_VARIANT_TYPE_RID => Inline(8),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR3 | sys::GDEXTENSION_VARIANT_TYPE_VECTOR3I => Inline(12),
        sys::GDEXTENSION_VARIANT_TYPE_RECT2
        | sys::GDEXTENSION_VARIANT_TYPE_RECT2I
        | sys::GDEXTENSION_VARIANT_TYPE_VECTOR4
        | sys::GDEXTENSION_VARIANT_TYPE_VECTOR4I
        | sys::GDEXTENSION_VARIANT_TYPE_PLANE
        | sys::GDEXTENSION_VARIANT_TYPE_QUATERNION
        | sys::GDEXTENSION_VARIANT_TYPE_COLOR
        | sys::GDEXTENSION_VARIANT_TYPE_CALLABLE
        | sys::GDEXTENSION_VARIANT_TYPE_SIGNAL => Inline(16),
        sys::GDEXTENSION_VARIANT_TYPE_TRANSFORM2D | sys::GDEXTENSION_VARIANT_TYPE_AABB => Boxed(24),
        sys::GDEXTENSION_VARIANT_TYPE_BASIS => Boxed(36),
        sys::GDEXTENSION_VARIANT_TYPE_TRANSFORM3D => Boxed(48),
        sys::GDEXTENSION_VARIANT_TYPE_PROJECTION => Boxed(64),
        sys::GDEXTENSION_VARIANT_TYPE_OBJECT => Object,
        _ => Container,
    }
}

fn container_words(ty: u32) -> usize {
    if ty >= sys::GDEXTENSION_VARIANT_TYPE_PACKED_BYTE_ARRAY {
        2
    } else {
        1
    }
}

type BoxedPayload = [u64; 8];

fn payload_bytes(slot: &Slot, size: usize) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slot.payload.as_ptr().cast::<u8>(), size) }
}

fn boxed_bytes(slot: &Slot, size: usize) -> &[u8] {
    match unsafe { (slot.payload[0] as *const BoxedPayload).as_ref() } {
        Some(payload) => unsafe { std::slice::from_raw_parts(payload.as_ptr().cast::<u8>(), size) },
        None => &[],
    }
}

pub(crate) fn bool_slot(value: bool) -> Slot {
    Slot {
        tag: sys::GDEXTENSION_VARIANT_TYPE_BOOL,
        padding: 0,
        payload: [value as u64, 0],
    }
}

pub(crate) fn int_slot(value: i64) -> Slot {
    Slot {
        tag: sys::GDEXTENSION_VARIANT_TYPE_INT,
        padding: 0,
        payload: [value as u64, 0],
    }
}

/// Copy with its own storage and, for objects, its own reference.
pub(crate) unsafe fn duplicate_slot(src: &Slot) -> Slot {
    let mut out = *src;
    match kind(src.tag) {
        Kind::Boxed(_) => {
            if let Some(payload) = unsafe { (src.payload[0] as *const BoxedPayload).as_ref() } {
                out.payload[0] = Box::into_raw(Box::new(*payload)) as u64;
            }
        }
        Kind::Container => out.payload = [duplicate_word(src.payload[0] as usize) as u64, 0],
        Kind::Object => {
            if src.payload[0] != 0 && objects::acquire(src.payload[0] as usize) != Some(src.payload[1]) {
                out.payload = [0, 0];
            }
        }
        _ => {}
    }
    out
}

/// Releases whatever the slot owns and leaves it nil.
pub(crate) unsafe fn destroy_slot(slot: &mut Slot) {
    match kind(slot.tag) {
        Kind::Boxed(_) if slot.payload[0] != 0 => {
            drop(unsafe { Box::from_raw(slot.payload[0] as *mut BoxedPayload) })
        }
        Kind::Container => containers::free(slot.payload[0] as usize),
        Kind::Object if slot.payload[0] != 0 => objects::release(slot.payload[0] as usize, slot.payload[1]),
        _ => {}
    }
    *slot = Slot::default();
}

pub(crate) fn slot_eq(a: &Slot, b: &Slot) -> bool {
    use sys::{GDEXTENSION_VARIANT_TYPE_FLOAT as FLOAT, GDEXTENSION_VARIANT_TYPE_INT as INT};
    match (a.tag, b.tag) {
        (INT, FLOAT) => a.payload[0] as i64 as f64 == f64::from_bits(b.payload[0]),
        (FLOAT, INT) => f64::from_bits(a.payload[0]) == b.payload[0] as i64 as f64,
        (FLOAT, FLOAT) => f64::from_bits(a.payload[0]) == f64::from_bits(b.payload[0]),
        (x, y) if x != y => false,
        (ty, _) => match kind(ty) {
            Kind::Nil => true,
            Kind::Inline(size) => payload_bytes(a, size) == payload_bytes(b, size),
            Kind::Boxed(size) => boxed_bytes(a, size) == boxed_bytes(b, size),
            Kind::Container => match (view(a.payload[0] as usize), view(b.payload[0] as usize)) {
                (Some(x), Some(y)) => x.content_eq(y),
                (None, None) => true,
                _ => false,
            },
            Kind::Object => a.payload[0] == b.payload[0],
        },
    }
}

fn read_f32s<const N: usize>(slot: &Slot) -> [f32; N] {
    unsafe { ptr::read_unaligned(slot.payload.as_ptr().cast::<[f32; N]>()) }
}

fn join(values: &[f32]) -> String {
    values.iter().map(|v| format!("{:?}", v)).collect::<Vec<_>>().join(", ")
}

/// The engine's text form of a value.
pub(crate) fn describe(slot: &Slot) -> String {
    match slot.tag {
        sys::GDEXTENSION_VARIANT_TYPE_NIL => "<null>".to_string(),
        sys::GDEXTENSION_VARIANT_TYPE_BOOL => (slot.payload[0] & 0xff != 0).to_string(),
        sys::GDEXTENSION_VARIANT_TYPE_INT => (slot.payload[0] as i64).to_string(),
        sys::GDEXTENSION_VARIANT_TYPE_FLOAT => format!("{:?}", f64::from_bits(slot.payload[0])),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR2 => format!("({})", join(&read_f32s::<2>(slot))),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR3 => format!("({})", join(&read_f32s::<3>(slot))),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR4
        | sys::GDEXTENSION_VARIANT_TYPE_QUATERNION
        | sys::GDEXTENSION_VARIANT_TYPE_COLOR => format!("({})", join(&read_f32s::<4>(slot))),
        sys::GDEXTENSION_VARIANT_TYPE_OBJECT => objects::describe(slot.payload[0] as usize, slot.payload[1]),
        ty if kind(ty) == Kind::Container => match view(slot.payload[0] as usize) {
            Some(Data::Array(slots)) => {
                format!("[{}]", slots.iter().map(describe).collect::<Vec<_>>().join(", "))
            }
            Some(Data::Dict(entries)) => format!(
                "{{ {} }}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", describe(k), describe(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Some(data) => data
                .text()
                .unwrap_or_else(|| format!("<{} of {}>", TYPE_NAMES[ty as usize], data.len())),
            None => String::new(),
        },
        ty => format!("<{}>", TYPE_NAMES.get(ty as usize).copied().unwrap_or("?")),
    }
}

// ============================================================================
// Variant lifecycle
// ============================================================================

pub(crate) unsafe extern "C" fn variant_new_copy(
    dest: sys::GDExtensionUninitializedVariantPtr,
    src: sys::GDExtensionConstVariantPtr,
) {
    unsafe {
        let copy = duplicate_slot(&*(src as *const Slot));
        ptr::write(dest as *mut Slot, copy);
    }
}

pub(crate) unsafe extern "C" fn variant_new_nil(dest: sys::GDExtensionUninitializedVariantPtr) {
    unsafe { ptr::write(dest as *mut Slot, Slot::default()) };
}

pub(crate) unsafe extern "C" fn variant_destroy(this: sys::GDExtensionVariantPtr) {
    unsafe { destroy_slot(&mut *(this as *mut Slot)) };
}

pub(crate) unsafe extern "C" fn variant_evaluate(
    op: sys::GDExtensionVariantOperator,
    a: sys::GDExtensionConstVariantPtr,
    b: sys::GDExtensionConstVariantPtr,
    ret: sys::GDExtensionUninitializedVariantPtr,
    valid: *mut sys::GDExtensionBool,
) {
    let (a, b) = unsafe { (&*(a as *const Slot), &*(b as *const Slot)) };
    let result = match op {
        sys::GDEXTENSION_VARIANT_OP_EQUAL => Some(slot_eq(a, b)),
        sys::GDEXTENSION_VARIANT_OP_NOT_EQUAL => Some(!slot_eq(a, b)),
        _ => None,
    };
    unsafe {
        ptr::write(ret as *mut Slot, result.map_or_else(Slot::default, bool_slot));
        *valid = result.is_some() as u8;
    }
}

pub(crate) unsafe extern "C" fn variant_stringify(
    this: sys::GDExtensionConstVariantPtr,
    ret: sys::GDExtensionStringPtr,
) {
    let text = describe(unsafe { &*(this as *const Slot) });
    match get(unsafe { token_word(ret) }) {
        Some(Data::Text(chars)) => *chars = text.chars().map(u32::from).collect(),
        _ => unsafe { write_token(ret, Data::from_text(&text)) },
    }
}

// ============================================================================
// Typed constructors
// ============================================================================

unsafe extern "C" fn from_type<const T: u32>(
    dest: sys::GDExtensionUninitializedVariantPtr,
    src: sys::GDExtensionTypePtr,
) {
    let mut slot = Slot {
        tag: T,
        ..Slot::default()
    };
    match kind(T) {
        Kind::Nil => {}
        Kind::Inline(size) => unsafe {
            ptr::copy_nonoverlapping(src as *const u8, slot.payload.as_mut_ptr().cast::<u8>(), size)
        },
        Kind::Boxed(size) => {
            let mut payload = Box::new([0u64; 8]);
            unsafe { ptr::copy_nonoverlapping(src as *const u8, payload.as_mut_ptr().cast::<u8>(), size) };
            slot.payload[0] = Box::into_raw(payload) as u64;
        }
        Kind::Container => slot.payload[0] = duplicate_word(unsafe { token_word(src) }) as u64,
        Kind::Object => {
            let address = unsafe { ptr::read(src as *const usize) };
            if let Some(id) = objects::acquire(address) {
                slot.payload = [address as u64, id];
            }
        }
    }
    unsafe { ptr::write(dest as *mut Slot, slot) };
}

unsafe extern "C" fn to_type(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let slot = unsafe { &*(src as *const Slot) };
    match kind(slot.tag) {
        Kind::Nil => {}
        Kind::Inline(size) => unsafe {
            ptr::copy_nonoverlapping(slot.payload.as_ptr().cast::<u8>(), dest as *mut u8, size)
        },
        Kind::Boxed(size) => {
            let bytes = boxed_bytes(slot, size);
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), dest as *mut u8, bytes.len()) };
        }
        Kind::Container => unsafe {
            write_word(dest, duplicate_word(slot.payload[0] as usize), container_words(slot.tag))
        },
        Kind::Object => {
            let address = slot.payload[0] as usize;
            let live = objects::is_alive(address, slot.payload[1]);
            unsafe { ptr::write(dest as *mut usize, if live { address } else { 0 }) };
        }
    }
}

unsafe extern "C" fn construct_default<const T: u32>(
    dest: sys::GDExtensionUninitializedTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
) {
    if let Some(data) = Data::empty(T) {
        unsafe { write_token(dest, data) };
    }
}

unsafe extern "C" fn construct_copy(
    dest: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let word = unsafe { token_word(*args) };
    match view(word) {
        Some(data) => unsafe { write_token(dest, data.duplicate()) },
        None => unsafe { write_word(dest, 0, 1) },
    }
}

unsafe extern "C" fn string_from_text(
    dest: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let text = unsafe { read_text(*args) };
    unsafe { write_token(dest, Data::from_text(&text)) };
}

unsafe extern "C" fn name_from_string(
    dest: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let text = unsafe { read_text(*args) };
    unsafe { write_token(dest, Data::Name(text)) };
}

unsafe extern "C" fn path_from_string(
    dest: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let text = unsafe { read_text(*args) };
    unsafe { write_token(dest, Data::Path(text)) };
}

unsafe extern "C" fn destroy_token(token: sys::GDExtensionTypePtr) {
    containers::free(unsafe { token_word(token) });
}

macro_rules! per_type {
    ($ty:expr, $func:ident as $fty:ty) => {
        per_type!(@arms $ty, $func, $fty;
            1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32 33
            34 35 36 37)
    };
    (@arms $ty:expr, $func:ident, $fty:ty; $($n:literal)*) => {
        match $ty {
            $($n => Some($func::<$n> as $fty),)*
            _ => None,
        }
    };
}

pub(crate) unsafe extern "C" fn get_variant_from_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> Option<sys::GDExtensionVariantFromTypeConstructorFunc> {
    per_type!(ty, from_type as sys::GDExtensionVariantFromTypeConstructorFunc)
}

pub(crate) unsafe extern "C" fn get_variant_to_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> Option<sys::GDExtensionTypeFromVariantConstructorFunc> {
    (ty != sys::GDEXTENSION_VARIANT_TYPE_NIL && ty < sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX)
        .then_some(to_type as sys::GDExtensionTypeFromVariantConstructorFunc)
}

pub(crate) unsafe extern "C" fn variant_get_ptr_constructor(
    ty: sys::GDExtensionVariantType,
    index: i32,
) -> Option<sys::GDExtensionPtrConstructor> {
    use sys::{
        GDEXTENSION_VARIANT_TYPE_NODE_PATH as NODE_PATH, GDEXTENSION_VARIANT_TYPE_STRING as STRING,
        GDEXTENSION_VARIANT_TYPE_STRING_NAME as STRING_NAME,
    };
    if ty >= sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX || kind(ty) != Kind::Container {
        return None;
    }
    let ctor: sys::GDExtensionPtrConstructor = match (ty, index) {
        (_, 0) => return per_type!(ty, construct_default as sys::GDExtensionPtrConstructor),
        (_, 1) => construct_copy,
        (STRING, 2) | (STRING, 3) => string_from_text,
        (STRING_NAME, 2) => name_from_string,
        (NODE_PATH, 2) => path_from_string,
        _ => return None,
    };
    Some(ctor)
}

pub(crate) unsafe extern "C" fn variant_get_ptr_destructor(
    ty: sys::GDExtensionVariantType,
) -> Option<sys::GDExtensionPtrDestructor> {
    (ty < sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX && kind(ty) == Kind::Container)
        .then_some(destroy_token as sys::GDExtensionPtrDestructor)
}

// ============================================================================
// Builtin methods
// ============================================================================

unsafe fn data_of<'a>(base: sys::GDExtensionTypePtr) -> Option<&'a mut Data> {
    get(unsafe { token_word(base) })
}

unsafe extern "C" fn builtin_size(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let len = unsafe { data_of(base) }.map_or(0, |data| data.len());
    unsafe { ptr::write(ret as *mut i64, len as i64) };
}

unsafe extern "C" fn builtin_resize(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let len = unsafe { ptr::read(*args as *const i64) }.max(0) as usize;
    if let Some(data) = unsafe { data_of(base) } {
        data.resize(len);
    }
    unsafe { ptr::write(ret as *mut i64, 0) };
}

unsafe extern "C" fn builtin_clear(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    _ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    match unsafe { data_of(base) } {
        Some(Data::Dict(entries)) => {
            for (mut key, mut value) in entries.drain(..) {
                unsafe {
                    destroy_slot(&mut key);
                    destroy_slot(&mut value);
                }
            }
        }
        Some(data) => data.resize(0),
        None => {}
    }
}

unsafe extern "C" fn array_append(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    _ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    if let Some(Data::Array(slots)) = unsafe { data_of(base) } {
        slots.push(unsafe { duplicate_slot(&*(*args as *const Slot)) });
    }
}

unsafe extern "C" fn strings_append(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let appended = match unsafe { data_of(base) } {
        Some(Data::Strings(tokens)) => {
            tokens.push([duplicate_word(unsafe { token_word(*args) })]);
            true
        }
        _ => false,
    };
    unsafe { ptr::write(ret as *mut u8, appended as u8) };
}

unsafe extern "C" fn dict_has(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let key = unsafe { &*(*args as *const Slot) };
    let found = match unsafe { data_of(base) } {
        Some(Data::Dict(entries)) => entries.iter().any(|(k, _)| slot_eq(k, key)),
        _ => false,
    };
    unsafe { ptr::write(ret as *mut u8, found as u8) };
}

unsafe extern "C" fn dict_erase(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let key = unsafe { &*(*args as *const Slot) };
    let mut erased = false;
    if let Some(Data::Dict(entries)) = unsafe { data_of(base) } {
        if let Some(index) = entries.iter().position(|(k, _)| slot_eq(k, key)) {
            let (mut key, mut value) = entries.remove(index);
            unsafe {
                destroy_slot(&mut key);
                destroy_slot(&mut value);
            }
            erased = true;
        }
    }
    unsafe { ptr::write(ret as *mut u8, erased as u8) };
}

unsafe extern "C" fn dict_keys(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: i32,
) {
    let keys = match unsafe { data_of(base) } {
        Some(Data::Dict(entries)) => entries.iter().map(|(k, _)| unsafe { duplicate_slot(k) }).collect(),
        _ => Vec::new(),
    };
    unsafe { write_token(ret, Data::Array(keys)) };
}

pub(crate) unsafe extern "C" fn variant_get_ptr_builtin_method(
    ty: sys::GDExtensionVariantType,
    method: sys::GDExtensionConstStringNamePtr,
    _hash: sys::GDExtensionInt,
) -> Option<sys::GDExtensionPtrBuiltInMethod> {
    use sys::{
        GDEXTENSION_VARIANT_TYPE_ARRAY as ARRAY, GDEXTENSION_VARIANT_TYPE_DICTIONARY as DICTIONARY,
        GDEXTENSION_VARIANT_TYPE_PACKED_STRING_ARRAY as PACKED_STRING_ARRAY,
    };
    if ty >= sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX || kind(ty) != Kind::Container {
        return None;
    }
    let packed = containers::packed_element_size(ty).is_some() || ty == PACKED_STRING_ARRAY;
    let method = unsafe { read_text(method) };
    let func: sys::GDExtensionPtrBuiltInMethod = match (method.as_str(), ty) {
        ("size", _) => builtin_size,
        ("resize", ARRAY) => builtin_resize,
        ("resize", _) if packed => builtin_resize,
        ("clear", ARRAY | DICTIONARY) => builtin_clear,
        ("append", ARRAY) => array_append,
        ("append", PACKED_STRING_ARRAY) => strings_append,
        ("has", DICTIONARY) => dict_has,
        ("erase", DICTIONARY) => dict_erase,
        ("keys", DICTIONARY) => dict_keys,
        _ => return None,
    };
    Some(func)
}

/// Reads the raw pointer argument `index` of a pointer call.
pub(crate) unsafe fn arg_ptr(args: *const sys::GDExtensionConstTypePtr, index: usize) -> *const c_void {
    unsafe { *args.add(index) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{alloc, live_containers};

    fn text_slot(text: &str) -> Slot {
        Slot {
            tag: sys::GDEXTENSION_VARIANT_TYPE_STRING,
            padding: 0,
            payload: [alloc(Data::from_text(text)) as u64, 0],
        }
    }

    #[test]
    fn copies_own_their_storage() {
        let before = live_containers();
        let mut original = text_slot("lamp");
        let mut copy = unsafe { duplicate_slot(&original) };
        assert_ne!(original.payload[0], copy.payload[0]);
        assert!(slot_eq(&original, &copy));
        unsafe {
            destroy_slot(&mut original);
            destroy_slot(&mut copy);
        }
        assert_eq!(live_containers(), before);
    }

    #[test]
    fn nested_arrays_release_their_elements() {
        let before = live_containers();
        let mut array = Slot {
            tag: sys::GDEXTENSION_VARIANT_TYPE_ARRAY,
            padding: 0,
            payload: [alloc(Data::Array(vec![text_slot("a"), int_slot(3)])) as u64, 0],
        };
        assert_eq!(describe(&array), "[a, 3]");
        unsafe { destroy_slot(&mut array) };
        assert_eq!(live_containers(), before);
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        let float = Slot {
            tag: sys::GDEXTENSION_VARIANT_TYPE_FLOAT,
            padding: 0,
            payload: [2.0f64.to_bits(), 0],
        };
        assert!(slot_eq(&int_slot(2), &float));
        assert!(!slot_eq(&int_slot(2), &bool_slot(true)));
        assert_eq!(describe(&float), "2.0");
    }

    #[test]
    fn only_containers_have_pointer_lifecycles() {
        unsafe {
            assert!(variant_get_ptr_destructor(sys::GDEXTENSION_VARIANT_TYPE_INT).is_none());
            assert!(variant_get_ptr_constructor(sys::GDEXTENSION_VARIANT_TYPE_STRING, 3).is_some());
            assert!(variant_get_ptr_constructor(sys::GDEXTENSION_VARIANT_TYPE_ARRAY, 2).is_none());
        }
    }
}
