//! Heap storage behind container tokens.
//!
//! Word 0 of every token is the address of a boxed [`Data`]; packed array
//! tokens carry a second word that stays zero. A zero word 0 is a null token.

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;

use gdbridge_sys as sys;

use crate::variant::{destroy_slot, duplicate_slot, slot_eq, Slot};

pub(crate) enum Data {
    Text(Vec<u32>),
    Name(String),
    Path(String),
    Array(Vec<Slot>),
    /// Entries in insertion order.
    Dict(Vec<(Slot, Slot)>),
    Packed {
        elem: usize,
        len: usize,
        words: Vec<u64>,
    },
    /// String tokens owned by the array.
    Strings(Vec<[usize; 1]>),
}

thread_local! {
    static LIVE: Cell<i64> = const { Cell::new(0) };
}

/// Container allocations minus frees made on the calling thread.
pub fn live_containers() -> i64 {
    LIVE.with(Cell::get)
}

pub(crate) fn packed_element_size(ty: u32) -> Option<usize> {
    Some(match ty {
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_BYTE_ARRAY => 1,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_INT32_ARRAY => 4,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_INT64_ARRAY => 8,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT32_ARRAY => 4,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT64_ARRAY => 8,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR2_ARRAY => 8,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR3_ARRAY => 12,
        sys::GDEXTENSION_VARIANT_TYPE_PACKED_COLOR_ARRAY => 16,
        _ => return None,
    })
}

impl Data {
    pub(crate) fn empty(ty: u32) -> Option<Data> {
        Some(match ty {
            sys::GDEXTENSION_VARIANT_TYPE_STRING => Data::Text(Vec::new()),
            sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Data::Name(String::new()),
            sys::GDEXTENSION_VARIANT_TYPE_NODE_PATH => Data::Path(String::new()),
            sys::GDEXTENSION_VARIANT_TYPE_ARRAY => Data::Array(Vec::new()),
            sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY => Data::Dict(Vec::new()),
            sys::GDEXTENSION_VARIANT_TYPE_PACKED_STRING_ARRAY => Data::Strings(Vec::new()),
            other => Data::Packed {
                elem: packed_element_size(other)?,
                len: 0,
                words: Vec::new(),
            },
        })
    }

    pub(crate) fn from_text(text: &str) -> Data {
        Data::Text(text.chars().map(u32::from).collect())
    }

    pub(crate) fn text(&self) -> Option<String> {
        match self {
            Data::Text(chars) => Some(
                chars
                    .iter()
                    .map(|c| char::from_u32(*c).unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect(),
            ),
            Data::Name(text) | Data::Path(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Token width in machine words.
    pub(crate) fn words(&self) -> usize {
        match self {
            Data::Packed { .. } | Data::Strings(_) => 2,
            _ => 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Data::Text(chars) => chars.len(),
            Data::Name(text) | Data::Path(text) => text.chars().count(),
            Data::Array(slots) => slots.len(),
            Data::Dict(entries) => entries.len(),
            Data::Packed { len, .. } => *len,
            Data::Strings(tokens) => tokens.len(),
        }
    }

    /// Deep copy. Nested containers get their own storage.
    pub(crate) fn duplicate(&self) -> Data {
        match self {
            Data::Text(chars) => Data::Text(chars.clone()),
            Data::Name(text) => Data::Name(text.clone()),
            Data::Path(text) => Data::Path(text.clone()),
            Data::Array(slots) => Data::Array(slots.iter().map(|s| unsafe { duplicate_slot(s) }).collect()),
            Data::Dict(entries) => Data::Dict(
                entries
                    .iter()
                    .map(|(k, v)| unsafe { (duplicate_slot(k), duplicate_slot(v)) })
                    .collect(),
            ),
            Data::Packed { elem, len, words } => Data::Packed {
                elem: *elem,
                len: *len,
                words: words.clone(),
            },
            Data::Strings(tokens) => Data::Strings(tokens.iter().map(|t| [duplicate_word(t[0])]).collect()),
        }
    }

    pub(crate) fn resize(&mut self, new_len: usize) {
        match self {
            Data::Array(slots) => {
                while slots.len() > new_len {
                    if let Some(mut slot) = slots.pop() {
                        unsafe { destroy_slot(&mut slot) };
                    }
                }
                slots.resize(new_len, Slot::default());
            }
            Data::Packed { elem, len, words } => {
                let old = *len;
                words.resize((*elem * new_len).div_ceil(8), 0);
                if new_len > old {
                    let bytes = words.as_mut_ptr().cast::<u8>();
                    unsafe { ptr::write_bytes(bytes.add(old * *elem), 0, (new_len - old) * *elem) };
                }
                *len = new_len;
            }
            Data::Strings(tokens) => {
                while tokens.len() > new_len {
                    if let Some(token) = tokens.pop() {
                        free(token[0]);
                    }
                }
                while tokens.len() < new_len {
                    tokens.push([alloc(Data::Text(Vec::new()))]);
                }
            }
            _ => {}
        }
    }

    /// Address of a packed element, null when out of bounds.
    pub(crate) fn packed_element(&mut self, index: i64) -> *mut c_void {
        match self {
            Data::Packed { elem, len, words } if index >= 0 && (index as usize) < *len => unsafe {
                words.as_mut_ptr().cast::<u8>().add(index as usize * *elem).cast()
            },
            Data::Strings(tokens) if index >= 0 && (index as usize) < tokens.len() => {
                tokens[index as usize].as_mut_ptr().cast()
            }
            _ => ptr::null_mut(),
        }
    }

    pub(crate) fn content_eq(&self, other: &Data) -> bool {
        match (self, other) {
            (Data::Text(a), Data::Text(b)) => a == b,
            (Data::Name(a), Data::Name(b)) | (Data::Path(a), Data::Path(b)) => a == b,
            (Data::Array(a), Data::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| slot_eq(x, y))
            }
            (Data::Dict(a), Data::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| slot_eq(k, k2) && slot_eq(v, v2)))
            }
            (
                Data::Packed { elem, len, words },
                Data::Packed {
                    elem: elem2,
                    len: len2,
                    words: words2,
                },
            ) => {
                let bytes = elem * len;
                elem == elem2
                    && len == len2
                    && unsafe {
                        std::slice::from_raw_parts(words.as_ptr().cast::<u8>(), bytes)
                            == std::slice::from_raw_parts(words2.as_ptr().cast::<u8>(), bytes)
                    }
            }
            (Data::Strings(a), Data::Strings(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| text_of_word(x[0]) == text_of_word(y[0]))
            }
            _ => false,
        }
    }
}

impl Drop for Data {
    fn drop(&mut self) {
        match self {
            Data::Array(slots) => slots.iter_mut().for_each(|slot| unsafe { destroy_slot(slot) }),
            Data::Dict(entries) => entries.iter_mut().for_each(|(k, v)| unsafe {
                destroy_slot(k);
                destroy_slot(v);
            }),
            Data::Strings(tokens) => tokens.iter().for_each(|token| free(token[0])),
            _ => {}
        }
    }
}

pub(crate) fn alloc(data: Data) -> usize {
    LIVE.with(|live| live.set(live.get() + 1));
    Box::into_raw(Box::new(data)) as usize
}

pub(crate) fn free(word: usize) {
    if word == 0 {
        return;
    }
    LIVE.with(|live| live.set(live.get() - 1));
    drop(unsafe { Box::from_raw(word as *mut Data) });
}

/// Storage behind word 0 of a token.
pub(crate) fn get<'a>(word: usize) -> Option<&'a mut Data> {
    unsafe { (word as *mut Data).as_mut() }
}

pub(crate) fn view<'a>(word: usize) -> Option<&'a Data> {
    unsafe { (word as *const Data).as_ref() }
}

pub(crate) fn duplicate_word(word: usize) -> usize {
    view(word).map_or(0, |data| alloc(data.duplicate()))
}

pub(crate) fn text_of_word(word: usize) -> Option<String> {
    view(word).and_then(|data| data.text())
}

/// Reads word 0 of the token at `token`.
pub(crate) unsafe fn token_word(token: *const c_void) -> usize {
    if token.is_null() {
        return 0;
    }
    unsafe { ptr::read(token as *const usize) }
}

/// Text of the string-like token at `token`, empty when null.
pub(crate) unsafe fn read_text(token: *const c_void) -> String {
    text_of_word(unsafe { token_word(token) }).unwrap_or_default()
}

/// Allocates `data` and writes its token to uninitialized `dest`.
pub(crate) unsafe fn write_token(dest: *mut c_void, data: Data) {
    let words = data.words();
    let word = alloc(data);
    unsafe { write_word(dest, word, words) };
}

pub(crate) unsafe fn write_word(dest: *mut c_void, word: usize, words: usize) {
    let dest = dest as *mut usize;
    unsafe {
        ptr::write(dest, word);
        if words == 2 {
            ptr::write(dest.add(1), 0);
        }
    }
}

/// A mock-owned token handed to extension callbacks by the harness.
pub(crate) struct Token {
    word: usize,
}

impl Token {
    pub(crate) fn name(text: &str) -> Token {
        Token {
            word: alloc(Data::Name(text.to_string())),
        }
    }

    pub(crate) fn text(text: &str) -> Token {
        Token {
            word: alloc(Data::from_text(text)),
        }
    }

    pub(crate) fn ptr(&self) -> *const c_void {
        (&self.word as *const usize).cast()
    }

    pub(crate) fn ptr_mut(&mut self) -> *mut c_void {
        (&mut self.word as *mut usize).cast()
    }

    pub(crate) fn read(&self) -> String {
        text_of_word(self.word).unwrap_or_default()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        free(self.word);
    }
}

// ============================================================================
// Interface functions
// ============================================================================

pub(crate) unsafe extern "C" fn string_new_with_utf32_chars_and_len(
    dest: sys::GDExtensionUninitializedStringPtr,
    contents: *const sys::char32_t,
    size: sys::GDExtensionInt,
) {
    let chars = if contents.is_null() || size <= 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(contents, size as usize) }.to_vec()
    };
    unsafe { write_token(dest, Data::Text(chars)) };
}

pub(crate) unsafe extern "C" fn string_to_utf32_chars(
    this: sys::GDExtensionConstStringPtr,
    text: *mut sys::char32_t,
    max: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let Some(Data::Text(chars)) = view(unsafe { token_word(this) }) else {
        return 0;
    };
    if !text.is_null() && max > 0 {
        let count = chars.len().min(max as usize);
        unsafe { ptr::copy_nonoverlapping(chars.as_ptr(), text, count) };
    }
    chars.len() as i64
}

pub(crate) unsafe extern "C" fn string_name_new_with_utf8_chars_and_len(
    dest: sys::GDExtensionUninitializedStringNamePtr,
    contents: *const std::ffi::c_char,
    size: sys::GDExtensionInt,
) {
    let text = if contents.is_null() || size <= 0 {
        String::new()
    } else {
        let bytes = unsafe { std::slice::from_raw_parts(contents.cast::<u8>(), size as usize) };
        String::from_utf8_lossy(bytes).into_owned()
    };
    unsafe { write_token(dest, Data::Name(text)) };
}

pub(crate) unsafe extern "C" fn array_operator_index(
    this: sys::GDExtensionTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    match get(unsafe { token_word(this) }) {
        Some(Data::Array(slots)) if index >= 0 && (index as usize) < slots.len() => {
            (&mut slots[index as usize] as *mut Slot).cast()
        }
        _ => ptr::null_mut(),
    }
}

pub(crate) unsafe extern "C" fn dictionary_operator_index(
    this: sys::GDExtensionTypePtr,
    key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let Some(Data::Dict(entries)) = get(unsafe { token_word(this) }) else {
        return ptr::null_mut();
    };
    let key = unsafe { &*(key as *const Slot) };
    let index = match entries.iter().position(|(k, _)| slot_eq(k, key)) {
        Some(index) => index,
        None => {
            entries.push((unsafe { duplicate_slot(key) }, Slot::default()));
            entries.len() - 1
        }
    };
    (&mut entries[index].1 as *mut Slot).cast()
}

macro_rules! packed_index {
    ($($name:ident -> $elem:ty),* $(,)?) => {
        $(
            pub(crate) unsafe extern "C" fn $name(
                this: sys::GDExtensionTypePtr,
                index: sys::GDExtensionInt,
            ) -> *mut $elem {
                get(unsafe { token_word(this) })
                    .map_or(ptr::null_mut(), |data| data.packed_element(index).cast())
            }
        )*
    };
}

packed_index! {
    packed_byte_array_operator_index -> u8,
    packed_int32_array_operator_index -> i32,
    packed_int64_array_operator_index -> i64,
    packed_float32_array_operator_index -> f32,
    packed_float64_array_operator_index -> f64,
    packed_string_array_operator_index -> c_void,
    packed_vector2_array_operator_index -> c_void,
    packed_vector3_array_operator_index -> c_void,
    packed_color_array_operator_index -> c_void,
}
