//! Raw declarations of the engine's extension C ABI.
//!
//! Everything in this crate mirrors the engine header one-to-one: opaque
//! pointer aliases, `#[repr(C)]` structs exchanged at load and registration
//! time, integer constants for the engine's C enums, and the function-pointer
//! type of every interface function the bridge resolves through
//! `get_proc_address`. There is no logic here; safe wrappers live in
//! `gdbridge-core`.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_char, c_void};

// ============================================================================
// Scalars and opaque pointers
// ============================================================================

pub type GDExtensionBool = u8;
pub type GDExtensionInt = i64;
pub type GDObjectInstanceID = u64;
pub type char32_t = u32;

pub type GDExtensionVariantPtr = *mut c_void;
pub type GDExtensionConstVariantPtr = *const c_void;
pub type GDExtensionUninitializedVariantPtr = *mut c_void;
pub type GDExtensionStringNamePtr = *mut c_void;
pub type GDExtensionConstStringNamePtr = *const c_void;
pub type GDExtensionUninitializedStringNamePtr = *mut c_void;
pub type GDExtensionStringPtr = *mut c_void;
pub type GDExtensionConstStringPtr = *const c_void;
pub type GDExtensionUninitializedStringPtr = *mut c_void;
pub type GDExtensionObjectPtr = *mut c_void;
pub type GDExtensionConstObjectPtr = *const c_void;
pub type GDExtensionTypePtr = *mut c_void;
pub type GDExtensionConstTypePtr = *const c_void;
pub type GDExtensionUninitializedTypePtr = *mut c_void;
pub type GDExtensionMethodBindPtr = *const c_void;
pub type GDExtensionClassInstancePtr = *mut c_void;
pub type GDExtensionClassLibraryPtr = *mut c_void;
pub type GDExtensionRefPtr = *mut c_void;

/// Size in bytes of the engine's dynamic value.
pub const GDEXTENSION_VARIANT_SIZE: usize = 24;
/// Byte offset of the payload inside a variant; bytes 4..8 are padding.
pub const GDEXTENSION_VARIANT_PAYLOAD_OFFSET: usize = 8;

/// Raw storage of one engine variant. Tag at offset 0, payload at offset 8.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GDExtensionVariantStorage {
    pub tag: u32,
    pub padding: u32,
    pub payload: [u64; 2],
}

// ============================================================================
// Variant types
// ============================================================================

pub type GDExtensionVariantType = u32;

pub const GDEXTENSION_VARIANT_TYPE_NIL: GDExtensionVariantType = 0;
pub const GDEXTENSION_VARIANT_TYPE_BOOL: GDExtensionVariantType = 1;
pub const GDEXTENSION_VARIANT_TYPE_INT: GDExtensionVariantType = 2;
pub const GDEXTENSION_VARIANT_TYPE_FLOAT: GDExtensionVariantType = 3;
pub const GDEXTENSION_VARIANT_TYPE_STRING: GDExtensionVariantType = 4;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR2: GDExtensionVariantType = 5;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR2I: GDExtensionVariantType = 6;
pub const GDEXTENSION_VARIANT_TYPE_RECT2: GDExtensionVariantType = 7;
pub const GDEXTENSION_VARIANT_TYPE_RECT2I: GDExtensionVariantType = 8;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR3: GDExtensionVariantType = 9;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR3I: GDExtensionVariantType = 10;
pub const GDEXTENSION_VARIANT_TYPE_TRANSFORM2D: GDExtensionVariantType = 11;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR4: GDExtensionVariantType = 12;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR4I: GDExtensionVariantType = 13;
pub const GDEXTENSION_VARIANT_TYPE_PLANE: GDExtensionVariantType = 14;
pub const GDEXTENSION_VARIANT_TYPE_QUATERNION: GDExtensionVariantType = 15;
pub const GDEXTENSION_VARIANT_TYPE_AABB: GDExtensionVariantType = 16;
pub const GDEXTENSION_VARIANT_TYPE_BASIS: GDExtensionVariantType = 17;
pub const GDEXTENSION_VARIANT_TYPE_TRANSFORM3D: GDExtensionVariantType = 18;
pub const GDEXTENSION_VARIANT_TYPE_PROJECTION: GDExtensionVariantType = 19;
pub const GDEXTENSION_VARIANT_TYPE_COLOR: GDExtensionVariantType = 20;
pub const GDEXTENSION_VARIANT_TYPE_STRING_NAME: GDExtensionVariantType = 21;
pub const GDEXTENSION_VARIANT_TYPE_NODE_PATH: GDExtensionVariantType = 22;
pub const GDEXTENSION_VARIANT_TYPE_RID: GDExtensionVariantType = 23;
pub const GDEXTENSION_VARIANT_TYPE_OBJECT: GDExtensionVariantType = 24;
pub const GDEXTENSION_VARIANT_TYPE_CALLABLE: GDExtensionVariantType = 25;
pub const GDEXTENSION_VARIANT_TYPE_SIGNAL: GDExtensionVariantType = 26;
pub const GDEXTENSION_VARIANT_TYPE_DICTIONARY: GDExtensionVariantType = 27;
pub const GDEXTENSION_VARIANT_TYPE_ARRAY: GDExtensionVariantType = 28;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_BYTE_ARRAY: GDExtensionVariantType = 29;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_INT32_ARRAY: GDExtensionVariantType = 30;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_INT64_ARRAY: GDExtensionVariantType = 31;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT32_ARRAY: GDExtensionVariantType = 32;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_FLOAT64_ARRAY: GDExtensionVariantType = 33;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_STRING_ARRAY: GDExtensionVariantType = 34;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR2_ARRAY: GDExtensionVariantType = 35;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR3_ARRAY: GDExtensionVariantType = 36;
pub const GDEXTENSION_VARIANT_TYPE_PACKED_COLOR_ARRAY: GDExtensionVariantType = 37;
pub const GDEXTENSION_VARIANT_TYPE_VARIANT_MAX: GDExtensionVariantType = 38;

pub type GDExtensionVariantOperator = u32;

pub const GDEXTENSION_VARIANT_OP_EQUAL: GDExtensionVariantOperator = 0;
pub const GDEXTENSION_VARIANT_OP_NOT_EQUAL: GDExtensionVariantOperator = 1;
pub const GDEXTENSION_VARIANT_OP_LESS: GDExtensionVariantOperator = 2;
pub const GDEXTENSION_VARIANT_OP_LESS_EQUAL: GDExtensionVariantOperator = 3;
pub const GDEXTENSION_VARIANT_OP_GREATER: GDExtensionVariantOperator = 4;
pub const GDEXTENSION_VARIANT_OP_GREATER_EQUAL: GDExtensionVariantOperator = 5;
pub const GDEXTENSION_VARIANT_OP_MAX: GDExtensionVariantOperator = 25;

// ============================================================================
// Calls
// ============================================================================

pub type GDExtensionCallErrorType = u32;

pub const GDEXTENSION_CALL_OK: GDExtensionCallErrorType = 0;
pub const GDEXTENSION_CALL_ERROR_INVALID_METHOD: GDExtensionCallErrorType = 1;
pub const GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT: GDExtensionCallErrorType = 2;
pub const GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS: GDExtensionCallErrorType = 3;
pub const GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS: GDExtensionCallErrorType = 4;
pub const GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL: GDExtensionCallErrorType = 5;
pub const GDEXTENSION_CALL_ERROR_METHOD_NOT_CONST: GDExtensionCallErrorType = 6;

/// Out-parameter of every variant-call.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GDExtensionCallError {
    pub error: GDExtensionCallErrorType,
    pub argument: i32,
    pub expected: i32,
}

pub type GDExtensionVariantFromTypeConstructorFunc =
    unsafe extern "C" fn(GDExtensionUninitializedVariantPtr, GDExtensionTypePtr);
pub type GDExtensionTypeFromVariantConstructorFunc =
    unsafe extern "C" fn(GDExtensionUninitializedTypePtr, GDExtensionVariantPtr);
pub type GDExtensionPtrConstructor =
    unsafe extern "C" fn(GDExtensionUninitializedTypePtr, *const GDExtensionConstTypePtr);
pub type GDExtensionPtrDestructor = unsafe extern "C" fn(GDExtensionTypePtr);
pub type GDExtensionPtrBuiltInMethod = unsafe extern "C" fn(
    p_base: GDExtensionTypePtr,
    p_args: *const GDExtensionConstTypePtr,
    r_return: GDExtensionTypePtr,
    p_argument_count: i32,
);

// ============================================================================
// Properties and methods
// ============================================================================

pub type GDExtensionPropertyHint = u32;

pub const PROPERTY_HINT_NONE: GDExtensionPropertyHint = 0;
pub const PROPERTY_HINT_RANGE: GDExtensionPropertyHint = 1;
pub const PROPERTY_HINT_ENUM: GDExtensionPropertyHint = 2;
pub const PROPERTY_HINT_ENUM_SUGGESTION: GDExtensionPropertyHint = 3;
pub const PROPERTY_HINT_EXP_EASING: GDExtensionPropertyHint = 4;
pub const PROPERTY_HINT_LINK: GDExtensionPropertyHint = 5;
pub const PROPERTY_HINT_FLAGS: GDExtensionPropertyHint = 6;
pub const PROPERTY_HINT_FILE: GDExtensionPropertyHint = 13;
pub const PROPERTY_HINT_DIR: GDExtensionPropertyHint = 14;
pub const PROPERTY_HINT_GLOBAL_FILE: GDExtensionPropertyHint = 15;
pub const PROPERTY_HINT_GLOBAL_DIR: GDExtensionPropertyHint = 16;
pub const PROPERTY_HINT_RESOURCE_TYPE: GDExtensionPropertyHint = 17;
pub const PROPERTY_HINT_MULTILINE_TEXT: GDExtensionPropertyHint = 18;
pub const PROPERTY_HINT_EXPRESSION: GDExtensionPropertyHint = 19;
pub const PROPERTY_HINT_PLACEHOLDER_TEXT: GDExtensionPropertyHint = 20;
pub const PROPERTY_HINT_COLOR_NO_ALPHA: GDExtensionPropertyHint = 21;
pub const PROPERTY_HINT_NODE_TYPE: GDExtensionPropertyHint = 34;

pub type GDExtensionPropertyUsageFlags = u32;

pub const PROPERTY_USAGE_NONE: GDExtensionPropertyUsageFlags = 0;
pub const PROPERTY_USAGE_STORAGE: GDExtensionPropertyUsageFlags = 2;
pub const PROPERTY_USAGE_EDITOR: GDExtensionPropertyUsageFlags = 4;
pub const PROPERTY_USAGE_INTERNAL: GDExtensionPropertyUsageFlags = 8;
pub const PROPERTY_USAGE_CHECKABLE: GDExtensionPropertyUsageFlags = 16;
pub const PROPERTY_USAGE_CHECKED: GDExtensionPropertyUsageFlags = 32;
pub const PROPERTY_USAGE_GROUP: GDExtensionPropertyUsageFlags = 64;
pub const PROPERTY_USAGE_CATEGORY: GDExtensionPropertyUsageFlags = 128;
pub const PROPERTY_USAGE_READ_ONLY: GDExtensionPropertyUsageFlags = 1 << 27;
pub const PROPERTY_USAGE_DEFAULT: GDExtensionPropertyUsageFlags =
    PROPERTY_USAGE_STORAGE | PROPERTY_USAGE_EDITOR;

/// Property descriptor as exchanged with the engine.
///
/// `name` and `class_name` point to string-name tokens, `hint_string` to a
/// string token. The side that allocates the descriptor owns the tokens.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GDExtensionPropertyInfo {
    pub type_: GDExtensionVariantType,
    pub name: GDExtensionStringNamePtr,
    pub class_name: GDExtensionStringNamePtr,
    pub hint: GDExtensionPropertyHint,
    pub hint_string: GDExtensionStringPtr,
    pub usage: GDExtensionPropertyUsageFlags,
}

pub type GDExtensionClassMethodFlags = u32;

pub const GDEXTENSION_METHOD_FLAG_NORMAL: GDExtensionClassMethodFlags = 1;
pub const GDEXTENSION_METHOD_FLAG_EDITOR: GDExtensionClassMethodFlags = 2;
pub const GDEXTENSION_METHOD_FLAG_CONST: GDExtensionClassMethodFlags = 4;
pub const GDEXTENSION_METHOD_FLAG_VIRTUAL: GDExtensionClassMethodFlags = 8;
pub const GDEXTENSION_METHOD_FLAG_VARARG: GDExtensionClassMethodFlags = 16;
pub const GDEXTENSION_METHOD_FLAG_STATIC: GDExtensionClassMethodFlags = 32;
pub const GDEXTENSION_METHOD_FLAGS_DEFAULT: GDExtensionClassMethodFlags =
    GDEXTENSION_METHOD_FLAG_NORMAL;

pub type GDExtensionClassMethodArgumentMetadata = u32;

pub const GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE: GDExtensionClassMethodArgumentMetadata = 0;

pub type GDExtensionClassMethodCall = unsafe extern "C" fn(
    method_userdata: *mut c_void,
    p_instance: GDExtensionClassInstancePtr,
    p_args: *const GDExtensionConstVariantPtr,
    p_argument_count: GDExtensionInt,
    r_return: GDExtensionVariantPtr,
    r_error: *mut GDExtensionCallError,
);
pub type GDExtensionClassMethodPtrCall = unsafe extern "C" fn(
    method_userdata: *mut c_void,
    p_instance: GDExtensionClassInstancePtr,
    p_args: *const GDExtensionConstTypePtr,
    r_ret: GDExtensionTypePtr,
);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GDExtensionClassMethodInfo {
    pub name: GDExtensionStringNamePtr,
    pub method_userdata: *mut c_void,
    pub call_func: Option<GDExtensionClassMethodCall>,
    pub ptrcall_func: Option<GDExtensionClassMethodPtrCall>,
    pub method_flags: GDExtensionClassMethodFlags,
    pub has_return_value: GDExtensionBool,
    pub return_value_info: *mut GDExtensionPropertyInfo,
    pub return_value_metadata: GDExtensionClassMethodArgumentMetadata,
    pub argument_count: u32,
    pub arguments_info: *mut GDExtensionPropertyInfo,
    pub arguments_metadata: *mut GDExtensionClassMethodArgumentMetadata,
    pub default_argument_count: u32,
    pub default_arguments: *mut GDExtensionVariantPtr,
}

// ============================================================================
// Class creation
// ============================================================================

pub type GDExtensionClassSet = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_name: GDExtensionConstStringNamePtr,
    p_value: GDExtensionConstVariantPtr,
) -> GDExtensionBool;
pub type GDExtensionClassGet = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_name: GDExtensionConstStringNamePtr,
    r_ret: GDExtensionVariantPtr,
) -> GDExtensionBool;
pub type GDExtensionClassGetPropertyList = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    r_count: *mut u32,
) -> *const GDExtensionPropertyInfo;
pub type GDExtensionClassFreePropertyList = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_list: *const GDExtensionPropertyInfo,
    p_count: u32,
);
pub type GDExtensionClassPropertyCanRevert = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_name: GDExtensionConstStringNamePtr,
) -> GDExtensionBool;
pub type GDExtensionClassPropertyGetRevert = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_name: GDExtensionConstStringNamePtr,
    r_ret: GDExtensionVariantPtr,
) -> GDExtensionBool;
pub type GDExtensionClassValidateProperty = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_property: *mut GDExtensionPropertyInfo,
) -> GDExtensionBool;
pub type GDExtensionClassNotification = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_what: i32,
    p_reversed: GDExtensionBool,
);
pub type GDExtensionClassToString = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    r_is_valid: *mut GDExtensionBool,
    p_out: GDExtensionStringPtr,
);
pub type GDExtensionClassReference = unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr);
pub type GDExtensionClassUnreference =
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr);
pub type GDExtensionClassCreateInstance =
    unsafe extern "C" fn(p_class_userdata: *mut c_void) -> GDExtensionObjectPtr;
pub type GDExtensionClassFreeInstance = unsafe extern "C" fn(
    p_class_userdata: *mut c_void,
    p_instance: GDExtensionClassInstancePtr,
);
pub type GDExtensionClassGetVirtualCallData = unsafe extern "C" fn(
    p_class_userdata: *mut c_void,
    p_name: GDExtensionConstStringNamePtr,
) -> *mut c_void;
pub type GDExtensionClassCallVirtualWithData = unsafe extern "C" fn(
    p_instance: GDExtensionClassInstancePtr,
    p_name: GDExtensionConstStringNamePtr,
    p_virtual_call_userdata: *mut c_void,
    p_args: *const GDExtensionConstTypePtr,
    r_ret: GDExtensionTypePtr,
);
pub type GDExtensionClassGetRID =
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr) -> u64;

/// Callback table submitted with every extension class.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GDExtensionClassCreationInfo {
    pub is_virtual: GDExtensionBool,
    pub is_abstract: GDExtensionBool,
    pub is_exposed: GDExtensionBool,
    pub set_func: Option<GDExtensionClassSet>,
    pub get_func: Option<GDExtensionClassGet>,
    pub get_property_list_func: Option<GDExtensionClassGetPropertyList>,
    pub free_property_list_func: Option<GDExtensionClassFreePropertyList>,
    pub property_can_revert_func: Option<GDExtensionClassPropertyCanRevert>,
    pub property_get_revert_func: Option<GDExtensionClassPropertyGetRevert>,
    pub validate_property_func: Option<GDExtensionClassValidateProperty>,
    pub notification_func: Option<GDExtensionClassNotification>,
    pub to_string_func: Option<GDExtensionClassToString>,
    pub reference_func: Option<GDExtensionClassReference>,
    pub unreference_func: Option<GDExtensionClassUnreference>,
    pub create_instance_func: Option<GDExtensionClassCreateInstance>,
    pub free_instance_func: Option<GDExtensionClassFreeInstance>,
    pub get_virtual_call_data_func: Option<GDExtensionClassGetVirtualCallData>,
    pub call_virtual_with_data_func: Option<GDExtensionClassCallVirtualWithData>,
    pub get_rid_func: Option<GDExtensionClassGetRID>,
    pub class_userdata: *mut c_void,
}

// ============================================================================
// Initialization
// ============================================================================

pub type GDExtensionInitializationLevel = u32;

pub const GDEXTENSION_INITIALIZATION_CORE: GDExtensionInitializationLevel = 0;
pub const GDEXTENSION_INITIALIZATION_SERVERS: GDExtensionInitializationLevel = 1;
pub const GDEXTENSION_INITIALIZATION_SCENE: GDExtensionInitializationLevel = 2;
pub const GDEXTENSION_INITIALIZATION_EDITOR: GDExtensionInitializationLevel = 3;
pub const GDEXTENSION_MAX_INITIALIZATION_LEVEL: GDExtensionInitializationLevel = 4;

pub type GDExtensionInitializeCallback =
    unsafe extern "C" fn(userdata: *mut c_void, p_level: GDExtensionInitializationLevel);
pub type GDExtensionDeinitializeCallback =
    unsafe extern "C" fn(userdata: *mut c_void, p_level: GDExtensionInitializationLevel);

/// Filled in by the extension's entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GDExtensionInitialization {
    pub minimum_initialization_level: GDExtensionInitializationLevel,
    pub userdata: *mut c_void,
    pub initialize: Option<GDExtensionInitializeCallback>,
    pub deinitialize: Option<GDExtensionDeinitializeCallback>,
}

pub type GDExtensionInterfaceFunctionPtr = Option<unsafe extern "C" fn()>;
pub type GDExtensionInterfaceGetProcAddress =
    unsafe extern "C" fn(p_function_name: *const c_char) -> GDExtensionInterfaceFunctionPtr;

/// Signature of the symbol the engine looks up when loading an extension.
pub type GDExtensionInitializationFunction = unsafe extern "C" fn(
    p_get_proc_address: Option<GDExtensionInterfaceGetProcAddress>,
    p_library: GDExtensionClassLibraryPtr,
    r_initialization: *mut GDExtensionInitialization,
) -> GDExtensionBool;

// ============================================================================
// Notifications
// ============================================================================

pub const NOTIFICATION_POSTINITIALIZE: i32 = 0;
pub const NOTIFICATION_PREDELETE: i32 = 1;
pub const NOTIFICATION_ENTER_TREE: i32 = 10;
pub const NOTIFICATION_EXIT_TREE: i32 = 11;
pub const NOTIFICATION_READY: i32 = 13;
pub const NOTIFICATION_PAUSED: i32 = 14;
pub const NOTIFICATION_UNPAUSED: i32 = 15;
pub const NOTIFICATION_PHYSICS_PROCESS: i32 = 16;
pub const NOTIFICATION_PROCESS: i32 = 17;

// ============================================================================
// Interface functions
// ============================================================================

pub type GDExtensionInterfacePrintError = unsafe extern "C" fn(
    p_description: *const c_char,
    p_function: *const c_char,
    p_file: *const c_char,
    p_line: i32,
    p_editor_notify: GDExtensionBool,
);
pub type GDExtensionInterfacePrintWarning = GDExtensionInterfacePrintError;

pub type GDExtensionInterfaceVariantNewCopy =
    unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr, p_src: GDExtensionConstVariantPtr);
pub type GDExtensionInterfaceVariantNewNil =
    unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr);
pub type GDExtensionInterfaceVariantDestroy = unsafe extern "C" fn(p_self: GDExtensionVariantPtr);
pub type GDExtensionInterfaceVariantEvaluate = unsafe extern "C" fn(
    p_op: GDExtensionVariantOperator,
    p_a: GDExtensionConstVariantPtr,
    p_b: GDExtensionConstVariantPtr,
    r_return: GDExtensionUninitializedVariantPtr,
    r_valid: *mut GDExtensionBool,
);
pub type GDExtensionInterfaceVariantStringify =
    unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr, r_ret: GDExtensionStringPtr);

pub type GDExtensionInterfaceGetVariantFromTypeConstructor =
    unsafe extern "C" fn(p_type: GDExtensionVariantType) -> Option<GDExtensionVariantFromTypeConstructorFunc>;
pub type GDExtensionInterfaceGetVariantToTypeConstructor =
    unsafe extern "C" fn(p_type: GDExtensionVariantType) -> Option<GDExtensionTypeFromVariantConstructorFunc>;
pub type GDExtensionInterfaceVariantGetPtrConstructor = unsafe extern "C" fn(
    p_type: GDExtensionVariantType,
    p_constructor: i32,
) -> Option<GDExtensionPtrConstructor>;
pub type GDExtensionInterfaceVariantGetPtrDestructor =
    unsafe extern "C" fn(p_type: GDExtensionVariantType) -> Option<GDExtensionPtrDestructor>;
pub type GDExtensionInterfaceVariantGetPtrBuiltinMethod = unsafe extern "C" fn(
    p_type: GDExtensionVariantType,
    p_method: GDExtensionConstStringNamePtr,
    p_hash: GDExtensionInt,
) -> Option<GDExtensionPtrBuiltInMethod>;

pub type GDExtensionInterfaceStringNewWithUtf32CharsAndLen = unsafe extern "C" fn(
    r_dest: GDExtensionUninitializedStringPtr,
    p_contents: *const char32_t,
    p_size: GDExtensionInt,
);
pub type GDExtensionInterfaceStringToUtf32Chars = unsafe extern "C" fn(
    p_self: GDExtensionConstStringPtr,
    r_text: *mut char32_t,
    p_max_write_length: GDExtensionInt,
) -> GDExtensionInt;
pub type GDExtensionInterfaceStringNameNewWithUtf8CharsAndLen = unsafe extern "C" fn(
    r_dest: GDExtensionUninitializedStringNamePtr,
    p_contents: *const c_char,
    p_size: GDExtensionInt,
);

pub type GDExtensionInterfacePackedByteArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut u8;
pub type GDExtensionInterfacePackedInt32ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i32;
pub type GDExtensionInterfacePackedInt64ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i64;
pub type GDExtensionInterfacePackedFloat32ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f32;
pub type GDExtensionInterfacePackedFloat64ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f64;
pub type GDExtensionInterfacePackedStringArrayOperatorIndex = unsafe extern "C" fn(
    p_self: GDExtensionTypePtr,
    p_index: GDExtensionInt,
) -> GDExtensionStringPtr;
pub type GDExtensionInterfacePackedVector2ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr;
pub type GDExtensionInterfacePackedVector3ArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr;
pub type GDExtensionInterfacePackedColorArrayOperatorIndex =
    unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionTypePtr;
pub type GDExtensionInterfaceArrayOperatorIndex = unsafe extern "C" fn(
    p_self: GDExtensionTypePtr,
    p_index: GDExtensionInt,
) -> GDExtensionVariantPtr;
pub type GDExtensionInterfaceDictionaryOperatorIndex = unsafe extern "C" fn(
    p_self: GDExtensionTypePtr,
    p_key: GDExtensionConstVariantPtr,
) -> GDExtensionVariantPtr;

pub type GDExtensionInterfaceObjectMethodBindCall = unsafe extern "C" fn(
    p_method_bind: GDExtensionMethodBindPtr,
    p_instance: GDExtensionObjectPtr,
    p_args: *const GDExtensionConstVariantPtr,
    p_arg_count: GDExtensionInt,
    r_ret: GDExtensionUninitializedVariantPtr,
    r_error: *mut GDExtensionCallError,
);
pub type GDExtensionInterfaceObjectMethodBindPtrcall = unsafe extern "C" fn(
    p_method_bind: GDExtensionMethodBindPtr,
    p_instance: GDExtensionObjectPtr,
    p_args: *const GDExtensionConstTypePtr,
    r_ret: GDExtensionTypePtr,
);
pub type GDExtensionInterfaceObjectDestroy = unsafe extern "C" fn(p_o: GDExtensionObjectPtr);
pub type GDExtensionInterfaceGlobalGetSingleton =
    unsafe extern "C" fn(p_name: GDExtensionConstStringNamePtr) -> GDExtensionObjectPtr;
pub type GDExtensionInterfaceObjectSetInstance = unsafe extern "C" fn(
    p_o: GDExtensionObjectPtr,
    p_classname: GDExtensionConstStringNamePtr,
    p_instance: GDExtensionClassInstancePtr,
);
pub type GDExtensionInterfaceObjectGetClassName = unsafe extern "C" fn(
    p_object: GDExtensionConstObjectPtr,
    p_library: GDExtensionClassLibraryPtr,
    r_class_name: GDExtensionUninitializedStringNamePtr,
) -> GDExtensionBool;
pub type GDExtensionInterfaceObjectCastTo = unsafe extern "C" fn(
    p_object: GDExtensionConstObjectPtr,
    p_class_tag: *mut c_void,
) -> GDExtensionObjectPtr;
pub type GDExtensionInterfaceObjectGetInstanceFromId =
    unsafe extern "C" fn(p_instance_id: GDObjectInstanceID) -> GDExtensionObjectPtr;
pub type GDExtensionInterfaceObjectGetInstanceId =
    unsafe extern "C" fn(p_object: GDExtensionConstObjectPtr) -> GDObjectInstanceID;

pub type GDExtensionInterfaceClassdbConstructObject =
    unsafe extern "C" fn(p_classname: GDExtensionConstStringNamePtr) -> GDExtensionObjectPtr;
pub type GDExtensionInterfaceClassdbGetMethodBind = unsafe extern "C" fn(
    p_classname: GDExtensionConstStringNamePtr,
    p_methodname: GDExtensionConstStringNamePtr,
    p_hash: GDExtensionInt,
) -> GDExtensionMethodBindPtr;
pub type GDExtensionInterfaceClassdbGetClassTag =
    unsafe extern "C" fn(p_classname: GDExtensionConstStringNamePtr) -> *mut c_void;
pub type GDExtensionInterfaceClassdbRegisterExtensionClass = unsafe extern "C" fn(
    p_library: GDExtensionClassLibraryPtr,
    p_class_name: GDExtensionConstStringNamePtr,
    p_parent_class_name: GDExtensionConstStringNamePtr,
    p_extension_funcs: *const GDExtensionClassCreationInfo,
);
pub type GDExtensionInterfaceClassdbRegisterExtensionClassMethod = unsafe extern "C" fn(
    p_library: GDExtensionClassLibraryPtr,
    p_class_name: GDExtensionConstStringNamePtr,
    p_method_info: *const GDExtensionClassMethodInfo,
);
pub type GDExtensionInterfaceClassdbRegisterExtensionClassSignal = unsafe extern "C" fn(
    p_library: GDExtensionClassLibraryPtr,
    p_class_name: GDExtensionConstStringNamePtr,
    p_signal_name: GDExtensionConstStringNamePtr,
    p_argument_info: *const GDExtensionPropertyInfo,
    p_argument_count: GDExtensionInt,
);
pub type GDExtensionInterfaceClassdbUnregisterExtensionClass = unsafe extern "C" fn(
    p_library: GDExtensionClassLibraryPtr,
    p_class_name: GDExtensionConstStringNamePtr,
);
