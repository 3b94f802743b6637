//! Engine interface table.
//!
//! The engine hands the extension a resolver (`get_proc_address`) at load
//! time. Every function the bridge needs is queried exactly once by its
//! stable name and cached here. Missing required functions fail the load;
//! optional functions are stored as `Option` and checked at use.
//!
//! The table is process-wide. It is published through an atomic pointer so
//! that readers on engine worker threads never take a lock, and cleared when
//! the engine deinitializes the core level.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Mutex;

use gdbridge_sys as sys;
use rustc_hash::FxHashMap;

use crate::builtin::{Container, StringName};
use crate::error::{BridgeError, BridgeResult};
use crate::variant::VariantType;

static INTERFACE: AtomicPtr<InterfaceTable> = AtomicPtr::new(ptr::null_mut());

macro_rules! interface_table {
    (
        required { $($name:ident: $ty:ty,)* }
        optional { $($opt:ident: $oty:ty,)* }
    ) => {
        /// Typed pointers to every engine function the bridge calls.
        pub struct InterfaceTable {
            library: usize,
            builtins: Vec<BuiltinLifecycle>,
            method_binds: Mutex<FxHashMap<(&'static str, &'static str), usize>>,
            builtin_methods: Mutex<FxHashMap<(u32, &'static str), sys::GDExtensionPtrBuiltInMethod>>,
            singletons: Mutex<FxHashMap<&'static str, usize>>,
            $(pub $name: $ty,)*
            $(pub $opt: Option<$oty>,)*
        }

        impl InterfaceTable {
            unsafe fn resolve(
                get_proc_address: sys::GDExtensionInterfaceGetProcAddress,
                library: sys::GDExtensionClassLibraryPtr,
            ) -> BridgeResult<Self> {
                $(
                    let $name: $ty = match unsafe {
                        get_proc_address(concat!(stringify!($name), "\0").as_ptr().cast())
                    } {
                        Some(f) => unsafe { std::mem::transmute::<unsafe extern "C" fn(), $ty>(f) },
                        None => {
                            return Err(BridgeError::MissingInterface {
                                name: stringify!($name),
                            })
                        }
                    };
                )*
                $(
                    let $opt: Option<$oty> = unsafe {
                        get_proc_address(concat!(stringify!($opt), "\0").as_ptr().cast())
                    }
                    .map(|f| unsafe { std::mem::transmute::<unsafe extern "C" fn(), $oty>(f) });
                )*

                let mut table = InterfaceTable {
                    library: library as usize,
                    builtins: Vec::with_capacity(sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX as usize),
                    method_binds: Mutex::new(FxHashMap::default()),
                    builtin_methods: Mutex::new(FxHashMap::default()),
                    singletons: Mutex::new(FxHashMap::default()),
                    $($name,)*
                    $($opt,)*
                };
                for ty in 0..sys::GDEXTENSION_VARIANT_TYPE_VARIANT_MAX {
                    let lifecycle = unsafe {
                        BuiltinLifecycle {
                            from_type: (table.get_variant_from_type_constructor)(ty),
                            to_type: (table.get_variant_to_type_constructor)(ty),
                            construct_default: (table.variant_get_ptr_constructor)(ty, 0),
                            construct_copy: (table.variant_get_ptr_constructor)(ty, 1),
                            construct_convert: (table.variant_get_ptr_constructor)(ty, 2),
                            destroy: (table.variant_get_ptr_destructor)(ty),
                        }
                    };
                    table.builtins.push(lifecycle);
                }
                Ok(table)
            }
        }
    };
}

interface_table! {
    required {
        print_error: sys::GDExtensionInterfacePrintError,
        print_warning: sys::GDExtensionInterfacePrintWarning,
        variant_new_copy: sys::GDExtensionInterfaceVariantNewCopy,
        variant_new_nil: sys::GDExtensionInterfaceVariantNewNil,
        variant_destroy: sys::GDExtensionInterfaceVariantDestroy,
        variant_evaluate: sys::GDExtensionInterfaceVariantEvaluate,
        variant_stringify: sys::GDExtensionInterfaceVariantStringify,
        get_variant_from_type_constructor: sys::GDExtensionInterfaceGetVariantFromTypeConstructor,
        get_variant_to_type_constructor: sys::GDExtensionInterfaceGetVariantToTypeConstructor,
        variant_get_ptr_constructor: sys::GDExtensionInterfaceVariantGetPtrConstructor,
        variant_get_ptr_destructor: sys::GDExtensionInterfaceVariantGetPtrDestructor,
        variant_get_ptr_builtin_method: sys::GDExtensionInterfaceVariantGetPtrBuiltinMethod,
        string_new_with_utf32_chars_and_len: sys::GDExtensionInterfaceStringNewWithUtf32CharsAndLen,
        string_to_utf32_chars: sys::GDExtensionInterfaceStringToUtf32Chars,
        packed_byte_array_operator_index: sys::GDExtensionInterfacePackedByteArrayOperatorIndex,
        packed_int32_array_operator_index: sys::GDExtensionInterfacePackedInt32ArrayOperatorIndex,
        packed_int64_array_operator_index: sys::GDExtensionInterfacePackedInt64ArrayOperatorIndex,
        packed_float32_array_operator_index: sys::GDExtensionInterfacePackedFloat32ArrayOperatorIndex,
        packed_float64_array_operator_index: sys::GDExtensionInterfacePackedFloat64ArrayOperatorIndex,
        packed_string_array_operator_index: sys::GDExtensionInterfacePackedStringArrayOperatorIndex,
        packed_vector2_array_operator_index: sys::GDExtensionInterfacePackedVector2ArrayOperatorIndex,
        packed_vector3_array_operator_index: sys::GDExtensionInterfacePackedVector3ArrayOperatorIndex,
        packed_color_array_operator_index: sys::GDExtensionInterfacePackedColorArrayOperatorIndex,
        array_operator_index: sys::GDExtensionInterfaceArrayOperatorIndex,
        dictionary_operator_index: sys::GDExtensionInterfaceDictionaryOperatorIndex,
        object_method_bind_call: sys::GDExtensionInterfaceObjectMethodBindCall,
        object_method_bind_ptrcall: sys::GDExtensionInterfaceObjectMethodBindPtrcall,
        object_destroy: sys::GDExtensionInterfaceObjectDestroy,
        global_get_singleton: sys::GDExtensionInterfaceGlobalGetSingleton,
        object_set_instance: sys::GDExtensionInterfaceObjectSetInstance,
        object_cast_to: sys::GDExtensionInterfaceObjectCastTo,
        object_get_instance_from_id: sys::GDExtensionInterfaceObjectGetInstanceFromId,
        object_get_instance_id: sys::GDExtensionInterfaceObjectGetInstanceId,
        classdb_construct_object: sys::GDExtensionInterfaceClassdbConstructObject,
        classdb_get_method_bind: sys::GDExtensionInterfaceClassdbGetMethodBind,
        classdb_get_class_tag: sys::GDExtensionInterfaceClassdbGetClassTag,
        classdb_register_extension_class: sys::GDExtensionInterfaceClassdbRegisterExtensionClass,
        classdb_register_extension_class_method: sys::GDExtensionInterfaceClassdbRegisterExtensionClassMethod,
        classdb_register_extension_class_signal: sys::GDExtensionInterfaceClassdbRegisterExtensionClassSignal,
        classdb_unregister_extension_class: sys::GDExtensionInterfaceClassdbUnregisterExtensionClass,
    }
    optional {
        string_name_new_with_utf8_chars_and_len: sys::GDExtensionInterfaceStringNameNewWithUtf8CharsAndLen,
        object_get_class_name: sys::GDExtensionInterfaceObjectGetClassName,
    }
}

/// Constructors, destructor and variant conversions of one builtin type.
///
/// Constructor index 0 is the default constructor, 1 the copy constructor and
/// 2 the conversion from the sibling string type (string <-> string-name,
/// string -> node-path).
#[derive(Debug, Clone, Copy)]
pub struct BuiltinLifecycle {
    pub from_type: Option<sys::GDExtensionVariantFromTypeConstructorFunc>,
    pub to_type: Option<sys::GDExtensionTypeFromVariantConstructorFunc>,
    pub construct_default: Option<sys::GDExtensionPtrConstructor>,
    pub construct_copy: Option<sys::GDExtensionPtrConstructor>,
    pub construct_convert: Option<sys::GDExtensionPtrConstructor>,
    pub destroy: Option<sys::GDExtensionPtrDestructor>,
}

impl InterfaceTable {
    /// Extension token passed to every class-db call.
    pub fn library(&self) -> sys::GDExtensionClassLibraryPtr {
        self.library as sys::GDExtensionClassLibraryPtr
    }

    pub fn lifecycle(&self, ty: VariantType) -> &BuiltinLifecycle {
        &self.builtins[ty as usize]
    }

    /// Method bind of an engine class method, resolved once per load.
    pub fn method_bind(
        &self,
        class: &'static str,
        method: &'static str,
    ) -> BridgeResult<sys::GDExtensionMethodBindPtr> {
        if let Some(bind) = self.method_binds.lock()?.get(&(class, method)) {
            return Ok(*bind as sys::GDExtensionMethodBindPtr);
        }

        let class_name = StringName::from(class);
        let method_name = StringName::from(method);
        let bind = unsafe {
            (self.classdb_get_method_bind)(class_name.sys(), method_name.sys(), 0)
        };
        if bind.is_null() {
            return Err(BridgeError::MissingMethod { class, method });
        }

        self.method_binds
            .lock()?
            .insert((class, method), bind as usize);
        Ok(bind)
    }

    /// Builtin method of a variant type (`size`, `resize`, ...), resolved once per load.
    pub fn builtin_method(
        &self,
        ty: VariantType,
        method: &'static str,
    ) -> BridgeResult<sys::GDExtensionPtrBuiltInMethod> {
        if let Some(func) = self.builtin_methods.lock()?.get(&(ty as u32, method)) {
            return Ok(*func);
        }

        let name = StringName::from(method);
        let func = unsafe { (self.variant_get_ptr_builtin_method)(ty as u32, name.sys(), 0) }
            .ok_or(BridgeError::MissingMethod {
                class: ty.name(),
                method,
            })?;

        self.builtin_methods
            .lock()?
            .insert((ty as u32, method), func);
        Ok(func)
    }

    /// Engine singleton by name, acquired on first use.
    pub fn singleton(&self, name: &'static str) -> BridgeResult<sys::GDExtensionObjectPtr> {
        let mut singletons = self.singletons.lock()?;
        if let Some(object) = singletons.get(name) {
            return Ok(*object as sys::GDExtensionObjectPtr);
        }

        let class_name = StringName::from(name);
        let object = unsafe { (self.global_get_singleton)(class_name.sys()) };
        if object.is_null() {
            return Err(BridgeError::MissingSingleton(name));
        }
        singletons.insert(name, object as usize);
        Ok(object)
    }

    /// Class tag used by `object_cast_to`; null when the engine does not know the class.
    pub fn class_tag(&self, class: &str) -> *mut c_void {
        let class_name = StringName::from(class);
        unsafe { (self.classdb_get_class_tag)(class_name.sys()) }
    }
}

/// Resolves the interface table and publishes it process-wide.
///
/// # Safety
/// `get_proc_address` must be the resolver the engine passed to the entry point.
pub unsafe fn load(
    get_proc_address: Option<sys::GDExtensionInterfaceGetProcAddress>,
    library: sys::GDExtensionClassLibraryPtr,
) -> BridgeResult<()> {
    let get_proc_address = get_proc_address.ok_or(BridgeError::MissingInterface {
        name: "get_proc_address",
    })?;
    let table = unsafe { InterfaceTable::resolve(get_proc_address, library)? };
    // A previous table may still be referenced by in-flight callers, so it is leaked.
    INTERFACE.swap(Box::into_raw(Box::new(table)), Ordering::AcqRel);
    Ok(())
}

/// Clears the cached pointers. Later calls see [`BridgeError::NotInitialized`].
pub fn unload() {
    INTERFACE.swap(ptr::null_mut(), Ordering::AcqRel);
}

pub fn is_loaded() -> bool {
    !INTERFACE.load(Ordering::Acquire).is_null()
}

/// The loaded interface table.
pub fn interface() -> BridgeResult<&'static InterfaceTable> {
    let table = INTERFACE.load(Ordering::Acquire);
    // Tables are never freed once published.
    unsafe { table.as_ref() }.ok_or(BridgeError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_char;

    unsafe extern "C" fn resolve_nothing(_name: *const c_char) -> sys::GDExtensionInterfaceFunctionPtr {
        None
    }

    #[test]
    fn missing_required_function_fails_the_load() {
        let err = unsafe { InterfaceTable::resolve(resolve_nothing, ptr::null_mut()) }
            .err()
            .unwrap();
        assert_eq!(err, BridgeError::MissingInterface { name: "print_error" });
    }

    #[test]
    fn missing_resolver_fails_the_load() {
        let err = unsafe { load(None, ptr::null_mut()) }.unwrap_err();
        assert_eq!(
            err,
            BridgeError::MissingInterface {
                name: "get_proc_address"
            }
        );
    }

    #[test]
    fn mock_engine_provides_every_required_function() {
        crate::test_support::load();
        let table = interface().unwrap();
        assert!(table.string_name_new_with_utf8_chars_and_len.is_some());
        assert!(table.lifecycle(VariantType::String).destroy.is_some());
        assert!(table.lifecycle(VariantType::Int).destroy.is_none());
    }
}
