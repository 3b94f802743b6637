//! Registration of extension classes with the engine.
//!
//! Every registered class gets a [`ClassRecord`] that lives for the rest of
//! the process. Its address is the `class_userdata` the engine hands back to
//! the creation callbacks, and the virtual and method tables inside it are
//! boxed so the pointers given out as call data never move. Unregistering a
//! class only marks the record inactive; callbacks that still arrive for it
//! answer with neutral values.

use std::any::Any;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use gdbridge_sys as sys;

use crate::builtin::{Container, StringName};
use crate::classes::EngineClass;
use crate::config::InitLevel;
use crate::error::{BridgeError, BridgeResult};
use crate::interface::interface;

use super::builder::{ClassBuilder, HostMethod, VirtualEntry};
use super::callbacks;
use super::property::SysPropertyList;
use super::{ClassFlags, ClassMeta, ExtensionClass};

/// Virtual and method tables of one class.
pub(crate) struct ClassTables<H> {
    pub(crate) virtuals: Vec<Box<VirtualEntry<H>>>,
    pub(crate) methods: Vec<Box<HostMethod<H>>>,
}

/// Everything the callbacks of one registered class need.
pub(crate) struct ClassRecord {
    pub(crate) name: &'static str,
    pub(crate) parent: &'static str,
    pub(crate) flags: ClassFlags,
    pub(crate) level: InitLevel,
    pub(crate) name_token: StringName,
    pub(crate) parent_token: StringName,
    pub(crate) meta: ClassMeta,
    active: AtomicBool,
    tables: Box<dyn Any + Send + Sync>,
}

impl ClassRecord {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn tables<H: ExtensionClass>(&self) -> Option<&ClassTables<H>> {
        self.tables.downcast_ref::<ClassTables<H>>()
    }

    /// Recovers the record from the engine's class userdata.
    ///
    /// # Safety
    /// `userdata` must be a pointer handed out by [`ClassRegistrar::try_register`].
    pub(crate) unsafe fn from_userdata(userdata: *mut c_void) -> Option<&'static ClassRecord> {
        let record = unsafe { (userdata as *const ClassRecord).as_ref() }?;
        record.is_active().then_some(record)
    }
}

static CLASSES: OnceLock<Mutex<Vec<&'static ClassRecord>>> = OnceLock::new();

fn classes() -> MutexGuard<'static, Vec<&'static ClassRecord>> {
    let table = CLASSES.get_or_init(|| Mutex::new(Vec::new()));
    match table.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Active record of the class `name`.
pub(crate) fn find(name: &str) -> Option<&'static ClassRecord> {
    classes().iter().copied().find(|record| record.name == name)
}

/// True while the class `name` is registered with the engine.
pub fn is_registered(name: &str) -> bool {
    find(name).is_some()
}

/// Names of the registered classes, in registration order.
pub fn registered_classes() -> Vec<&'static str> {
    classes().iter().map(|record| record.name).collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Registers extension classes during one initialization level.
pub struct ClassRegistrar {
    level: InitLevel,
    registered: Vec<&'static str>,
}

impl ClassRegistrar {
    pub(crate) fn new(level: InitLevel) -> Self {
        Self {
            level,
            registered: Vec::new(),
        }
    }

    pub fn level(&self) -> InitLevel {
        self.level
    }

    /// Classes registered through this registrar so far.
    pub fn registered(&self) -> &[&'static str] {
        &self.registered
    }

    /// Registers `H`, logging and skipping the class when it is rejected.
    pub fn register<H: ExtensionClass>(&mut self) -> &mut Self {
        if let Err(err) = self.try_register::<H>() {
            log::error!("class {} was not registered: {}", H::CLASS_NAME, err);
        }
        self
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_register<H: ExtensionClass>(&mut self) -> BridgeResult<()> {
        let name = H::CLASS_NAME;
        let parent = <H::Base as EngineClass>::CLASS_NAME;

        if !is_identifier(name) {
            return Err(BridgeError::InvalidClass {
                class: name.to_string(),
                reason: "the name is not an identifier".to_string(),
            });
        }
        if is_registered(name) {
            return Err(BridgeError::DuplicateClass {
                class: name.to_string(),
            });
        }

        let table = interface()?;
        if table.class_tag(parent).is_null() {
            return Err(BridgeError::UnknownParent {
                class: name.to_string(),
                parent: parent.to_string(),
            });
        }

        let mut builder = ClassBuilder::<H>::new();
        H::register(&mut builder);
        let builder = builder.finish()?;
        let meta = H::meta();

        let tables = ClassTables {
            virtuals: builder.virtuals.into_iter().map(Box::new).collect(),
            methods: builder.methods.into_iter().map(Box::new).collect(),
        };
        let record: &'static ClassRecord = Box::leak(Box::new(ClassRecord {
            name,
            parent,
            flags: H::FLAGS,
            level: self.level,
            name_token: StringName::from(name),
            parent_token: StringName::from(parent),
            meta,
            active: AtomicBool::new(true),
            tables: Box::new(tables),
        }));

        let info = callbacks::creation_info::<H>(record);
        unsafe {
            (table.classdb_register_extension_class)(
                table.library(),
                record.name_token.sys(),
                record.parent_token.sys(),
                &info,
            );
        }

        if let Some(tables) = record.tables::<H>() {
            for method in &tables.methods {
                register_method(record, method);
            }
        }

        for signal in &record.meta.signals {
            let args = SysPropertyList::from_meta(&signal.args);
            let signal_name = StringName::from(signal.name);
            unsafe {
                (table.classdb_register_extension_class_signal)(
                    table.library(),
                    record.name_token.sys(),
                    signal_name.sys(),
                    args.as_ptr(),
                    args.len() as sys::GDExtensionInt,
                );
            }
        }

        classes().push(record);
        self.registered.push(name);
        log::debug!(
            "registered class {} extends {} at {:?} ({} virtuals, {} properties)",
            name,
            parent,
            self.level,
            record.tables::<H>().map_or(0, |t| t.virtuals.len()),
            record.meta.properties.len()
        );
        Ok(())
    }
}

fn register_method<H: ExtensionClass>(record: &'static ClassRecord, method: &HostMethod<H>) {
    let Ok(table) = interface() else {
        return;
    };
    let method_name = StringName::from(method.name);
    let mut args = SysPropertyList::from_meta(&method.args);
    let mut ret = SysPropertyList::from_meta(method.ret.as_slice());
    let mut metadata = vec![sys::GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE; method.args.len()];

    let info = sys::GDExtensionClassMethodInfo {
        name: method_name.sys() as sys::GDExtensionStringNamePtr,
        method_userdata: method as *const HostMethod<H> as *mut c_void,
        call_func: Some(callbacks::method_call::<H>),
        ptrcall_func: Some(callbacks::method_ptrcall::<H>),
        method_flags: sys::GDEXTENSION_METHOD_FLAGS_DEFAULT,
        has_return_value: u8::from(method.ret.is_some()),
        return_value_info: if ret.is_empty() {
            std::ptr::null_mut()
        } else {
            ret.as_mut_ptr()
        },
        return_value_metadata: sys::GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE,
        argument_count: args.len() as u32,
        arguments_info: args.as_mut_ptr(),
        arguments_metadata: metadata.as_mut_ptr(),
        default_argument_count: 0,
        default_arguments: std::ptr::null_mut(),
    };
    // The engine copies everything it keeps out of `info` before returning.
    unsafe {
        (table.classdb_register_extension_class_method)(table.library(), record.name_token.sys(), &info);
    }
}

/// Unregisters every class registered at `level`, most recent first.
pub fn unregister_level(level: InitLevel) {
    let records: Vec<&'static ClassRecord> = {
        let mut classes = classes();
        let (taken, kept): (Vec<_>, Vec<_>) = classes.drain(..).partition(|record| record.level == level);
        *classes = kept;
        taken
    };

    for record in records.into_iter().rev() {
        record.active.store(false, Ordering::Release);
        match interface() {
            Ok(table) => unsafe {
                (table.classdb_unregister_extension_class)(table.library(), record.name_token.sys());
            },
            Err(err) => log::warn!("cannot unregister {}: {}", record.name, err),
        }
        log::debug!("unregistered class {}", record.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassHooks, PropertyMeta};
    use crate::classes::{Node, RefCounted};
    use crate::error::ConversionError;
    use crate::obj::Base;
    use crate::test_support;
    use crate::variant::Variant;

    macro_rules! test_class {
        ($name:ident, $class:literal, $base:ty) => {
            struct $name {
                _base: Base<$base>,
            }

            impl ClassHooks for $name {}

            impl ExtensionClass for $name {
                type Base = $base;
                const CLASS_NAME: &'static str = $class;
                const FLAGS: ClassFlags = ClassFlags::EXPOSED;

                fn create(base: Base<$base>) -> Self {
                    Self { _base: base }
                }

                fn meta() -> ClassMeta {
                    ClassMeta {
                        properties: vec![PropertyMeta::of::<i64>("level")],
                        signals: Vec::new(),
                    }
                }

                fn get_field(&self, _name: &str) -> Option<Variant> {
                    None
                }

                fn set_field(&mut self, _name: &str, _value: &Variant) -> Result<bool, ConversionError> {
                    Ok(false)
                }

                fn field_default(_name: &str) -> Option<Variant> {
                    None
                }
            }
        };
    }

    test_class!(Lantern, "Lantern", Node);
    test_class!(Lantern2, "Lantern", RefCounted);
    test_class!(Broken, "Not A Name", Node);
    test_class!(Ledger, "Ledger", RefCounted);

    #[test]
    fn identifiers_are_validated() {
        assert!(is_identifier("Player"));
        assert!(is_identifier("_Hidden2"));
        assert!(!is_identifier("2Fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("has space"));
    }

    #[test]
    fn registration_is_visible_and_unique() {
        test_support::load();
        let mut registrar = ClassRegistrar::new(InitLevel::Editor);
        registrar.try_register::<Lantern>().unwrap();
        assert!(is_registered("Lantern"));
        assert!(registered_classes().contains(&"Lantern"));
        assert_eq!(find("Lantern").unwrap().parent, "Node");

        assert_eq!(
            registrar.try_register::<Lantern2>().unwrap_err(),
            BridgeError::DuplicateClass {
                class: "Lantern".to_string()
            }
        );
        assert_eq!(registrar.registered(), &["Lantern"]);
    }

    #[test]
    fn bad_names_are_rejected() {
        test_support::load();
        let mut registrar = ClassRegistrar::new(InitLevel::Scene);
        assert!(matches!(
            registrar.try_register::<Broken>(),
            Err(BridgeError::InvalidClass { .. })
        ));
        assert!(!is_registered("Not A Name"));
    }

    #[test]
    fn unregistering_a_level_deactivates_its_records() {
        test_support::load();
        let mut registrar = ClassRegistrar::new(InitLevel::Servers);
        registrar.try_register::<Ledger>().unwrap();
        let record = find("Ledger").unwrap();
        assert!(record.is_active());

        unregister_level(InitLevel::Servers);
        assert!(!is_registered("Ledger"));
        assert!(!record.is_active());
        let userdata = record as *const ClassRecord as *mut c_void;
        assert!(unsafe { ClassRecord::from_userdata(userdata) }.is_none());
    }
}
