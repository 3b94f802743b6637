//! Class registry and instance bridge.
//!
//! A host type becomes an engine class by implementing [`ExtensionClass`]
//! (normally through `#[derive(ExtensionClass)]`) and being registered with a
//! [`ClassRegistrar`] during library initialization. The registry hands the
//! engine a table of `extern "C"` callbacks monomorphized for the host type;
//! those callbacks construct host instances on engine demand, route virtual
//! calls, reflect exported fields as properties, deliver notifications and
//! tear instances down again.
//!
//! ## Lifecycle of an instance
//!
//! ```text
//! create_instance ─► parent object constructed by the engine
//!                 ─► binding in the handle registry
//!                 ─► instance pointer set on the engine object
//!                 ─► signals bound, children asserted, `on_create`
//!       ...       ─► get/set, notifications, virtual calls
//! free_instance   ─► `on_free` ─► signal tasks stopped ─► host value dropped
//!                 ─► binding removed
//! ```

use bitflags::bitflags;

use crate::classes::EngineClass;
use crate::error::ConversionError;
use crate::builtin::Rid;
use crate::obj::Base;
use crate::variant::Variant;

mod builder;
mod callbacks;
pub mod children;
mod instance;
mod property;
mod registry;
mod signal;

pub use builder::{ClassBuilder, HostFn};
pub use instance::Instance;
pub use property::{PropertyDescriptor, PropertyHint, PropertyMeta, PropertyUsage, SysPropertyList};
pub use registry::{is_registered, registered_classes, unregister_level, ClassRegistrar};
pub use signal::{Signal, SignalArgs, SignalBinder, SignalField, SignalSender};

bitflags! {
    /// Registration flags of an extension class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassFlags: u32 {
        /// Receives notifications and virtual calls inside the editor.
        const TOOL = 1 << 0;
        /// Cannot be instantiated by the engine.
        const ABSTRACT = 1 << 1;
        const VIRTUAL = 1 << 2;
        /// Listed in the editor's class lists.
        const EXPOSED = 1 << 3;
    }
}

impl Default for ClassFlags {
    fn default() -> Self {
        ClassFlags::EXPOSED
    }
}

/// A signal declared by a class.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMeta {
    pub name: &'static str,
    pub args: Vec<PropertyMeta>,
}

/// Reflection data of a class, computed once at registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassMeta {
    pub properties: Vec<PropertyMeta>,
    pub signals: Vec<SignalMeta>,
}

impl ClassMeta {
    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.matches(name))
    }
}

/// A host type registered as an engine class.
///
/// Implementations are generated by `#[derive(ExtensionClass)]`; the
/// behavior hooks live in [`ClassHooks`].
pub trait ExtensionClass: ClassHooks + Send + Sized + 'static {
    /// Engine class this class extends.
    type Base: EngineClass;

    const CLASS_NAME: &'static str;
    const FLAGS: ClassFlags;

    /// Builds the host value for a freshly constructed engine object.
    fn create(base: Base<Self::Base>) -> Self;

    fn meta() -> ClassMeta;

    /// Reads an exported field by engine or field name.
    fn get_field(&self, name: &str) -> Option<Variant>;

    /// Writes an exported field. `Ok(false)` when no field has that name.
    fn set_field(&mut self, name: &str, value: &Variant) -> Result<bool, ConversionError>;

    /// Declared default of an exported field.
    fn field_default(name: &str) -> Option<Variant>;

    /// Installs emitters into signal fields.
    fn bind_signals(&mut self, binder: &mut SignalBinder) {
        let _ = binder;
    }

    /// Finds or creates the child nodes declared by `child` fields.
    fn assert_children(&mut self) -> crate::error::BridgeResult<()> {
        Ok(())
    }
}

/// Behavior of an extension class. Every hook has a neutral default.
#[allow(unused_variables)]
pub trait ClassHooks {
    /// Declares virtual overrides and methods.
    fn register(builder: &mut ClassBuilder<Self>)
    where
        Self: ExtensionClass,
    {
    }

    /// Runs once the instance is bound to its engine object.
    fn on_create(&mut self) {}

    /// Runs when the engine frees the instance. Fields referencing other
    /// engine objects should be cleared here to break reference cycles.
    fn on_free(&mut self) {}

    fn on_notification(&mut self, what: i32) {}

    fn to_string(&self) -> Option<String> {
        None
    }

    /// Custom property read. `None` falls back to exported fields.
    fn get_property(&self, name: &str) -> Option<Variant> {
        None
    }

    /// Custom property write. `false` falls back to exported fields.
    fn set_property(&mut self, name: &str, value: &Variant) -> bool {
        false
    }

    /// Custom property list. `None` lists the exported fields.
    fn property_list(&self) -> Option<Vec<PropertyDescriptor>> {
        None
    }

    /// Adjusts a descriptor before the editor shows it. Returns true if it changed.
    fn validate_property(&self, property: &mut PropertyDescriptor) -> bool {
        false
    }

    fn get_rid(&self) -> Rid {
        Rid(0)
    }
}
