//! Runtime bridge between host-language extension classes and an engine that
//! loads native libraries through a C function table.
//!
//! The bridge resolves the engine's interface once at load time
//! ([`interface`]), marshals arguments through reusable call frames
//! ([`frame`]), tracks which engine objects carry host state ([`handle`]),
//! converts between the engine's tagged dynamic value and host types
//! ([`variant`]) and registers host types as engine classes ([`class`]).

pub mod builtin;
pub mod class;
pub mod classes;
pub mod config;
pub mod error;
pub mod frame;
pub mod handle;
pub mod init;
pub mod interface;
pub mod logger;
pub mod marshal;
pub mod obj;
pub mod panic;
pub mod variant;

pub use gdbridge_sys as sys;

pub mod prelude {
    pub use crate::builtin::*;
    pub use crate::class::{
        ClassBuilder, ClassFlags, ClassHooks, ClassMeta, ClassRegistrar, ExtensionClass, Instance,
        PropertyDescriptor, PropertyHint, PropertyMeta, PropertyUsage, Signal, SignalSender,
    };
    pub use crate::classes::{Engine, EngineClass, InputEvent, Inherits, Node, Object, RefCounted, Resource};
    pub use crate::config::{ExtensionConfig, InitLevel};
    pub use crate::error::{BridgeError, BridgeResult, CallError, CallErrorKind, ConversionError};
    pub use crate::frame::CallFrame;
    pub use crate::init::ExtensionLibrary;
    pub use crate::obj::{Base, Obj};
    pub use crate::variant::{FromVariant, ToVariant, Value, Variant, VariantType, VariantTyped};
}
