//! Engine classes the bridge itself depends on.
//!
//! Each engine class is an uninhabited marker type used as the parameter of
//! [`Obj`](crate::obj::Obj). Wrapper methods live in one module per class and
//! are implemented on `Obj<T>` for every `T` inheriting from that class, so a
//! handle to a derived class can call its base class methods directly.

use std::fmt;

mod dispatch;
pub mod engine;
pub mod node;
pub mod object;
pub mod refcounted;

pub(crate) use dispatch::{ptrcall, varcall};

/// How an engine class counts references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCountKind {
    /// Destroyed explicitly.
    Never,
    /// Always reference counted.
    Always,
    /// Depends on the dynamic class of the object.
    Dynamic,
}

/// An engine class known to the bridge.
pub trait EngineClass: 'static {
    const CLASS_NAME: &'static str;
    const REFCOUNT: RefCountKind;

    fn parent_name() -> Option<&'static str>;
}

/// Marks `Self` as the engine class `B` or a subclass of it.
///
/// # Safety
/// Implementors must really inherit from `B` in the engine, since handles
/// are reinterpreted without a runtime check.
pub unsafe trait Inherits<B: EngineClass>: EngineClass {}

macro_rules! engine_class {
    (
        $(#[$attr:meta])*
        $name:ident,
        parent = $parent:expr,
        refcount = $refcount:ident,
        inherits = [$($base:ident),*]
    ) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub enum $name {}

        impl EngineClass for $name {
            const CLASS_NAME: &'static str = stringify!($name);
            const REFCOUNT: RefCountKind = RefCountKind::$refcount;

            fn parent_name() -> Option<&'static str> {
                $parent
            }
        }

        unsafe impl Inherits<$name> for $name {}
        $(unsafe impl Inherits<$base> for $name {})*
    };
}

engine_class!(
    /// Root of the engine class hierarchy.
    Object,
    parent = None,
    refcount = Dynamic,
    inherits = []
);

engine_class!(
    RefCounted,
    parent = Some("Object"),
    refcount = Always,
    inherits = [Object]
);

engine_class!(
    Resource,
    parent = Some("RefCounted"),
    refcount = Always,
    inherits = [Object, RefCounted]
);

engine_class!(
    InputEvent,
    parent = Some("Resource"),
    refcount = Always,
    inherits = [Object, RefCounted, Resource]
);

engine_class!(
    /// Scene-tree node.
    Node,
    parent = Some("Object"),
    refcount = Never,
    inherits = [Object]
);

engine_class!(
    /// The engine singleton.
    Engine,
    parent = Some("Object"),
    refcount = Never,
    inherits = [Object]
);

/// Parent of an engine class known to the bridge.
pub fn parent_of(class: &str) -> Option<&'static str> {
    match class {
        "RefCounted" => RefCounted::parent_name(),
        "Resource" => Resource::parent_name(),
        "InputEvent" => InputEvent::parent_name(),
        "Node" => Node::parent_name(),
        "Engine" => Engine::parent_name(),
        _ => None,
    }
}

// ============================================================================
// Virtual method catalog
// ============================================================================

/// Signature of a method as seen by the engine: argument and return type labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub args: Vec<&'static str>,
    pub ret: &'static str,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> {}", self.args.join(", "), self.ret)
    }
}

/// A virtual method an engine class lets extensions override.
#[derive(Debug, Clone, Copy)]
pub struct VirtualSignature {
    pub class: &'static str,
    pub name: &'static str,
    pub args: &'static [&'static str],
    pub ret: &'static str,
}

impl VirtualSignature {
    pub fn signature(&self) -> Signature {
        Signature {
            args: self.args.to_vec(),
            ret: self.ret,
        }
    }
}

const VIRTUALS: &[VirtualSignature] = &[
    VirtualSignature {
        class: "Node",
        name: "_ready",
        args: &[],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_enter_tree",
        args: &[],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_exit_tree",
        args: &[],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_process",
        args: &["float"],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_physics_process",
        args: &["float"],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_input",
        args: &["InputEvent"],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_unhandled_input",
        args: &["InputEvent"],
        ret: "void",
    },
    VirtualSignature {
        class: "Node",
        name: "_get_configuration_warnings",
        args: &[],
        ret: "PackedStringArray",
    },
    VirtualSignature {
        class: "Resource",
        name: "_setup_local_to_scene",
        args: &[],
        ret: "void",
    },
];

/// Finds a virtual method declared by `class` or one of its ancestors.
pub fn find_virtual(class: &str, name: &str) -> Option<&'static VirtualSignature> {
    let mut current = Some(class);
    while let Some(class_name) = current {
        if let Some(found) = VIRTUALS
            .iter()
            .find(|v| v.class == class_name && v.name == name)
        {
            return Some(found);
        }
        current = parent_of(class_name);
    }
    None
}
