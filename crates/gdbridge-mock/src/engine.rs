//! Process-wide engine state: the object database and the class database.
//!
//! Every interface function takes the lock only for bookkeeping. Extension
//! callbacks are always invoked after the guard is dropped, because they call
//! straight back into the interface.

use std::ffi::c_void;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use gdbridge_sys as sys;
use rustc_hash::FxHashMap;

use crate::Arg;

pub(crate) type Receiver = Arc<dyn Fn(&[Arg]) + Send + Sync>;

/// Extension callbacks copied at registration.
#[derive(Clone, Copy)]
pub(crate) struct Callbacks(pub(crate) sys::GDExtensionClassCreationInfo);

// The class userdata is owned by the extension for the lifetime of the registration.
unsafe impl Send for Callbacks {}

impl Callbacks {
    pub(crate) fn userdata(&self) -> *mut c_void {
        self.0.class_userdata
    }
}

/// Property descriptor as the engine records it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyRecord {
    pub name: String,
    pub variant_type: u32,
    pub class_name: String,
    pub hint: u32,
    pub hint_string: String,
    pub usage: u32,
}

#[derive(Clone)]
pub(crate) struct MethodRecord {
    pub(crate) userdata: usize,
    pub(crate) call: Option<sys::GDExtensionClassMethodCall>,
    pub(crate) ptrcall: Option<sys::GDExtensionClassMethodPtrCall>,
    pub(crate) flags: u32,
    pub(crate) arguments: Vec<PropertyRecord>,
    pub(crate) return_value: Option<PropertyRecord>,
}

pub(crate) struct ExtensionInfo {
    pub(crate) callbacks: Callbacks,
    pub(crate) methods: FxHashMap<String, MethodRecord>,
    pub(crate) signals: FxHashMap<String, Vec<PropertyRecord>>,
}

pub(crate) struct ClassInfo {
    pub(crate) parent: Option<String>,
    pub(crate) tag: usize,
    pub(crate) extension: Option<ExtensionInfo>,
}

pub(crate) struct ObjectData {
    pub(crate) id: u64,
    /// Most-derived class, updated when an extension binds an instance.
    pub(crate) class: String,
    pub(crate) refcount: Option<i64>,
    pub(crate) name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    /// Extension class and instance pointer.
    pub(crate) instance: Option<(String, usize)>,
    pub(crate) receivers: FxHashMap<String, Vec<Receiver>>,
    pub(crate) dying: bool,
}

pub(crate) struct Engine {
    pub(crate) objects: FxHashMap<usize, ObjectData>,
    pub(crate) ids: FxHashMap<u64, usize>,
    next_id: u64,
    pub(crate) classes: FxHashMap<String, ClassInfo>,
    next_tag: usize,
    pub(crate) singletons: FxHashMap<String, usize>,
    pub(crate) editor_hint: bool,
    pub(crate) errors: Vec<String>,
    pub(crate) warnings: Vec<String>,
}

/// Backing memory of an engine object. Only its address matters.
type ObjectCell = [u64; 2];

const BUILTIN_CLASSES: [(&str, Option<&str>); 6] = [
    ("Object", None),
    ("RefCounted", Some("Object")),
    ("Resource", Some("RefCounted")),
    ("InputEvent", Some("Resource")),
    ("Node", Some("Object")),
    ("Engine", Some("Object")),
];

static ENGINE: LazyLock<Mutex<Engine>> = LazyLock::new(|| Mutex::new(Engine::new()));

pub(crate) fn engine() -> MutexGuard<'static, Engine> {
    ENGINE.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    fn new() -> Self {
        let mut engine = Engine {
            objects: FxHashMap::default(),
            ids: FxHashMap::default(),
            next_id: 1000,
            classes: FxHashMap::default(),
            next_tag: 1,
            singletons: FxHashMap::default(),
            editor_hint: false,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        for (name, parent) in BUILTIN_CLASSES {
            engine.add_class(name, parent.map(str::to_string), None);
        }
        let singleton = engine.alloc_object("Engine");
        engine.singletons.insert("Engine".to_string(), singleton);
        engine
    }

    pub(crate) fn add_class(&mut self, name: &str, parent: Option<String>, extension: Option<ExtensionInfo>) {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.classes.insert(
            name.to_string(),
            ClassInfo {
                parent,
                tag,
                extension,
            },
        );
    }

    pub(crate) fn inherits(&self, class: &str, ancestor: &str) -> bool {
        let mut current = Some(class);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.classes.get(name).and_then(|info| info.parent.as_deref());
        }
        false
    }

    /// `class` followed by its ancestors.
    pub(crate) fn lineage(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            current = self.classes.get(&name).and_then(|info| info.parent.clone());
            chain.push(name);
        }
        chain
    }

    pub(crate) fn class_by_tag(&self, tag: usize) -> Option<String> {
        self.classes
            .iter()
            .find(|(_, info)| info.tag == tag)
            .map(|(name, _)| name.clone())
    }

    pub(crate) fn alloc_object(&mut self, class: &str) -> usize {
        let address = Box::into_raw(Box::new(ObjectCell::default())) as usize;
        let id = self.next_id;
        self.next_id += 1;
        let refcount = self.inherits(class, "RefCounted").then_some(0);
        self.objects.insert(
            address,
            ObjectData {
                id,
                class: class.to_string(),
                refcount,
                name: String::new(),
                parent: None,
                children: Vec::new(),
                instance: None,
                receivers: FxHashMap::default(),
                dying: false,
            },
        );
        self.ids.insert(id, address);
        address
    }

    /// Callbacks of the extension class bound to `address`, with the instance pointer.
    pub(crate) fn instance_of(&self, address: usize) -> Option<(Callbacks, usize)> {
        let (class, instance) = self.objects.get(&address)?.instance.clone()?;
        let extension = self.classes.get(&class)?.extension.as_ref()?;
        Some((extension.callbacks, instance))
    }

    /// First method named `method` along the lineage of `class`.
    pub(crate) fn find_method(&self, class: &str, method: &str) -> Option<MethodRecord> {
        self.lineage(class).iter().find_map(|name| {
            self.classes
                .get(name)?
                .extension
                .as_ref()?
                .methods
                .get(method)
                .cloned()
        })
    }

    pub(crate) fn declares_signal(&self, class: &str, signal: &str) -> bool {
        self.lineage(class).iter().any(|name| {
            self.classes
                .get(name)
                .and_then(|info| info.extension.as_ref())
                .is_some_and(|extension| extension.signals.contains_key(signal))
        })
    }
}

/// Frees the memory behind an object address after it left the database.
pub(crate) fn free_object_cell(address: usize) {
    drop(unsafe { Box::from_raw(address as *mut ObjectCell) });
}
