//! Host-side storage of extension class instances.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use gdbridge_sys as sys;

use crate::builtin::{Container, StringName};
use crate::classes::{EngineClass, Inherits};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::handles;
use crate::obj::Obj;
use crate::panic;

use super::signal::SignalTask;
use super::ExtensionClass;

/// State bound to one engine object in the handle registry.
///
/// `value` is empty while the instance is being constructed and after it was
/// freed; callbacks arriving in either window see no instance.
///
/// A free requested while the value is borrowed sets `pending_free`; the
/// borrow that ends last runs the teardown.
pub(crate) struct InstanceStorage<H> {
    pub(crate) object: usize,
    pub(crate) instance_id: u64,
    pub(crate) value: Mutex<Option<H>>,
    pub(crate) signal_tasks: Mutex<Vec<SignalTask>>,
    pending_free: AtomicBool,
}

impl<H: ExtensionClass> InstanceStorage<H> {
    pub(crate) fn new(object: sys::GDExtensionObjectPtr, instance_id: u64) -> Self {
        Self {
            object: object as usize,
            instance_id,
            value: Mutex::new(None),
            signal_tasks: Mutex::new(Vec::new()),
            pending_free: AtomicBool::new(false),
        }
    }

    /// Locks the host value without blocking.
    ///
    /// A callback that re-enters an instance already borrowed further up the
    /// same stack gets [`BridgeError::InstanceBorrowed`].
    pub(crate) fn try_lock(&self) -> BridgeResult<InstanceGuard<'_, H>> {
        match self.value.try_lock() {
            Ok(guard) => Ok(InstanceGuard::new(self, guard)),
            Err(TryLockError::Poisoned(poisoned)) => Ok(InstanceGuard::new(self, poisoned.into_inner())),
            Err(TryLockError::WouldBlock) => Err(BridgeError::InstanceBorrowed {
                class: H::CLASS_NAME,
            }),
        }
    }

    /// Tears the instance down now, or once the current borrow ends.
    pub(crate) fn request_free(&self) {
        self.pending_free.store(true, Ordering::SeqCst);
        self.finish_pending_free();
    }

    /// Runs a requested teardown if nothing borrows the value.
    ///
    /// Only one caller observes the flag under the lock, so `on_free` runs
    /// at most once.
    fn finish_pending_free(&self) {
        if !self.pending_free.load(Ordering::SeqCst) {
            return;
        }
        let mut guard = match self.value.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                log::debug!("{} #{} is borrowed, deferring its free", H::CLASS_NAME, self.instance_id);
                return;
            }
        };
        if !self.pending_free.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut value = guard.take();
        drop(guard);

        if let Some(host) = value.as_mut() {
            if let Err(report) = panic::catch(|| host.on_free()) {
                log::error!("{}::on_free panicked: {}", H::CLASS_NAME, report);
            }
        }
        self.stop_signal_tasks();
        drop(value);
    }

    /// Drops the value of an instance whose construction failed.
    ///
    /// `on_free` is skipped since `on_create` never completed.
    pub(crate) fn discard(&self) {
        let value = match self.value.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        };
        self.stop_signal_tasks();
        drop(value);
    }

    /// Stops every signal task of this instance and waits for it to exit.
    pub(crate) fn stop_signal_tasks(&self) {
        let tasks = match self.signal_tasks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for task in tasks {
            task.stop();
        }
    }
}

/// Exclusive borrow of a host value.
///
/// Releasing it finishes a free the engine requested meanwhile.
pub(crate) struct InstanceGuard<'a, H: ExtensionClass> {
    storage: &'a InstanceStorage<H>,
    guard: ManuallyDrop<MutexGuard<'a, Option<H>>>,
}

impl<'a, H: ExtensionClass> InstanceGuard<'a, H> {
    fn new(storage: &'a InstanceStorage<H>, guard: MutexGuard<'a, Option<H>>) -> Self {
        Self {
            storage,
            guard: ManuallyDrop::new(guard),
        }
    }
}

impl<H: ExtensionClass> Deref for InstanceGuard<'_, H> {
    type Target = Option<H>;

    fn deref(&self) -> &Option<H> {
        &self.guard
    }
}

impl<H: ExtensionClass> DerefMut for InstanceGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut Option<H> {
        &mut self.guard
    }
}

impl<H: ExtensionClass> Drop for InstanceGuard<'_, H> {
    fn drop(&mut self) {
        // The lock must be released before a pending free can take it.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        self.storage.finish_pending_free();
    }
}

impl<H> Drop for InstanceStorage<H> {
    fn drop(&mut self) {
        let tasks = match self.signal_tasks.get_mut() {
            Ok(tasks) => std::mem::take(tasks),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        for task in tasks {
            task.stop();
        }
    }
}

/// Host access to the instance bound to an engine object.
pub struct Instance<H> {
    storage: Arc<InstanceStorage<H>>,
}

impl<H: ExtensionClass> Instance<H> {
    /// The instance bound to `object`, if it is an instance of `H`.
    pub fn of<T: EngineClass>(object: &Obj<T>) -> Option<Self> {
        Self::from_sys(object.sys())
    }

    pub(crate) fn from_sys(object: sys::GDExtensionConstObjectPtr) -> Option<Self> {
        handles()
            .lookup_as::<InstanceStorage<H>>(object)
            .map(|storage| Self { storage })
    }

    /// Constructs a new engine object of class `H` through the engine.
    pub fn new_alloc() -> BridgeResult<(Obj<H::Base>, Self)> {
        let table = crate::interface::interface()?;
        let class_name = StringName::from(H::CLASS_NAME);
        let ptr = unsafe { (table.classdb_construct_object)(class_name.sys()) };
        let object = unsafe { Obj::<H::Base>::from_sys_borrowed(ptr) }.ok_or_else(|| {
            BridgeError::InvalidClass {
                class: H::CLASS_NAME.to_string(),
                reason: "the engine did not construct an instance".to_string(),
            }
        })?;
        let instance = Self::of(&object).ok_or_else(|| BridgeError::InvalidClass {
            class: H::CLASS_NAME.to_string(),
            reason: "the constructed object has no host instance".to_string(),
        })?;
        Ok((object, instance))
    }

    pub fn instance_id(&self) -> u64 {
        self.storage.instance_id
    }

    pub fn object_sys(&self) -> sys::GDExtensionObjectPtr {
        self.storage.object as sys::GDExtensionObjectPtr
    }

    /// Engine handle of this instance, typed as any of its base classes.
    pub fn base<B: EngineClass>(&self) -> Option<Obj<B>>
    where
        H::Base: Inherits<B>,
    {
        unsafe { Obj::<H::Base>::from_sys_borrowed(self.object_sys()) }.map(Obj::upcast)
    }

    pub fn with<R>(&self, f: impl FnOnce(&H) -> R) -> BridgeResult<R> {
        let guard = self.storage.try_lock()?;
        let value = guard.as_ref().ok_or(BridgeError::StaleHandle {
            instance_id: self.storage.instance_id,
        })?;
        Ok(f(value))
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> BridgeResult<R> {
        let mut guard = self.storage.try_lock()?;
        let value = guard.as_mut().ok_or(BridgeError::StaleHandle {
            instance_id: self.storage.instance_id,
        })?;
        Ok(f(value))
    }

    /// True when both refer to the same registry entry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

impl<H> Clone for Instance<H> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}
