//! Handle registry.
//!
//! Process-wide map from engine object addresses to their host-side state:
//! the bound host instance of extension classes, who owns the engine object,
//! and how many host references to it are outstanding.
//!
//! The map is split into shards, each behind its own mutex; a lock is held
//! only for a single insert, lookup or removal. Once the registry is
//! deactivated (after the engine deinitialized the core level) every lookup
//! reports "not found", so late callbacks never reach freed host state.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use gdbridge_sys as sys;
use rustc_hash::FxHashMap;

use crate::config::InitLevel;
use crate::error::{BridgeError, BridgeResult};

const SHARD_COUNT: usize = 8;

/// Host-side state attached to an extension class instance.
pub type HostInstance = Arc<dyn Any + Send + Sync>;

/// Who is responsible for destroying the engine object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOwnership {
    /// The host constructed the object and must destroy it.
    HostOwned,
    /// The engine owns the object; the host only observes it.
    EngineOwned,
    /// Reference counted; destroyed when the last reference on either side goes away.
    Shared,
}

#[derive(Clone)]
pub struct Binding {
    pub instance: Option<HostInstance>,
    pub ownership: HandleOwnership,
    /// Outstanding host references for reference-counted objects.
    pub host_refs: u32,
    pub level: InitLevel,
}

pub struct HandleRegistry {
    shards: Vec<Mutex<FxHashMap<usize, Binding>>>,
    active: AtomicBool,
}

static REGISTRY: OnceLock<HandleRegistry> = OnceLock::new();

/// The process-wide registry.
pub fn handles() -> &'static HandleRegistry {
    REGISTRY.get_or_init(HandleRegistry::new)
}

impl HandleRegistry {
    fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| Mutex::new(FxHashMap::default()))
                .collect(),
            active: AtomicBool::new(true),
        }
    }

    fn shard(&self, address: usize) -> MutexGuard<'_, FxHashMap<usize, Binding>> {
        // Objects are at least 16-byte aligned; skip the always-zero bits.
        let index = (address >> 4) % SHARD_COUNT;
        match self.shards[index].lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Stops answering lookups. Used once the engine has torn the library down.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Associates a host instance with an engine object.
    pub fn bind(
        &self,
        object: sys::GDExtensionObjectPtr,
        instance: HostInstance,
        ownership: HandleOwnership,
        level: InitLevel,
    ) -> BridgeResult<()> {
        let address = object as usize;
        let mut shard = self.shard(address);
        let binding = shard.entry(address).or_insert_with(|| Binding {
            instance: None,
            ownership,
            host_refs: 0,
            level,
        });
        if binding.instance.is_some() {
            return Err(BridgeError::AlreadyBound { address });
        }
        binding.instance = Some(instance);
        binding.ownership = ownership;
        binding.level = level;
        Ok(())
    }

    /// Host instance bound to `object`, if any.
    pub fn lookup(&self, object: sys::GDExtensionConstObjectPtr) -> Option<HostInstance> {
        if !self.is_active() {
            return None;
        }
        self.shard(object as usize)
            .get(&(object as usize))
            .and_then(|binding| binding.instance.clone())
    }

    /// Host instance bound to `object`, downcast to its concrete type.
    pub fn lookup_as<I: Any + Send + Sync>(
        &self,
        object: sys::GDExtensionConstObjectPtr,
    ) -> Option<Arc<I>> {
        self.lookup(object)
            .and_then(|instance| instance.downcast::<I>().ok())
    }

    pub fn binding(&self, object: sys::GDExtensionConstObjectPtr) -> Option<Binding> {
        if !self.is_active() {
            return None;
        }
        self.shard(object as usize).get(&(object as usize)).cloned()
    }

    /// Removes the host instance bound to `object` once the engine finalized it.
    pub fn release(&self, object: sys::GDExtensionConstObjectPtr) -> Option<HostInstance> {
        let address = object as usize;
        let mut shard = self.shard(address);
        let binding = shard.get_mut(&address)?;
        let instance = binding.instance.take();
        if binding.host_refs == 0 {
            shard.remove(&address);
        }
        instance
    }

    /// Records one more host reference to a reference-counted object.
    pub fn retain(&self, object: sys::GDExtensionConstObjectPtr, level: InitLevel) -> u32 {
        let address = object as usize;
        let mut shard = self.shard(address);
        let binding = shard.entry(address).or_insert_with(|| Binding {
            instance: None,
            ownership: HandleOwnership::Shared,
            host_refs: 0,
            level,
        });
        binding.host_refs += 1;
        binding.host_refs
    }

    /// Records that one host reference went away. Returns the remaining count.
    pub fn release_ref(&self, object: sys::GDExtensionConstObjectPtr) -> u32 {
        let address = object as usize;
        let mut shard = self.shard(address);
        let Some(binding) = shard.get_mut(&address) else {
            return 0;
        };
        binding.host_refs = binding.host_refs.saturating_sub(1);
        let remaining = binding.host_refs;
        if remaining == 0 && binding.instance.is_none() {
            shard.remove(&address);
        }
        remaining
    }

    pub fn host_refs(&self, object: sys::GDExtensionConstObjectPtr) -> u32 {
        self.shard(object as usize)
            .get(&(object as usize))
            .map_or(0, |binding| binding.host_refs)
    }

    /// Removes and returns every binding created at `level`.
    pub fn drain_level(&self, level: InitLevel) -> Vec<(usize, Binding)> {
        let mut drained = Vec::new();
        for shard in &self.shards {
            let mut shard = match shard.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let addresses: Vec<usize> = shard
                .iter()
                .filter(|(_, binding)| binding.level == level)
                .map(|(address, _)| *address)
                .collect();
            for address in addresses {
                if let Some(binding) = shard.remove(&address) {
                    drained.push((address, binding));
                }
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| match shard.lock() {
                Ok(guard) => guard.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
