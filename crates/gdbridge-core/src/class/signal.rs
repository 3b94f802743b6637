//! Signals declared by extension classes.
//!
//! Two field types declare a signal:
//!
//! - [`Signal<Args>`]: emits synchronously from host code with `emit(args)`.
//! - [`SignalSender<T>`]: a send-only channel. A background task receives
//!   every sent value and emits it. The task stops when the instance is
//!   freed; sending afterwards fails with [`BridgeError::SignalClosed`].
//!
//! Both are registered with the engine when the class is registered and
//! bound to their engine object when an instance is created.

use std::marker::PhantomData;
use std::thread::JoinHandle;

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use gdbridge_sys as sys;

use crate::classes::Object;
use crate::error::{BridgeError, BridgeResult};
use crate::obj::Base;
use crate::variant::{ToVariant, Variant, VariantTyped};

use super::PropertyMeta;

/// Argument list of a signal.
pub trait SignalArgs {
    fn to_variants(&self) -> Vec<Variant>;

    fn arg_meta() -> Vec<PropertyMeta>;
}

macro_rules! impl_signal_args {
    ($($arg:ident => $index:tt),*) => {
        impl<$($arg: ToVariant + VariantTyped),*> SignalArgs for ($($arg,)*) {
            fn to_variants(&self) -> Vec<Variant> {
                vec![$(self.$index.to_variant()),*]
            }

            fn arg_meta() -> Vec<PropertyMeta> {
                vec![$(PropertyMeta::of::<$arg>(concat!("arg", stringify!($index)))),*]
            }
        }
    };
}

impl_signal_args!();
impl_signal_args!(A => 0);
impl_signal_args!(A => 0, B => 1);
impl_signal_args!(A => 0, B => 1, C => 2);
impl_signal_args!(A => 0, B => 1, C => 2, D => 3);

/// Collects what an instance needs to emit its signals.
pub struct SignalBinder {
    owner: sys::GDExtensionObjectPtr,
    pub(crate) tasks: Vec<SignalTask>,
}

impl SignalBinder {
    pub(crate) fn new(owner: sys::GDExtensionObjectPtr) -> Self {
        Self {
            owner,
            tasks: Vec::new(),
        }
    }

    fn owner(&self) -> Base<Object> {
        unsafe { Base::from_sys(self.owner) }
    }
}

/// A field type that declares a signal.
pub trait SignalField {
    fn arg_meta() -> Vec<PropertyMeta>;

    /// Connects the field to its engine object.
    fn bind(&mut self, name: &'static str, binder: &mut SignalBinder);
}

// ============================================================================
// Synchronous signals
// ============================================================================

/// A signal emitted directly from host code.
pub struct Signal<Args> {
    name: &'static str,
    owner: Option<Base<Object>>,
    _marker: PhantomData<fn(Args)>,
}

impl<Args: SignalArgs> Signal<Args> {
    /// Emits the signal to every connected receiver.
    pub fn emit(&self, args: Args) -> BridgeResult<()> {
        let owner = self.owner.as_ref().ok_or(BridgeError::SignalClosed { signal: self.name })?;
        owner.emit_signal(self.name, &args.to_variants())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self {
            name: "",
            owner: None,
            _marker: PhantomData,
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("bound", &self.owner.is_some())
            .finish()
    }
}

impl<Args: SignalArgs> SignalField for Signal<Args> {
    fn arg_meta() -> Vec<PropertyMeta> {
        Args::arg_meta()
    }

    fn bind(&mut self, name: &'static str, binder: &mut SignalBinder) {
        self.name = name;
        self.owner = Some(binder.owner());
    }
}

// Only the engine object pointer is held; emission goes through the engine.
unsafe impl<Args> Send for Signal<Args> {}

// ============================================================================
// Channel signals
// ============================================================================

/// Handle to the background task of a channel signal.
pub(crate) struct SignalTask {
    cancel: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SignalTask {
    /// Closes the cancel channel and waits for the task to exit.
    pub(crate) fn stop(mut self) {
        drop(self.cancel);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("signal task panicked");
        }
    }
}

/// A send-only channel whose values are emitted as a one-argument signal.
pub struct SignalSender<T> {
    name: &'static str,
    tx: Option<Sender<T>>,
}

impl<T: ToVariant + Send + 'static> SignalSender<T> {
    /// Queues `value` for emission.
    pub fn send(&self, value: T) -> BridgeResult<()> {
        let tx = self.tx.as_ref().ok_or(BridgeError::SignalClosed { signal: self.name })?;
        tx.send(value)
            .map_err(|_| BridgeError::SignalClosed { signal: self.name })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Default for SignalSender<T> {
    fn default() -> Self {
        Self { name: "", tx: None }
    }
}

impl<T> Clone for SignalSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for SignalSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSender")
            .field("name", &self.name)
            .field("bound", &self.tx.is_some())
            .finish()
    }
}

fn run_signal_task<T: ToVariant>(
    name: &'static str,
    owner: Base<Object>,
    values: Receiver<T>,
    cancel: Receiver<()>,
) {
    loop {
        select! {
            recv(values) -> value => match value {
                Ok(value) => {
                    if let Err(err) = owner.emit_signal(name, &[value.to_variant()]) {
                        log::error!("emitting '{}' failed: {}", name, err);
                    }
                }
                Err(_) => break,
            },
            recv(cancel) -> _ => break,
        }
    }
    log::debug!("signal task '{}' stopped", name);
}

impl<T: ToVariant + VariantTyped + Send + 'static> SignalField for SignalSender<T> {
    fn arg_meta() -> Vec<PropertyMeta> {
        vec![PropertyMeta::of::<T>("value")]
    }

    fn bind(&mut self, name: &'static str, binder: &mut SignalBinder) {
        let (tx, rx) = unbounded::<T>();
        let (cancel_tx, cancel_rx) = unbounded::<()>();
        let owner = binder.owner();
        let spawned = std::thread::Builder::new()
            .name(format!("signal:{}", name))
            .spawn(move || run_signal_task(name, owner, rx, cancel_rx));
        match spawned {
            Ok(handle) => {
                self.name = name;
                self.tx = Some(tx);
                binder.tasks.push(SignalTask {
                    cancel: cancel_tx,
                    handle: Some(handle),
                });
            }
            Err(err) => log::error!("cannot start signal task '{}': {}", name, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantType;

    #[test]
    fn tuple_arguments_become_variants() {
        let variants = (42i64, true).to_variants();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].to::<i64>().unwrap(), 42);
        assert!(variants[1].to::<bool>().unwrap());

        let meta = <(i64, f64)>::arg_meta();
        assert_eq!(meta[0].variant_type, VariantType::Int);
        assert_eq!(meta[1].variant_type, VariantType::Float);
        assert_eq!(meta[1].name, "arg1");
        assert!(<()>::arg_meta().is_empty());
    }

    #[test]
    fn unbound_signals_are_closed() {
        let signal = Signal::<(i64,)>::default();
        assert_eq!(
            signal.emit((1,)).unwrap_err(),
            BridgeError::SignalClosed { signal: "" }
        );
        let sender = SignalSender::<i64>::default();
        assert!(matches!(sender.send(1), Err(BridgeError::SignalClosed { .. })));
    }

    #[test]
    fn stopping_the_task_closes_the_sender() {
        let mut sender = SignalSender::<i64>::default();
        let mut binder = SignalBinder::new(std::ptr::null_mut());
        sender.bind("ticked", &mut binder);
        assert_eq!(binder.tasks.len(), 1);
        for task in binder.tasks.drain(..) {
            task.stop();
        }
        assert_eq!(
            sender.send(3).unwrap_err(),
            BridgeError::SignalClosed { signal: "ticked" }
        );
    }
}
