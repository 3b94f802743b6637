//! Signal fields: registration, synchronous emission and channel senders.

mod common;

use std::time::Duration;

use crossbeam_channel::unbounded;
use gdbridge::class::ClassBuilder;
use gdbridge::prelude::*;
use gdbridge::sys;
use gdbridge_mock::Arg;

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Beacon {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(signal)]
    pinged: Signal<(i64,)>,
    #[bridge(signal, name = "ticked")]
    ticks: SignalSender<i64>,
}

impl Beacon {
    fn ping(&mut self, value: i64) -> bool {
        self.pinged.emit((value,)).is_ok()
    }
}

impl ClassHooks for Beacon {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder.method("ping", Beacon::ping);
    }
}

struct SignalLibrary;

impl ExtensionLibrary for SignalLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Beacon>();
        }
    }
}

gdbridge::extension_entry!(signal_library_init, SignalLibrary);

fn setup() -> u64 {
    common::load(signal_library_init);
    gdbridge_mock::construct("Beacon").unwrap()
}

#[test]
fn signals_are_declared_with_their_arguments() {
    setup();
    let signals = gdbridge_mock::class_signals("Beacon");
    let names: Vec<&str> = signals.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["pinged", "ticked"]);
    assert_eq!(signals[0].1.len(), 1);
    assert_eq!(signals[0].1[0].variant_type, sys::GDEXTENSION_VARIANT_TYPE_INT);
    assert_eq!(signals[1].1[0].name, "value");

    let meta = <Beacon as ExtensionClass>::meta();
    assert_eq!(meta.signals.len(), 2);
    assert_eq!(meta.signals[1].name, "ticked");
}

#[test]
fn emit_reaches_connected_receivers() {
    let id = setup();
    let (tx, rx) = unbounded();
    assert!(gdbridge_mock::connect(id, "pinged", move |args| {
        let _ = tx.send(args.to_vec());
    }));

    let instance = common::node_instance::<Beacon>(id);
    instance.with(|beacon| beacon.pinged.emit((42,))).unwrap().unwrap();
    assert_eq!(rx.try_recv().unwrap(), vec![Arg::Int(42)]);

    // Emission from inside a method call on the same instance.
    assert_eq!(gdbridge_mock::call_method(id, "ping", &[Arg::Int(7)]), Ok(Arg::Bool(true)));
    assert_eq!(rx.try_recv().unwrap(), vec![Arg::Int(7)]);
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn senders_emit_from_their_task() {
    let id = setup();
    let (tx, rx) = unbounded();
    assert!(gdbridge_mock::connect(id, "ticked", move |args| {
        let _ = tx.send(args.to_vec());
    }));

    let sender = common::node_instance::<Beacon>(id).with(|beacon| beacon.ticks.clone()).unwrap();
    assert_eq!(sender.name(), "ticked");
    for tick in 1..=3 {
        sender.send(tick).unwrap();
    }
    for tick in 1..=3 {
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), vec![Arg::Int(tick)]);
    }
    assert!(gdbridge_mock::destroy(id));
}

#[test]
fn freeing_the_instance_closes_its_senders() {
    let id = setup();
    let sender = common::node_instance::<Beacon>(id).with(|beacon| beacon.ticks.clone()).unwrap();
    assert!(gdbridge_mock::destroy(id));

    assert_eq!(
        sender.send(1).unwrap_err(),
        BridgeError::SignalClosed { signal: "ticked" }
    );
}
