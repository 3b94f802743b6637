//! Shared setup for the integration tests.
//!
//! Every test binary exports its own library through `extension_entry!` and
//! loads it into the mock engine once.

#![allow(dead_code)]

use std::sync::Once;

use gdbridge::sys;

static LOAD: Once = Once::new();

/// Loads the library behind `entry` into the mock engine, once per binary.
pub fn load(entry: sys::GDExtensionInitializationFunction) {
    LOAD.call_once(|| {
        assert!(gdbridge_mock::load_library(entry), "the library refused to load");
    });
}

/// Errors the engine console received whose text contains `needle`.
pub fn errors_containing(needle: &str) -> Vec<String> {
    gdbridge_mock::printed_errors()
        .into_iter()
        .filter(|message| message.contains(needle))
        .collect()
}

/// The host instance bound to the node with instance id `id`.
pub fn node_instance<H: gdbridge::class::ExtensionClass>(id: u64) -> gdbridge::class::Instance<H> {
    use gdbridge::prelude::{Node, Obj};

    let address = gdbridge_mock::object_by_id(id).expect("object is alive");
    let node = unsafe { Obj::<Node>::from_sys_borrowed(address as sys::GDExtensionObjectPtr) }.expect("object is a node");
    gdbridge::class::Instance::of(&node).expect("node carries a host instance")
}
