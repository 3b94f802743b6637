//! Library entry point and level-by-level initialization.
//!
//! The engine calls the exported entry point once with its resolver. The
//! bridge installs logging and the panic hook, loads the interface table and
//! hands back the level callbacks. The engine then enters each level from
//! the configured minimum upward, and leaves them in reverse order when it
//! unloads the library.

use std::ffi::c_void;
use std::ptr;

use gdbridge_sys as sys;

use crate::class::{unregister_level, ClassRegistrar};
use crate::classes::engine::reset_editor_hint;
use crate::config::{config, set_config, ExtensionConfig, InitLevel};
use crate::handle::handles;
use crate::{interface, logger, panic};

/// An extension library built on the bridge.
#[allow(unused_variables)]
pub trait ExtensionLibrary: 'static {
    fn config() -> ExtensionConfig {
        ExtensionConfig::default()
    }

    /// Registers the classes that belong to `level`.
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {}

    /// Runs after the classes of `level` were registered.
    fn on_level_init(level: InitLevel) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before the classes of `level` are unregistered.
    fn on_level_deinit(level: InitLevel) {}
}

/// Entry point for library `L`. Exported by `extension_entry!`.
///
/// # Safety
/// Must only be called by the engine, with the arguments of the
/// `GDExtensionInitializationFunction` contract.
pub unsafe extern "C" fn entry_point<L: ExtensionLibrary>(
    get_proc_address: Option<sys::GDExtensionInterfaceGetProcAddress>,
    library: sys::GDExtensionClassLibraryPtr,
    init: *mut sys::GDExtensionInitialization,
) -> sys::GDExtensionBool {
    let config = L::config();
    set_config(config.clone());
    logger::install(config.log_level);
    if config.capture_panic_locations {
        panic::install_hook();
    }

    let Some(init) = (unsafe { init.as_mut() }) else {
        log::error!("the engine passed no initialization record");
        return 0;
    };
    if let Err(err) = unsafe { interface::load(get_proc_address, library) } {
        log::error!("cannot load the engine interface: {}", err);
        return 0;
    }
    handles().activate();

    *init = sys::GDExtensionInitialization {
        minimum_initialization_level: config.minimum_level.to_sys(),
        userdata: ptr::null_mut(),
        initialize: Some(initialize_level::<L>),
        deinitialize: Some(deinitialize_level::<L>),
    };
    log::info!("extension loaded, minimum level {:?}", config.minimum_level);
    1
}

unsafe extern "C" fn initialize_level<L: ExtensionLibrary>(
    _userdata: *mut c_void,
    level: sys::GDExtensionInitializationLevel,
) {
    let Ok(level) = InitLevel::try_from(level) else {
        log::error!("unknown initialization level {}", level);
        return;
    };

    let outcome = panic::catch(|| {
        let mut registrar = ClassRegistrar::new(level);
        L::register_classes(&mut registrar, level);
        log::debug!("{:?}: registered {:?}", level, registrar.registered());
        L::on_level_init(level)
    });
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("initializing {:?} failed: {:#}", level, err),
        Err(report) => log::error!("initializing {:?} panicked: {}", level, report),
    }
}

unsafe extern "C" fn deinitialize_level<L: ExtensionLibrary>(
    _userdata: *mut c_void,
    level: sys::GDExtensionInitializationLevel,
) {
    let Ok(level) = InitLevel::try_from(level) else {
        log::error!("unknown initialization level {}", level);
        return;
    };

    if let Err(report) = panic::catch(|| L::on_level_deinit(level)) {
        log::error!("deinitializing {:?} panicked: {}", level, report);
    }
    unregister_level(level);

    let drained = handles().drain_level(level);
    if !drained.is_empty() {
        log::debug!("{:?}: dropping {} remaining handles", level, drained.len());
    }
    if let Err(report) = panic::catch(move || drop(drained)) {
        log::error!("dropping the handles of {:?} panicked: {}", level, report);
    }

    // The engine never leaves levels below the configured minimum.
    if level <= config().minimum_level {
        handles().deactivate();
        reset_editor_hint();
        interface::unload();
        log::info!("extension unloaded");
    }
}
