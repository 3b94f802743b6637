//! Write engine extension classes in Rust.
//!
//! `gdbridge` loads the engine's C interface table, marshals calls through
//! reusable call frames, tracks which engine objects carry Rust state and
//! registers Rust structs as engine classes.
//!
//! # Example
//!
//! ```ignore
//! use gdbridge::prelude::*;
//!
//! #[derive(ExtensionClass)]
//! #[bridge(base = Node)]
//! struct Turret {
//!     #[bridge(base)]
//!     base: Base<Node>,
//!     #[bridge(export, default = "90.0")]
//!     arc: f64,
//! }
//!
//! struct Library;
//!
//! impl ExtensionLibrary for Library {
//!     fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
//!         if level == InitLevel::Scene {
//!             registrar.register::<Turret>();
//!         }
//!     }
//! }
//!
//! gdbridge::extension_entry!(turret_library_init, Library);
//! ```

pub use gdbridge_core::{
    builtin, class, classes, config, error, frame, handle, init, interface, logger, marshal, obj, panic,
    sys, variant,
};

pub use gdbridge_macros::ExtensionClass;

pub mod prelude {
    pub use gdbridge_core::prelude::*;
    pub use gdbridge_macros::ExtensionClass;
}

/// Exports the engine's load symbol for an [`init::ExtensionLibrary`].
///
/// The symbol name must match the `entry_symbol` of the library's
/// extension configuration file.
#[macro_export]
macro_rules! extension_entry {
    ($symbol:ident, $library:ty) => {
        /// # Safety
        /// Called by the engine with the initialization function contract.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $symbol(
            get_proc_address: ::core::option::Option<$crate::sys::GDExtensionInterfaceGetProcAddress>,
            library: $crate::sys::GDExtensionClassLibraryPtr,
            init: *mut $crate::sys::GDExtensionInitialization,
        ) -> $crate::sys::GDExtensionBool {
            unsafe { $crate::init::entry_point::<$library>(get_proc_address, library, init) }
        }
    };
}
