//! Procedural macros for the gdbridge runtime.
//!
//! # Macros
//!
//! - `#[derive(ExtensionClass)]` - Describe a struct as an engine class
//!
//! # Example
//!
//! ```ignore
//! use gdbridge::prelude::*;
//!
//! #[derive(ExtensionClass)]
//! #[bridge(base = Node, name = "Player", tool)]
//! pub struct Player {
//!     #[bridge(base)]
//!     base: Base<Node>,
//!
//!     #[bridge(export, name = "Speed", default = "1.5")]
//!     speed: f64,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_class;

/// Derive the `ExtensionClass` trait for a struct.
///
/// The generated implementation carries the class name and flags, the
/// property and signal descriptions, the by-name field accessors and the
/// default values the editor reverts to.
///
/// # Attributes
///
/// - `#[bridge(base = Type)]` - Engine class to extend (required)
/// - `#[bridge(name = "...")]` - Engine class name (default: the struct name)
/// - `#[bridge(tool)]` - Run inside the editor
/// - `#[bridge(abstract_class)]` - The engine cannot instantiate the class
/// - `#[bridge(hooks)]` - The struct implements `ClassHooks` itself; without
///   it an empty implementation is generated
///
/// # Field Attributes
///
/// - `#[bridge(base)]` - The `Base<T>` handle to the engine object
/// - `#[bridge(export)]` - Expose the field as a property
/// - `#[bridge(child)]` - An `Option<Obj<T>>` child node found or created
///   after construction
/// - `#[bridge(signal)]` - A `Signal<Args>` or `SignalSender<T>` field
/// - `#[bridge(name = "...")]` - Engine-facing name of the field
/// - `#[bridge(default = "expr")]` - Initial and revert value of an exported field
/// - `#[bridge(hint = Range, hint_string = "0,10")]` - Editor hint of an exported field
///
/// Fields without a role are initialized with `Default::default()`.
#[proc_macro_derive(ExtensionClass, attributes(bridge))]
pub fn derive_extension_class(input: TokenStream) -> TokenStream {
    derive_class::derive_class_impl(input)
}
