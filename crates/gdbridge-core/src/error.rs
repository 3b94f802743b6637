//! Error types for the extension bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError
//! ├── MissingInterface       - load time, fatal
//! ├── InvalidClass / UnknownParent / DuplicateClass - registration time
//! ├── SignatureMismatch / UnknownVirtual             - registration time, fatal for the class
//! ├── Call(CallError)        - reported by the engine through a variant-call
//! ├── FrameOverflow / Conversion / ContainerConsumed - bridge call-time errors
//! ├── AlreadyBound / SignalClosed / ReturnUnavailable
//! └── StaleHandle / InstanceBorrowed / NotInitialized
//! ```
//!
//! None of these ever cross the ABI. Callbacks convert them into the engine's
//! neutral value (nil, false, zero or null) and log them.

use std::sync::{MutexGuard, PoisonError};

use gdbridge_sys as sys;
use num_enum::TryFromPrimitive;
use thiserror::Error;

pub type BridgeResult<T> = anyhow::Result<T, BridgeError>;

// ============================================================================
// Bridge errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("engine interface function '{name}' is missing")]
    MissingInterface { name: &'static str },

    #[error("engine interface is not loaded")]
    NotInitialized,

    #[error("invalid class '{class}': {reason}")]
    InvalidClass { class: String, reason: String },

    #[error("class '{class}' is already registered")]
    DuplicateClass { class: String },

    #[error("class '{class}' extends unknown engine class '{parent}'")]
    UnknownParent { class: String, parent: String },

    #[error(
        "host method {host_method} cannot override engine method {engine_method}: expected {expected}, found {found}"
    )]
    SignatureMismatch {
        host_method: String,
        engine_method: String,
        expected: String,
        found: String,
    },

    #[error("class '{class}' overrides '{engine_method}', which no base class declares")]
    UnknownVirtual { class: String, engine_method: String },

    #[error("engine call failed: {0}")]
    Call(#[from] CallError),

    #[error("call frame overflow: need {needed} cells, capacity is {capacity}")]
    FrameOverflow { needed: usize, capacity: usize },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("{type_name} token was already transferred")]
    ContainerConsumed { type_name: &'static str },

    #[error("return slot was read before the engine wrote it")]
    ReturnUnavailable,

    #[error("engine object at {address:#x} is already bound to a host instance")]
    AlreadyBound { address: usize },

    #[error("signal '{signal}' is closed")]
    SignalClosed { signal: &'static str },

    #[error("object with instance id {instance_id} no longer exists")]
    StaleHandle { instance_id: u64 },

    #[error("instance of '{class}' is already borrowed by another callback")]
    InstanceBorrowed { class: &'static str },

    #[error("engine has no method {class}::{method}")]
    MissingMethod {
        class: &'static str,
        method: &'static str,
    },

    #[error("engine has no singleton '{0}'")]
    MissingSingleton(&'static str),

    #[error("mutex poisoned")]
    MutexPoisoned,
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for BridgeError {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        BridgeError::MutexPoisoned
    }
}

// ============================================================================
// Conversion errors
// ============================================================================

/// Errors raised by the variant codec.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("integer {value} does not fit in {target_type}")]
    IntegerOverflow {
        value: i64,
        target_type: &'static str,
    },

    #[error("variant tag {0} is out of range")]
    UnknownTag(u32),

    #[error("variant of type {tag} carries a null container token")]
    NullToken { tag: &'static str },

    #[error("host type {type_name} has no variant representation")]
    Unrecognised { type_name: &'static str },
}

// ============================================================================
// Engine call errors
// ============================================================================

/// Kind of failure reported in the variant-call error out-parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum CallErrorKind {
    InvalidMethod = sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD,
    InvalidArgument = sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT,
    TooManyArguments = sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS,
    TooFewArguments = sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS,
    InstanceIsNull = sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL,
    MethodNotConst = sys::GDEXTENSION_CALL_ERROR_METHOD_NOT_CONST,
}

/// A failed variant-call, as reported by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{method}: {kind:?} (argument {argument}, expected {expected})")]
pub struct CallError {
    pub method: String,
    pub kind: CallErrorKind,
    pub argument: i32,
    pub expected: i32,
}

impl CallError {
    /// Converts the engine's out-parameter into a result.
    ///
    /// Unknown error codes are reported as `InvalidMethod`.
    pub fn from_sys(method: &str, raw: &sys::GDExtensionCallError) -> Result<(), CallError> {
        if raw.error == sys::GDEXTENSION_CALL_OK {
            return Ok(());
        }

        Err(CallError {
            method: method.to_string(),
            kind: CallErrorKind::try_from(raw.error).unwrap_or(CallErrorKind::InvalidMethod),
            argument: raw.argument,
            expected: raw.expected,
        })
    }

    /// Writes this error into an engine out-parameter.
    pub fn write_sys(&self, out: &mut sys::GDExtensionCallError) {
        out.error = self.kind as u32;
        out.argument = self.argument;
        out.expected = self.expected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_ok_is_not_an_error() {
        let raw = sys::GDExtensionCallError::default();
        assert!(CallError::from_sys("emit_signal", &raw).is_ok());
    }

    #[test]
    fn call_error_keeps_argument_details() {
        let raw = sys::GDExtensionCallError {
            error: sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT,
            argument: 1,
            expected: 2,
        };
        let err = CallError::from_sys("emit_signal", &raw).unwrap_err();
        assert_eq!(err.kind, CallErrorKind::InvalidArgument);
        assert_eq!(err.argument, 1);
        assert_eq!(err.expected, 2);

        let mut back = sys::GDExtensionCallError::default();
        err.write_sys(&mut back);
        assert_eq!(back, raw);
    }

    #[test]
    fn unknown_call_error_code_maps_to_invalid_method() {
        let raw = sys::GDExtensionCallError {
            error: 99,
            argument: 0,
            expected: 0,
        };
        let err = CallError::from_sys("foo", &raw).unwrap_err();
        assert_eq!(err.kind, CallErrorKind::InvalidMethod);
    }

    #[test]
    fn display_names_the_mismatch() {
        let err = BridgeError::SignatureMismatch {
            host_method: "Pinger::process".into(),
            engine_method: "_process".into(),
            expected: "(float) -> void".into(),
            found: "(int) -> void".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Pinger::process"));
        assert!(text.contains("_process"));
        assert!(text.contains("(float) -> void"));
    }
}
