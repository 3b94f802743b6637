//! `Object` methods, available on every handle.

use crate::builtin::{GString, StringName};
use crate::error::BridgeResult;
use crate::obj::Obj;
use crate::variant::Variant;

use super::{ptrcall, varcall, Inherits, Object};

impl<T: Inherits<Object>> Obj<T> {
    pub fn get_class(&self) -> BridgeResult<String> {
        let name: GString = ptrcall("Object", "get_class", self.checked_sys()?, |_| Ok(()))?;
        Ok(name.to_rust_string().unwrap_or_default())
    }

    /// Instance id as reported by the engine.
    pub fn get_instance_id(&self) -> BridgeResult<u64> {
        let id: i64 = ptrcall("Object", "get_instance_id", self.checked_sys()?, |_| Ok(()))?;
        Ok(id as u64)
    }

    /// Emits `signal` with `args`. Errors reported by the engine are returned.
    pub fn emit_signal(&self, signal: &str, args: &[Variant]) -> BridgeResult<()> {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(Variant::from(StringName::from(signal)));
        call_args.extend(args.iter().cloned());
        varcall("Object", "emit_signal", self.checked_sys()?, &call_args)?;
        Ok(())
    }

    pub fn notification(&self, what: i32) -> BridgeResult<()> {
        ptrcall("Object", "notification", self.checked_sys()?, |frame| {
            frame.arg(&what)?;
            frame.arg(&false)?;
            Ok(())
        })
    }
}
