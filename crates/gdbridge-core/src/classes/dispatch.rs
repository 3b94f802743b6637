use gdbridge_sys as sys;

use crate::error::{BridgeError, BridgeResult, CallError};
use crate::frame::CallFrame;
use crate::interface::interface;
use crate::marshal::PtrValue;
use crate::variant::Variant;

/// Calls an engine method through the pointer-call convention.
///
/// `pack` pushes the arguments onto the frame in declaration order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn ptrcall<R: PtrValue>(
    class: &'static str,
    method: &'static str,
    object: sys::GDExtensionObjectPtr,
    pack: impl FnOnce(&mut CallFrame) -> BridgeResult<()>,
) -> BridgeResult<R> {
    let bind = interface()?.method_bind(class, method)?;
    let mut frame = CallFrame::new();
    pack(&mut frame)?;
    let slot = frame.ret::<R>()?;
    frame.ptrcall(bind, object)?;
    frame.take(slot)
}

/// Calls an intrinsically variadic engine method through the variant-call convention.
pub(crate) fn varcall(
    class: &'static str,
    method: &'static str,
    object: sys::GDExtensionObjectPtr,
    args: &[Variant],
) -> BridgeResult<Variant> {
    let table = interface()?;
    let bind = table.method_bind(class, method)?;
    let arg_ptrs: Vec<sys::GDExtensionConstVariantPtr> = args.iter().map(Variant::sys).collect();
    let mut error = sys::GDExtensionCallError::default();
    let ret = unsafe {
        Variant::from_sys_init(|dest| {
            (table.object_method_bind_call)(
                bind,
                object,
                arg_ptrs.as_ptr(),
                arg_ptrs.len() as sys::GDExtensionInt,
                dest,
                &mut error,
            )
        })
    };
    CallError::from_sys(method, &error).map_err(BridgeError::Call)?;
    Ok(ret)
}
