//! Call frames for the engine's pointer-call convention.
//!
//! A [`CallFrame`] is a fixed-size, stack-resident buffer of 64-bit cells.
//! Packing an argument copies its raw representation into the next free
//! cells; [`CallFrame::array`] then produces the array of pointers to those
//! cells that the engine's dispatcher expects. Entry `argc` of that array
//! points to the return storage, or is null for void calls.
//!
//! Arguments are always borrowed: a container argument is packed as its
//! token, which stays owned by the caller for the duration of the call.
//!
//! The pointer array refers into the frame itself, so it is rebuilt on every
//! call and must not be used after the frame moves.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use gdbridge_sys as sys;

use crate::error::{BridgeError, BridgeResult};
use crate::interface::interface;
use crate::marshal::{cells_for, PtrValue};

/// Number of 64-bit cells in a frame.
pub const FRAME_CELLS: usize = 16;

/// Typed handle to the return storage of a frame.
#[derive(Debug)]
pub struct RetSlot<T> {
    offset: usize,
    _marker: PhantomData<fn() -> T>,
}

struct ReturnState {
    offset: usize,
    cells: usize,
    drop_raw: unsafe fn(*mut c_void),
    written: bool,
    taken: bool,
}

pub struct CallFrame {
    cells: [u64; FRAME_CELLS],
    used: usize,
    args: [usize; FRAME_CELLS],
    argc: usize,
    ret: Option<ReturnState>,
    ptrs: [*const c_void; FRAME_CELLS + 1],
}

impl CallFrame {
    pub fn new() -> Self {
        Self {
            cells: [0; FRAME_CELLS],
            used: 0,
            args: [0; FRAME_CELLS],
            argc: 0,
            ret: None,
            ptrs: [ptr::null(); FRAME_CELLS + 1],
        }
    }

    fn reserve(&mut self, cells: usize) -> BridgeResult<usize> {
        let needed = self.used + cells;
        if needed > FRAME_CELLS {
            return Err(BridgeError::FrameOverflow {
                needed,
                capacity: FRAME_CELLS,
            });
        }
        let offset = self.used;
        self.used = needed;
        Ok(offset)
    }

    /// Packs a borrowed argument. Returns its argument index.
    pub fn arg<T: PtrValue>(&mut self, value: &T) -> BridgeResult<usize> {
        debug_assert!(mem::align_of::<T::Raw>() <= mem::align_of::<u64>());
        let raw = value.to_raw()?;
        let offset = self.reserve(cells_for::<T::Raw>().max(1))?;
        unsafe { ptr::write(self.cells.as_mut_ptr().add(offset).cast::<T::Raw>(), raw) };
        let index = self.argc;
        self.args[index] = offset;
        self.argc += 1;
        Ok(index)
    }

    /// Reserves return storage for a `T`.
    pub fn ret<T: PtrValue>(&mut self) -> BridgeResult<RetSlot<T>> {
        let cells = cells_for::<T::Raw>();
        let offset = self.reserve(cells)?;
        self.ret = Some(ReturnState {
            offset,
            cells,
            drop_raw: T::drop_raw,
            written: false,
            taken: false,
        });
        Ok(RetSlot {
            offset,
            _marker: PhantomData,
        })
    }

    pub fn argc(&self) -> usize {
        self.argc
    }

    fn ret_ptr(&mut self) -> *mut c_void {
        match &self.ret {
            Some(state) if state.cells > 0 => unsafe {
                self.cells.as_mut_ptr().add(state.offset).cast()
            },
            _ => ptr::null_mut(),
        }
    }

    /// Pointer array starting at argument `index`, as passed to the engine.
    pub fn array(&mut self, index: usize) -> *const sys::GDExtensionConstTypePtr {
        let base = self.cells.as_ptr();
        for (slot, offset) in self.ptrs.iter_mut().zip(&self.args[..self.argc]) {
            *slot = unsafe { base.add(*offset) }.cast();
        }
        let ret = self.ret_ptr();
        self.ptrs[self.argc] = ret;
        unsafe { self.ptrs.as_ptr().add(index.min(self.argc)) }
    }

    /// Invokes a bound engine method with the packed arguments.
    pub fn ptrcall(
        &mut self,
        method: sys::GDExtensionMethodBindPtr,
        object: sys::GDExtensionObjectPtr,
    ) -> BridgeResult<()> {
        let table = interface()?;
        let args = self.array(0);
        let ret = self.ret_ptr();
        unsafe { (table.object_method_bind_ptrcall)(method, object, args, ret) };
        if let Some(state) = &mut self.ret {
            state.written = true;
        }
        Ok(())
    }

    /// Marks the return storage as written by someone other than [`CallFrame::ptrcall`].
    ///
    /// # Safety
    /// The return storage must hold a valid value of the declared type.
    pub unsafe fn assume_written(&mut self) {
        if let Some(state) = &mut self.ret {
            state.written = true;
        }
    }

    /// Takes ownership of the value the engine wrote.
    pub fn take<T: PtrValue>(&mut self, slot: RetSlot<T>) -> BridgeResult<T> {
        let state = self.ret.as_mut().ok_or(BridgeError::ReturnUnavailable)?;
        if !state.written || state.taken || state.offset != slot.offset {
            return Err(BridgeError::ReturnUnavailable);
        }
        state.taken = true;
        let raw = unsafe { ptr::read(self.cells.as_ptr().add(slot.offset).cast::<T::Raw>()) };
        Ok(unsafe { T::from_raw(raw) })
    }

    /// Releases the frame. A written return value nobody took is destroyed.
    pub fn free(self) {
        drop(self);
    }
}

impl Default for CallFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallFrame {
    fn drop(&mut self) {
        if let Some(state) = &self.ret
            && state.written
            && !state.taken
            && state.cells > 0
        {
            let drop_raw = state.drop_raw;
            let raw = unsafe { self.cells.as_mut_ptr().add(state.offset) };
            unsafe { drop_raw(raw.cast()) };
        }
    }
}
