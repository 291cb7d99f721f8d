use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use libpulse_sys::{pa_operation, pa_operation_state_t};
use tracing::warn;

use crate::connection::Connection;
use crate::error::{BindingError, Result};
use crate::native;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Running,
    Done,
    Cancelled,
}

impl From<pa_operation_state_t> for OperationState {
    fn from(value: pa_operation_state_t) -> Self {
        match value {
            pa_operation_state_t::Running => OperationState::Running,
            pa_operation_state_t::Done => OperationState::Done,
            pa_operation_state_t::Cancelled => OperationState::Cancelled,
        }
    }
}

/// An asynchronous request in flight.
///
/// The request's completion callback writes into a result cell which this value keeps
/// mutably borrowed, so the cell can neither be read nor go out of scope until the
/// operation has been waited on (or dropped, which cancels it first).
pub(crate) struct Operation<'cell> {
    raw: NonNull<pa_operation>,
    name: &'static str,
    _cell: PhantomData<&'cell mut ()>,
}

impl<'cell> Operation<'cell> {
    /// Issues a request. `request` is handed the userdata pointer for `cell`, and must
    /// register a callback which only ever interprets that pointer as a `T`.
    pub(crate) fn issue<T, F>(name: &'static str, cell: &'cell mut T, request: F) -> Result<Self>
    where
        F: FnOnce(*mut c_void) -> std::result::Result<NonNull<pa_operation>, BindingError>,
    {
        let raw = request(cell as *mut T as *mut c_void)?;
        Ok(Operation {
            raw,
            name,
            _cell: PhantomData,
        })
    }

    pub(crate) fn state(&self) -> OperationState {
        unsafe { native::operation_get_state(self.raw.as_ptr()) }.into()
    }
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        if self.state() == OperationState::Running {
            // cancelling guarantees the callback won't fire into a dead result cell
            warn!(operation = self.name, "Cancelling unfinished operation");
            unsafe { native::operation_cancel(self.raw.as_ptr()) };
        }

        unsafe { native::operation_unref(self.raw.as_ptr()) };
    }
}

impl Connection {
    /// Steps the event loop until `op` is no longer running, then releases it.
    ///
    /// There is no deadline: a request the server never finishes blocks forever. A
    /// cancelled request counts as finished, though its result cell may not have been
    /// written.
    pub(crate) fn wait(&self, op: Operation<'_>) -> Result<OperationState> {
        loop {
            match op.state() {
                OperationState::Running => {
                    self.step()?;
                }
                OperationState::Done => return Ok(OperationState::Done),
                OperationState::Cancelled => {
                    warn!(operation = op.name, "Operation was cancelled");
                    return Ok(OperationState::Cancelled);
                }
            }
        }
    }
}
