//! Checked wrappers around the raw libpulse entry points this crate uses.
//!
//! Every binding is declared once, together with the convention its C return value
//! follows. Wrappers for `negative` and `null` entry points turn the error sentinel
//! into a [`BindingError`]; nothing above this module looks at raw return codes.
//!
//! All wrappers are `unsafe`: callers must pass live handles, and any `userdata`
//! pointer must stay valid for as long as libpulse may invoke the matching callback.

use std::ffi::c_void;
use std::os::raw::c_char;
use std::ptr::NonNull;

use libpulse_sys::{
    pa_context,
    pa_context_flags_t,
    pa_context_notify_cb_t,
    pa_context_state_t,
    pa_context_success_cb_t,
    pa_cvolume,
    pa_mainloop,
    pa_mainloop_api,
    pa_operation,
    pa_operation_state_t,
    pa_server_info_cb_t,
    pa_sink_info_cb_t,
    pa_source_info_cb_t,
    pa_spawn_api,
};

use crate::error::{BindingError, Convention};

fn violation(
    entry_point: &'static str,
    args: String,
    convention: Convention,
    code: Option<i32>,
) -> BindingError {
    let err = BindingError {
        entry_point,
        args,
        convention,
        code,
    };
    tracing::error!(%err, "libpulse call failed");
    err
}

macro_rules! bind {
    () => {};

    // void, or a value which never signals an error
    (
        $(#[$meta:meta])*
        infallible fn $name:ident($($arg:ident: $ty:ty),*) $(-> $ret:ty)?;
        $($rest:tt)*
    ) => {
        paste::paste! {
            $(#[$meta])*
            pub unsafe fn $name($($arg: $ty),*) $(-> $ret)? {
                libpulse_sys::[<pa_ $name>]($($arg as _),*)
            }
        }
        bind!($($rest)*);
    };

    // c int, negative is an error
    (
        $(#[$meta:meta])*
        negative fn $name:ident($($arg:ident: $ty:ty),*);
        $($rest:tt)*
    ) => {
        paste::paste! {
            $(#[$meta])*
            pub unsafe fn $name($($arg: $ty),*) -> Result<i32, BindingError> {
                let ret = libpulse_sys::[<pa_ $name>]($($arg as _),*);
                if ret < 0 {
                    return Err(violation(
                        concat!("pa_", stringify!($name)),
                        format!("{:?}", ($(&$arg,)*)),
                        Convention::Negative,
                        Some(ret),
                    ));
                }

                Ok(ret)
            }
        }
        bind!($($rest)*);
    };

    // pointer, null is an error
    (
        $(#[$meta:meta])*
        null fn $name:ident($($arg:ident: $ty:ty),*) -> $target:ty;
        $($rest:tt)*
    ) => {
        paste::paste! {
            $(#[$meta])*
            pub unsafe fn $name($($arg: $ty),*) -> Result<NonNull<$target>, BindingError> {
                let ret = libpulse_sys::[<pa_ $name>]($($arg as _),*);
                NonNull::new(ret as *mut $target).ok_or_else(|| {
                    violation(
                        concat!("pa_", stringify!($name)),
                        format!("{:?}", ($(&$arg,)*)),
                        Convention::Null,
                        None,
                    )
                })
            }
        }
        bind!($($rest)*);
    };
}

/*
 * Main loop
 */

bind! {
    null fn mainloop_new() -> pa_mainloop;
    infallible fn mainloop_free(m: *mut pa_mainloop);
    /// The vtable a context uses to drive `m`.
    null fn mainloop_get_api(m: *mut pa_mainloop) -> pa_mainloop_api;
    /// Timeout is in microseconds; negative blocks until an event arrives.
    negative fn mainloop_prepare(m: *mut pa_mainloop, timeout: i32);
    negative fn mainloop_poll(m: *mut pa_mainloop);
    /// Returns the number of dispatched events.
    negative fn mainloop_dispatch(m: *mut pa_mainloop);
}

/*
 * Context
 */

bind! {
    null fn context_new(api: *const pa_mainloop_api, name: *const c_char) -> pa_context;
    /// A null `server` connects to the default server.
    negative fn context_connect(
        c: *mut pa_context,
        server: *const c_char,
        flags: pa_context_flags_t,
        api: *const pa_spawn_api
    );
    infallible fn context_disconnect(c: *mut pa_context);
    infallible fn context_unref(c: *mut pa_context);
    infallible fn context_set_state_callback(
        c: *mut pa_context,
        cb: pa_context_notify_cb_t,
        userdata: *mut c_void
    );
    infallible fn context_get_state(c: *mut pa_context) -> pa_context_state_t;
    /// Error code of the last failed operation on `c`.
    infallible fn context_errno(c: *mut pa_context) -> i32;
}

/*
 * Operations
 */

bind! {
    infallible fn operation_get_state(o: *mut pa_operation) -> pa_operation_state_t;
    /// After this, the operation's callback is never invoked.
    infallible fn operation_cancel(o: *mut pa_operation);
    infallible fn operation_unref(o: *mut pa_operation);
}

/*
 * Introspection
 */

bind! {
    null fn context_get_server_info(
        c: *mut pa_context,
        cb: pa_server_info_cb_t,
        userdata: *mut c_void
    ) -> pa_operation;

    null fn context_get_sink_info_by_name(
        c: *mut pa_context,
        name: *const c_char,
        cb: pa_sink_info_cb_t,
        userdata: *mut c_void
    ) -> pa_operation;
    null fn context_set_sink_volume_by_name(
        c: *mut pa_context,
        name: *const c_char,
        volume: *const pa_cvolume,
        cb: pa_context_success_cb_t,
        userdata: *mut c_void
    ) -> pa_operation;

    null fn context_get_source_info_by_name(
        c: *mut pa_context,
        name: *const c_char,
        cb: pa_source_info_cb_t,
        userdata: *mut c_void
    ) -> pa_operation;
    null fn context_set_source_volume_by_name(
        c: *mut pa_context,
        name: *const c_char,
        volume: *const pa_cvolume,
        cb: pa_context_success_cb_t,
        userdata: *mut c_void
    ) -> pa_operation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainloop_lifecycle() {
        unsafe {
            let m = mainloop_new().unwrap();
            assert!(mainloop_get_api(m.as_ptr()).is_ok());
            mainloop_free(m.as_ptr());
        }
    }

    #[test]
    fn step_without_events_times_out_cleanly() {
        unsafe {
            let m = mainloop_new().unwrap();
            assert!(mainloop_prepare(m.as_ptr(), 1_000).is_ok());
            assert!(mainloop_poll(m.as_ptr()).is_ok());
            assert!(mainloop_dispatch(m.as_ptr()).is_ok());
            mainloop_free(m.as_ptr());
        }
    }
}
