use std::cell::Cell;
use std::ffi::{c_void, CString};
use std::ptr::{self, NonNull};
use std::time::{Duration, Instant};

use libpulse_binding::error::PAErr;
use libpulse_sys::{pa_context, pa_context_state_t, pa_mainloop, PA_CONTEXT_NOFLAGS};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::native;

/// Where a connection to the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Authorizing,
    SettingName,
    Ready,
    Failed,
    Terminated,
}

impl ConnectionState {
    /// Still on the way to `Ready`, `Failed` or `Terminated`.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ConnectionState::Unconnected
                | ConnectionState::Connecting
                | ConnectionState::Authorizing
                | ConnectionState::SettingName
        )
    }
}

impl From<pa_context_state_t> for ConnectionState {
    fn from(value: pa_context_state_t) -> Self {
        match value {
            pa_context_state_t::Unconnected => ConnectionState::Unconnected,
            pa_context_state_t::Connecting => ConnectionState::Connecting,
            pa_context_state_t::Authorizing => ConnectionState::Authorizing,
            pa_context_state_t::SettingName => ConnectionState::SettingName,
            pa_context_state_t::Ready => ConnectionState::Ready,
            pa_context_state_t::Failed => ConnectionState::Failed,
            pa_context_state_t::Terminated => ConnectionState::Terminated,
        }
    }
}

// userdata is the `Cell<ConnectionState>` living in `Connection::establish`
extern "C" fn on_state_change(c: *mut pa_context, userdata: *mut c_void) {
    let observed = unsafe { &*(userdata as *const Cell<ConnectionState>) };
    let state = ConnectionState::from(unsafe { native::context_get_state(c) });
    debug!(?state, "Connection state changed");
    observed.set(state);
}

/// A ready connection to the sound server, together with the event loop that drives it.
///
/// The loop is only ever advanced by explicit calls on this value, so everything happens
/// on the thread that owns it. Dropping it disconnects, releases the context and frees
/// the loop, in that order.
pub struct Connection {
    mainloop: NonNull<pa_mainloop>,
    context: NonNull<pa_context>,
    step_timeout: Duration,
}

impl Connection {
    /// Connects to the server and blocks until the connection is ready.
    pub fn open(client_name: &str, config: &Config) -> Result<Connection> {
        let name = CString::new(client_name)
            .map_err(|_| Error::InvalidName(client_name.to_string()))?;
        let server = match config.server.as_deref() {
            Some(server) => Some(
                CString::new(server).map_err(|_| Error::InvalidName(server.to_string()))?,
            ),
            None => None,
        };

        let mainloop = unsafe { native::mainloop_new()? };
        let context = unsafe {
            native::mainloop_get_api(mainloop.as_ptr())
                .and_then(|api| native::context_new(api.as_ptr(), name.as_ptr()))
        };
        let context = match context {
            Ok(context) => context,
            Err(e) => {
                unsafe { native::mainloop_free(mainloop.as_ptr()) };
                return Err(e.into());
            }
        };

        // from here on `Drop` is responsible for teardown
        let conn = Connection {
            mainloop,
            context,
            step_timeout: config.step_timeout(),
        };
        conn.establish(server.as_ref(), config.connect_timeout())?;

        info!(
            client_name,
            server = config.server.as_deref().unwrap_or("default"),
            "Connected to sound server"
        );
        Ok(conn)
    }

    fn establish(&self, server: Option<&CString>, timeout: Option<Duration>) -> Result<()> {
        let c = self.context.as_ptr();
        let server = server.map_or(ptr::null(), |s| s.as_ptr());
        unsafe { native::context_connect(c, server, PA_CONTEXT_NOFLAGS, ptr::null())? };

        let observed = Cell::new(ConnectionState::Unconnected);
        unsafe {
            native::context_set_state_callback(
                c,
                Some(on_state_change),
                &observed as *const Cell<ConnectionState> as *mut c_void,
            )
        };
        // pick up whatever happened before the callback was registered
        observed.set(self.state());

        let outcome = self.await_ready(&observed, timeout);

        // `observed` dies with this frame
        unsafe { native::context_set_state_callback(c, None, ptr::null_mut()) };
        outcome
    }

    fn await_ready(&self, observed: &Cell<ConnectionState>, timeout: Option<Duration>) -> Result<()> {
        let started = Instant::now();
        loop {
            match observed.get() {
                ConnectionState::Ready => return Ok(()),
                state if !state.is_pending() => return Err(Error::Connection { state }),
                _ => {}
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(Error::ConnectTimeout(limit));
                }
            }

            self.step()?;
        }
    }

    /// Advances the event loop by one step, blocking for at most the configured step
    /// timeout. Completion callbacks run from inside this call. Returns the number of
    /// dispatched events.
    pub fn step(&self) -> Result<u32> {
        let m = self.mainloop.as_ptr();
        let timeout = i32::try_from(self.step_timeout.as_micros()).unwrap_or(i32::MAX);
        unsafe {
            native::mainloop_prepare(m, timeout)?;
            native::mainloop_poll(m)?;
            Ok(native::mainloop_dispatch(m)? as u32)
        }
    }

    pub fn state(&self) -> ConnectionState {
        unsafe { native::context_get_state(self.context.as_ptr()) }.into()
    }

    /// Describes the error behind the last failed request.
    pub fn last_error(&self) -> String {
        let code = unsafe { native::context_errno(self.context.as_ptr()) };
        PAErr(code)
            .to_string()
            .unwrap_or_else(|| "An unknown error occurred".into())
    }

    pub(crate) fn context_ptr(&self) -> *mut pa_context {
        self.context.as_ptr()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe {
            native::context_disconnect(self.context.as_ptr());
            native::context_unref(self.context.as_ptr());
            native::mainloop_free(self.mainloop.as_ptr());
        }
        info!("Disconnected from sound server");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_states() {
        use ConnectionState::*;

        for state in [Unconnected, Connecting, Authorizing, SettingName] {
            assert!(state.is_pending(), "{:?}", state);
        }
        for state in [Ready, Failed, Terminated] {
            assert!(!state.is_pending(), "{:?}", state);
        }
    }

    #[test]
    fn maps_native_states() {
        assert_eq!(
            ConnectionState::from(pa_context_state_t::Ready),
            ConnectionState::Ready
        );
        assert_eq!(
            ConnectionState::from(pa_context_state_t::SettingName),
            ConnectionState::SettingName
        );
    }

    #[test]
    fn rejects_client_name_with_nul() {
        let err = Connection::open("bad\0name", &Config::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidName(ref n) if n == "bad\0name"));
    }

    #[test]
    fn rejects_server_address_with_nul() {
        let config = Config {
            server: Some("unix:/tmp\0/native".into()),
            ..Config::default()
        };

        let err = Connection::open("pulsevol-test", &config).err().unwrap();
        assert!(matches!(err, Error::InvalidName(ref n) if n == "unix:/tmp\0/native"));
        assert!(err.to_string().starts_with("Name "), "{}", err);
    }

    #[test]
    fn unreachable_server_fails_instead_of_hanging() {
        let config = Config {
            server: Some("unix:/nonexistent/pulsevol/native".into()),
            connect_timeout_ms: 2000,
            ..Config::default()
        };

        let started = Instant::now();
        let err = Connection::open("pulsevol-test", &config).err().unwrap();

        assert!(
            matches!(
                err,
                Error::Connection { .. } | Error::ConnectTimeout(_) | Error::Binding(_)
            ),
            "{}",
            err
        );
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
