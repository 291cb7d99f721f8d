//! The three round trips the volume facade needs, run against a live connection.
//!
//! Each request is issued with a result cell local to the calling frame; the server
//! fills it from a completion callback that runs inside `Connection::step`, and the
//! cell is only read once `Connection::wait` has returned.

use std::ffi::{c_void, CStr, CString};

use libpulse_sys::{pa_context, pa_server_info, pa_sink_info, pa_source_info};
use tracing::debug;

use crate::connection::Connection;
use crate::control::DeviceControl;
use crate::device::DeviceClass;
use crate::error::{Error, Result};
use crate::native;
use crate::operation::{Operation, OperationState};
use crate::volume::ChannelVolume;

/// Receives the default device name for one class from a server info reply.
struct DefaultNameCell {
    class: DeviceClass,
    name: Option<CString>,
}

extern "C" fn on_server_info(
    _: *mut pa_context,
    info: *const pa_server_info,
    userdata: *mut c_void,
) {
    let cell = unsafe { &mut *(userdata as *mut DefaultNameCell) };
    let Some(info) = (unsafe { info.as_ref() }) else {
        return;
    };

    let raw = match cell.class {
        DeviceClass::Output => info.default_sink_name,
        DeviceClass::Input => info.default_source_name,
    };
    if !raw.is_null() {
        cell.name = Some(unsafe { CStr::from_ptr(raw) }.to_owned());
    }
}

/// Receives the volume out of a device info reply.
#[derive(Default)]
struct VolumeCell {
    volume: Option<ChannelVolume>,
    failed: bool,
}

macro_rules! impl_info_cb {
    ($facility:ident) => {
        paste::paste! {
            extern "C" fn [<on_ $facility _info>](
                _: *mut pa_context,
                info: *const [<pa_ $facility _info>],
                eol: i32,
                userdata: *mut c_void,
            ) {
                let cell = unsafe { &mut *(userdata as *mut VolumeCell) };
                match eol {
                    // The result we wanted, act on it
                    0 => {
                        if let Some(info) = unsafe { info.as_ref() } {
                            cell.volume = ChannelVolume::from_raw(&info.volume);
                        }
                    }
                    // An error occurred, the caller reads the context's errno
                    eol if eol < 0 => cell.failed = true,
                    // We reached the end of the list
                    _ => {}
                }
            }
        }
    };
}

impl_info_cb!(sink);
impl_info_cb!(source);

// userdata is an `Option<bool>`
extern "C" fn on_success(_: *mut pa_context, success: i32, userdata: *mut c_void) {
    let cell = unsafe { &mut *(userdata as *mut Option<bool>) };
    *cell = Some(success != 0);
}

/// A request cancelled before completing never filled its result cell.
fn completed(
    operation: &'static str,
    state: OperationState,
    reason: impl FnOnce() -> String,
) -> Result<()> {
    match state {
        OperationState::Cancelled => Err(Error::Operation {
            operation,
            reason: reason(),
        }),
        _ => Ok(()),
    }
}

fn to_c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::InvalidName(name.to_string()))
}

impl DeviceControl for Connection {
    fn default_device_name(&mut self, class: DeviceClass) -> Result<String> {
        let c = self.context_ptr();
        let mut cell = DefaultNameCell { class, name: None };
        let op = Operation::issue("get_server_info", &mut cell, |userdata| unsafe {
            native::context_get_server_info(c, Some(on_server_info), userdata)
        })?;
        let state = self.wait(op)?;
        completed("Server info query", state, || self.last_error())?;

        let name = cell.name.ok_or(Error::NoDefaultDevice(class))?;
        let name = name.to_string_lossy().into_owned();
        debug!(%class, %name, "Resolved default device");
        Ok(name)
    }

    fn device_volume(&mut self, class: DeviceClass, name: &str) -> Result<ChannelVolume> {
        let c = self.context_ptr();
        let c_name = to_c_name(name)?;
        let mut cell = VolumeCell::default();
        let op = Operation::issue("get_device_info_by_name", &mut cell, |userdata| unsafe {
            match class {
                DeviceClass::Output => native::context_get_sink_info_by_name(
                    c,
                    c_name.as_ptr(),
                    Some(on_sink_info),
                    userdata,
                ),
                DeviceClass::Input => native::context_get_source_info_by_name(
                    c,
                    c_name.as_ptr(),
                    Some(on_source_info),
                    userdata,
                ),
            }
        })?;
        self.wait(op)?;

        if cell.failed {
            return Err(Error::Operation {
                operation: "Device info query",
                reason: self.last_error(),
            });
        }

        cell.volume.ok_or_else(|| Error::Operation {
            operation: "Device info query",
            reason: format!("no usable volume reported for {} {:?}", class.facility(), name),
        })
    }

    fn set_device_volume(
        &mut self,
        class: DeviceClass,
        name: &str,
        volume: &ChannelVolume,
    ) -> Result<bool> {
        let c = self.context_ptr();
        let c_name = to_c_name(name)?;
        let cvolume = volume.to_raw();
        let mut success: Option<bool> = None;
        let op = Operation::issue("set_device_volume_by_name", &mut success, |userdata| unsafe {
            match class {
                DeviceClass::Output => native::context_set_sink_volume_by_name(
                    c,
                    c_name.as_ptr(),
                    &cvolume,
                    Some(on_success),
                    userdata,
                ),
                DeviceClass::Input => native::context_set_source_volume_by_name(
                    c,
                    c_name.as_ptr(),
                    &cvolume,
                    Some(on_success),
                    userdata,
                ),
            }
        })?;
        self.wait(op)?;

        debug!(%class, %name, ?volume, ?success, "Set device volume");
        Ok(success.unwrap_or(false))
    }
}
