use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use libpulse_binding::error::PAErr;
use thiserror::Error;

use crate::connection::ConnectionState;
use crate::device::DeviceClass;
use crate::volume::VOLUME_MAX;

pub type Result<T> = std::result::Result<T, Error>;

/// How a bound libpulse entry point reports failure through its return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Returns nothing (or a value which cannot signal failure); never checked.
    Infallible,
    /// Returns a C `int`, where any negative value is an error.
    Negative,
    /// Returns a pointer, where null is an error.
    Null,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Convention::Infallible => "infallible",
            Convention::Negative => "negative-int-is-error",
            Convention::Null => "null-is-error",
        })
    }
}

/// A libpulse entry point returned its error sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    /// Name of the C function that was called.
    pub entry_point: &'static str,
    /// `Debug` rendering of the arguments it was called with.
    pub args: String,
    pub convention: Convention,
    /// The negative return value, for `Convention::Negative` entry points.
    pub code: Option<i32>,
}

impl BindingError {
    /// Human readable reason from libpulse's error table, if the code maps to one.
    pub fn reason(&self) -> Option<String> {
        self.code.and_then(|code| PAErr(code).to_string())
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} failed", self.entry_point, self.args)?;
        match (self.code, self.reason()) {
            (Some(code), Some(reason)) => write!(f, " with {} ({})", code, reason),
            (Some(code), None) => write!(f, " with {}", code),
            (None, _) => write!(f, ": returned null"),
        }
    }
}

impl std::error::Error for BindingError {}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The context moved to `Failed` or `Terminated` before becoming ready.
    #[error("Failed to connect to the sound server (state: {state:?})")]
    Connection { state: ConnectionState },

    #[error("Sound server connection was not ready after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Invalid device class {0:?}, expected one of: sink, output, source, input")]
    InvalidDeviceClass(String),

    #[error("The sound server has no default {0} device")]
    NoDefaultDevice(DeviceClass),

    /// The server answered a request with an error marker.
    #[error("{operation} failed: {reason}")]
    Operation {
        operation: &'static str,
        reason: String,
    },

    #[error("Volume {0} is out of range (maximum is {max})", max = VOLUME_MAX)]
    VolumeOutOfRange(u32),

    #[error("Invalid volume {0:?}, expected \"<INT>\", \"<INT|FLOAT>%\", \"<FLOAT>dB\" or \"<FLOAT>L\"")]
    InvalidLevel(String),

    #[error("Name {0:?} contains an interior nul byte")]
    InvalidName(String),

    #[error("Failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_binding_error_names_entry_point_and_args() {
        let err = BindingError {
            entry_point: "pa_mainloop_new",
            args: "()".into(),
            convention: Convention::Null,
            code: None,
        };

        assert_eq!(err.to_string(), "pa_mainloop_new() failed: returned null");
    }

    #[test]
    fn negative_binding_error_carries_code() {
        let err = BindingError {
            entry_point: "pa_mainloop_poll",
            args: "(0x1234,)".into(),
            convention: Convention::Negative,
            code: Some(-1),
        };

        let msg = err.to_string();
        assert!(msg.starts_with("pa_mainloop_poll(0x1234,) failed with -1"), "{}", msg);
    }

    #[test]
    fn binding_error_converts_into_error() {
        let err: Error = BindingError {
            entry_point: "pa_context_new",
            args: "(0x0, 0x0)".into(),
            convention: Convention::Null,
            code: None,
        }
        .into();

        assert!(matches!(err, Error::Binding(ref b) if b.entry_point == "pa_context_new"));
    }

    #[test]
    fn invalid_name_does_not_assume_a_device() {
        let err = Error::InvalidName("bad\0name".into());
        assert_eq!(err.to_string(), "Name \"bad\\0name\" contains an interior nul byte");
    }
}
