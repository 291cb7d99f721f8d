use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which kind of device a [`DeviceVolume`](crate::DeviceVolume) controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// A playback device (PulseAudio sink), e.g. a speaker.
    Output,
    /// A capture device (PulseAudio source), e.g. a microphone.
    Input,
}

impl DeviceClass {
    /// PulseAudio's name for this class of device.
    pub fn facility(&self) -> &'static str {
        match self {
            DeviceClass::Output => "sink",
            DeviceClass::Input => "source",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceClass::Output => "output",
            DeviceClass::Input => "input",
        })
    }
}

impl FromStr for DeviceClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sink" | "output" => Ok(DeviceClass::Output),
            "source" | "input" => Ok(DeviceClass::Input),
            _ => Err(Error::InvalidDeviceClass(s.to_string())),
        }
    }
}
