//! Synchronous volume control for the default PulseAudio sink or source.
//!
//! PulseAudio's native API is asynchronous: requests complete through callbacks which
//! the client's event loop invokes. This crate drives a private, single-threaded loop
//! by hand so that every call here simply blocks until the server has answered.
//!
//! ```no_run
//! use pulsevol::{DeviceClass, DeviceVolume};
//!
//! let mut speaker = DeviceVolume::connect(DeviceClass::Output, "speaker")?;
//! speaker.set_volume(32768)?;
//! println!("{} is at {}", speaker.facility_name(), speaker.volume()?);
//! # Ok::<(), pulsevol::Error>(())
//! ```

pub mod config;
pub mod connection;
pub mod control;
pub mod device;
pub mod error;
mod introspect;
pub mod native;
mod operation;
pub mod volume;

pub use config::Config;
pub use connection::{Connection, ConnectionState};
pub use control::{DeviceControl, DeviceVolume};
pub use device::DeviceClass;
pub use error::{BindingError, Convention, Error, Result};
pub use operation::OperationState;
pub use volume::{ChannelVolume, Level, VolumeReport};
