use tracing::{info, warn};

use crate::config::Config;
use crate::connection::Connection;
use crate::device::DeviceClass;
use crate::error::{Error, Result};
use crate::volume::{ChannelVolume, VOLUME_MAX};

/// The server round trips a [`DeviceVolume`] is built on. Each call blocks until the
/// server has answered.
pub trait DeviceControl {
    /// Name of the server's current default device of `class`.
    fn default_device_name(&mut self, class: DeviceClass) -> Result<String>;

    /// Current per-channel volume of the device `name`.
    fn device_volume(&mut self, class: DeviceClass, name: &str) -> Result<ChannelVolume>;

    /// Applies `volume` to the device `name`, returning the server's success flag.
    fn set_device_volume(
        &mut self,
        class: DeviceClass,
        name: &str,
        volume: &ChannelVolume,
    ) -> Result<bool>;
}

/// Blocking get/set access to the volume of the default output or input device.
///
/// The default device is resolved once, when this is created. If the server's default
/// changes later, this keeps controlling the device it started with.
pub struct DeviceVolume<C: DeviceControl = Connection> {
    control: C,
    class: DeviceClass,
    name: String,
    volume: ChannelVolume,
}

impl DeviceVolume<Connection> {
    /// Connects with the default configuration.
    pub fn connect(class: DeviceClass, client_name: &str) -> Result<Self> {
        DeviceVolume::connect_with(class, client_name, &Config::default())
    }

    pub fn connect_with(class: DeviceClass, client_name: &str, config: &Config) -> Result<Self> {
        let connection = Connection::open(client_name, config)?;
        DeviceVolume::new(class, connection)
    }

    /// Like [`DeviceVolume::connect_with`], with the class given by name (`sink`,
    /// `output`, `source` or `input`). An unknown name fails before anything connects.
    pub fn open(class: &str, client_name: &str, config: &Config) -> Result<Self> {
        let class = class.parse()?;
        DeviceVolume::connect_with(class, client_name, config)
    }
}

impl<C: DeviceControl> DeviceVolume<C> {
    /// Resolves the default device of `class` and fetches its volume.
    pub fn new(class: DeviceClass, mut control: C) -> Result<Self> {
        let name = control.default_device_name(class)?;
        let volume = control.device_volume(class, &name)?;

        info!(%class, %name, "Started volume control");
        Ok(DeviceVolume {
            control,
            class,
            name,
            volume,
        })
    }

    /// Name of the device being controlled.
    pub fn facility_name(&self) -> &str {
        &self.name
    }

    pub fn facility_type(&self) -> DeviceClass {
        self.class
    }

    /// Fetches the device's volume and returns the mean over its channels (rounded down).
    pub fn volume(&mut self) -> Result<u32> {
        Ok(self.channel_volume()?.average())
    }

    /// Fetches the device's per-channel volume.
    pub fn channel_volume(&mut self) -> Result<ChannelVolume> {
        self.volume = self.control.device_volume(self.class, &self.name)?;
        Ok(self.volume)
    }

    /// Sets every channel of the device to `value`.
    ///
    /// Completing the round trip counts as success: if the server reports that it did
    /// not apply the volume, this is only logged. Use
    /// [`DeviceVolume::set_volume_acknowledged`] to observe that flag.
    pub fn set_volume(&mut self, value: u32) -> Result<()> {
        if !self.set_volume_acknowledged(value)? {
            warn!(class = %self.class, name = %self.name, value, "Server did not apply volume");
        }

        Ok(())
    }

    /// Sets every channel of the device to `value`, returning whether the server
    /// reported success.
    pub fn set_volume_acknowledged(&mut self, value: u32) -> Result<bool> {
        if value > VOLUME_MAX {
            return Err(Error::VolumeOutOfRange(value));
        }

        let mut target = self.volume;
        target.set_all(value);
        self.control
            .set_device_volume(self.class, &self.name, &target)
    }
}
