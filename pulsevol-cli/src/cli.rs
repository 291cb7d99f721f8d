use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use pulsevol::{Config, DeviceClass, Level};

#[derive(Debug, Parser)]
#[command(version, about = "Read and set the volume of the default PulseAudio sink or source")]
pub struct Cli {
    /// TOML file with connection settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Sound server to connect to, overrides the config file
    #[arg(long, global = true)]
    pub server: Option<String>,
    /// Client name announced to the server, overrides the config file
    #[arg(long, global = true)]
    pub name: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn config(&self) -> pulsevol::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(server) = &self.server {
            config.server = Some(server.clone());
        }
        if let Some(name) = &self.name {
            config.client_name = name.clone();
        }

        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which device would be controlled
    Info(BaseArgs),
    /// Print the current volume
    Get(GetArgs),
    /// Set every channel to one volume
    Set(SetVolumeArgs),
    /// Print the volume whenever it changes, until interrupted
    Watch(WatchArgs),
}

pub trait ToDeviceClass {
    fn device_class(&self) -> DeviceClass;
}

#[derive(Debug, Args)]
pub struct BaseArgs {
    /// "sink"/"output" for the default playback device, "source"/"input" for the default
    /// capture device
    #[arg(long, short, value_parser = parse_class)]
    pub device: DeviceClass,
}

impl ToDeviceClass for BaseArgs {
    fn device_class(&self) -> DeviceClass {
        self.device
    }
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[clap(flatten)]
    pub base_args: BaseArgs,
    /// Print each channel rather than the average
    #[arg(long)]
    pub channels: bool,
}

impl ToDeviceClass for GetArgs {
    fn device_class(&self) -> DeviceClass {
        self.base_args.device_class()
    }
}

#[derive(Debug, Args)]
pub struct SetVolumeArgs {
    #[clap(flatten)]
    pub base_args: BaseArgs,
    /// Provide the volume, in one of the following formats:
    /// "<INT>" (raw value), "<INT|FLOAT>%" (percentage), "<FLOAT>dB" (decibels) or "<FLOAT>L" (linear)
    #[arg(value_parser = parse_level, allow_hyphen_values = true)]
    pub volume: Level,
    /// Fail if the server reports that it did not apply the volume
    #[arg(long)]
    pub strict: bool,
}

impl ToDeviceClass for SetVolumeArgs {
    fn device_class(&self) -> DeviceClass {
        self.base_args.device_class()
    }
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[clap(flatten)]
    pub base_args: BaseArgs,
    /// How often to poll the server
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,
}

impl ToDeviceClass for WatchArgs {
    fn device_class(&self) -> DeviceClass {
        self.base_args.device_class()
    }
}

fn parse_class(s: &str) -> Result<DeviceClass, String> {
    DeviceClass::from_str(s).map_err(|e| e.to_string())
}

fn parse_level(s: &str) -> Result<Level, String> {
    Level::from_str(s).map_err(|e| e.to_string())
}
