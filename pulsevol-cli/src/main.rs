mod cli;
mod watch;

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use pulsevol::{DeviceClass, DeviceVolume, VolumeReport};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ToDeviceClass};

#[macro_export]
macro_rules! json_print {
    ($x:expr) => {
        println!("{}", serde_json::to_string(&$x)?)
    };
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    class: DeviceClass,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<VolumeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<VolumeReport>>,
}

impl<'a> Report<'a> {
    pub fn new(control: &'a DeviceVolume) -> Report<'a> {
        Report {
            class: control.facility_type(),
            name: control.facility_name(),
            volume: None,
            channels: None,
        }
    }

    pub fn with_volume(control: &'a DeviceVolume, volume: u32) -> Report<'a> {
        Report {
            volume: Some(volume.into()),
            ..Report::new(control)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = args.config()?;
    let connect = |args: &dyn ToDeviceClass| {
        DeviceVolume::connect_with(args.device_class(), &config.client_name, &config)
    };

    match args.command {
        Command::Info(args) => {
            let control = connect(&args)?;
            json_print!(Report::new(&control));
        }
        Command::Get(args) => {
            let mut control = connect(&args)?;
            let cv = control.channel_volume()?;
            let mut report = Report::with_volume(&control, cv.average());
            if args.channels {
                report.channels = Some(cv.values().iter().map(|v| (*v).into()).collect());
            }
            json_print!(report);
        }
        Command::Set(args) => {
            let mut control = connect(&args)?;
            let value = args.volume.value();
            if args.strict {
                if !control.set_volume_acknowledged(value)? {
                    return Err(format!("the server did not apply volume {}", value).into());
                }
            } else {
                control.set_volume(value)?;
            }

            let volume = control.volume()?;
            json_print!(Report::with_volume(&control, volume));
        }
        Command::Watch(args) => {
            let control = connect(&args)?;
            watch::watch(control, Duration::from_millis(args.interval_ms))?;
        }
    };

    Ok(())
}
