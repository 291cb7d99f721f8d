use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pulsevol::DeviceVolume;
use signal_hook::consts::signal::*;
use tracing::debug;

use crate::json_print;
use crate::Report;

/// Polls the volume on a fixed interval, printing a line each time it changes.
pub fn watch(mut control: DeviceVolume, interval: Duration) -> Result<(), Box<dyn Error>> {
    // register to be told about SIGINT/SIGTERM so we can stop between polls
    let term = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&term))?;
    }

    let mut last = None;
    while !term.load(Ordering::Relaxed) {
        let volume = control.volume()?;
        if last != Some(volume) {
            json_print!(Report::with_volume(&control, volume));
            last = Some(volume);
        }

        thread::sleep(interval);
    }

    debug!("Interrupted, stopping watch");
    Ok(())
}
