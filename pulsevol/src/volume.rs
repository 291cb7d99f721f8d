use std::fmt;
use std::str::FromStr;

use libpulse_binding::volume::{ChannelVolumes, Volume, VolumeDB, VolumeLinear};
use libpulse_sys::pa_cvolume;
use serde::Serialize;

use crate::error::Error;

/// Maximum number of channels a device can report.
pub const CHANNELS_MAX: usize = 32;

/// Largest raw volume the server accepts.
pub const VOLUME_MAX: u32 = Volume::MAX.0;

/// Raw volume representing unity gain (100%).
pub const VOLUME_NORM: u32 = Volume::NORMAL.0;

/// The per-channel volume of a device.
///
/// Always holds between 1 and [`CHANNELS_MAX`] channels. Equality and `Debug` only look
/// at the populated channels.
#[derive(Clone, Copy)]
pub struct ChannelVolume(ChannelVolumes);

impl ChannelVolume {
    /// Builds a volume from per-channel values. Returns `None` unless `1..=32` values are given.
    pub fn new(values: &[u32]) -> Option<ChannelVolume> {
        if values.is_empty() || values.len() > CHANNELS_MAX {
            return None;
        }

        let mut inner = pa_cvolume::default();
        inner.channels = values.len() as u8;
        inner.values[..values.len()].copy_from_slice(values);

        // is this really the only way to create a `ChannelVolumes`?
        Some(ChannelVolume(inner.into()))
    }

    /// Copies a `pa_cvolume` handed over by the server.
    pub fn from_raw(raw: &pa_cvolume) -> Option<ChannelVolume> {
        let n = raw.channels as usize;
        if n == 0 || n > CHANNELS_MAX {
            return None;
        }

        Some(ChannelVolume(ChannelVolumes::from(*raw)))
    }

    /// A `pa_cvolume` suitable for passing to the server.
    pub fn to_raw(&self) -> pa_cvolume {
        *AsRef::<pa_cvolume>::as_ref(&self.0)
    }

    pub fn channels(&self) -> u8 {
        self.0.len()
    }

    /// The populated channel values.
    pub fn values(&self) -> Vec<u32> {
        self.0.get().iter().map(|v| v.0).collect()
    }

    /// Mean of the populated channels, rounded down.
    pub fn average(&self) -> u32 {
        self.0.avg().0
    }

    /// Sets every populated channel to `value`, keeping the channel count.
    pub fn set_all(&mut self, value: u32) {
        let n = self.0.len();
        self.0.set(n, Volume(value));
    }
}

impl PartialEq for ChannelVolume {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl Eq for ChannelVolume {}

impl fmt::Debug for ChannelVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelVolume")
            .field("channels", &self.channels())
            .field("values", &self.values())
            .finish()
    }
}

/// A volume as a user would write it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Level {
    /// Raw `pa_volume_t` value
    Value(u32),
    /// Volume as a percentage; `0.0` is 0%, and `100.0` is 100%
    Percentage(f64),
    Decibels(f64),
    Linear(f64),
}

impl Level {
    /// The raw server value for this level.
    pub fn value(&self) -> u32 {
        match *self {
            Level::Value(value) => value,
            Level::Decibels(db) => Volume::from(VolumeDB(db)).0,
            Level::Linear(lin) => Volume::from(VolumeLinear(lin)).0,
            // libpulse doesn't seem to offer a way to calculate percentages...
            Level::Percentage(pct) => (VOLUME_NORM as f64 * (pct / 100.0)).round() as u32,
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidLevel(s.to_string());
        let s = s.trim();

        // "<FLOAT>L" (linear)
        if let Some(n) = s.strip_suffix('L') {
            return n.trim().parse().map(Level::Linear).map_err(|_| invalid());
        }

        // "<FLOAT>dB" (decibels)
        if let Some(n) = s.strip_suffix("dB") {
            return n.trim().parse().map(Level::Decibels).map_err(|_| invalid());
        }

        // "<INT|FLOAT>%" (percentage)
        if let Some(n) = s.strip_suffix('%') {
            return n.trim().parse().map(Level::Percentage).map_err(|_| invalid());
        }

        // "<INT>" (raw value)
        s.parse().map(Level::Value).map_err(|_| invalid())
    }
}

/// A raw volume alongside its friendlier representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeReport {
    pub value: u32,
    pub percentage: f64,
    pub decibels: f64,
    pub linear: f64,
}

impl From<u32> for VolumeReport {
    fn from(value: u32) -> Self {
        VolumeReport {
            value,
            percentage: (value as f64 / VOLUME_NORM as f64) * 100.0,
            decibels: VolumeDB::from(Volume(value)).0,
            linear: VolumeLinear::from(Volume(value)).0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_count_must_be_in_range() {
        assert!(ChannelVolume::new(&[]).is_none());
        assert!(ChannelVolume::new(&[0; CHANNELS_MAX + 1]).is_none());
        assert_eq!(ChannelVolume::new(&[1; CHANNELS_MAX]).unwrap().channels(), 32);
    }

    #[test]
    fn only_populated_channels_are_visible() {
        let cv = ChannelVolume::new(&[10, 20]).unwrap();
        assert_eq!(cv.values(), &[10, 20]);
    }

    #[test]
    fn average_rounds_down() {
        assert_eq!(ChannelVolume::new(&[0, 65535]).unwrap().average(), 32767);
        assert_eq!(ChannelVolume::new(&[3, 4, 4]).unwrap().average(), 3);
        assert_eq!(ChannelVolume::new(&[VOLUME_MAX, VOLUME_MAX]).unwrap().average(), VOLUME_MAX);
    }

    #[test]
    fn set_all_touches_every_populated_channel() {
        let mut cv = ChannelVolume::new(&[1, 2, 3]).unwrap();
        cv.set_all(4000);
        assert_eq!(cv.values(), &[4000, 4000, 4000]);
        assert_eq!(cv.channels(), 3);
    }

    #[test]
    fn raw_conversion_ignores_trailing_garbage() {
        let mut raw = pa_cvolume::default();
        raw.channels = 2;
        raw.values[0] = 100;
        raw.values[1] = 200;
        raw.values[2] = 999;

        let cv = ChannelVolume::from_raw(&raw).unwrap();
        assert_eq!(cv.values(), &[100, 200]);

        let back = cv.to_raw();
        assert_eq!(back.channels, 2);
        assert_eq!(&back.values[..2], &[100, 200]);
    }

    #[test]
    fn raw_with_no_channels_is_rejected() {
        assert!(ChannelVolume::from_raw(&pa_cvolume::default()).is_none());
    }

    #[test]
    fn equality_ignores_unpopulated_entries() {
        let mut raw = pa_cvolume::default();
        raw.channels = 2;
        raw.values[..3].copy_from_slice(&[5, 5, 9]);

        let a = ChannelVolume::from_raw(&raw).unwrap();
        let b = ChannelVolume::new(&[5, 5]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ChannelVolume::new(&[5, 5, 9]).unwrap());
    }

    #[test]
    fn raw_with_too_many_channels_is_rejected() {
        let mut raw = pa_cvolume::default();
        raw.channels = CHANNELS_MAX as u8 + 1;
        assert!(ChannelVolume::from_raw(&raw).is_none());
    }

    #[test]
    fn parses_levels() {
        assert_eq!("4000".parse::<Level>().unwrap(), Level::Value(4000));
        assert_eq!("50%".parse::<Level>().unwrap(), Level::Percentage(50.0));
        assert_eq!("12.5 %".parse::<Level>().unwrap(), Level::Percentage(12.5));
        assert_eq!("-6dB".parse::<Level>().unwrap(), Level::Decibels(-6.0));
        assert_eq!("0.5L".parse::<Level>().unwrap(), Level::Linear(0.5));
    }

    #[test]
    fn rejects_garbage_levels() {
        for input in ["", "loud", "-1", "%", "xdB"] {
            let err = input.parse::<Level>().unwrap_err();
            assert!(matches!(err, Error::InvalidLevel(_)), "{}", input);
        }
    }

    #[test]
    fn percentage_is_relative_to_normal() {
        assert_eq!(Level::Percentage(100.0).value(), VOLUME_NORM);
        assert_eq!(Level::Percentage(50.0).value(), VOLUME_NORM / 2);
        assert_eq!(Level::Percentage(-10.0).value(), 0);
        assert_eq!(Level::Value(123).value(), 123);
    }

    #[test]
    fn report_percentage() {
        let report = VolumeReport::from(VOLUME_NORM);
        assert_eq!(report.value, VOLUME_NORM);
        assert!((report.percentage - 100.0).abs() < f64::EPSILON);
    }
}
