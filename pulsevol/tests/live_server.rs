//! Tests against a running sound server. Run them with `cargo test -- --ignored`.
//!
//! They change the volume of the default devices and put it back afterwards.

use pulsevol::{Config, DeviceClass, DeviceVolume, Error};

/// Restores the device's volume when dropped.
struct Restore(DeviceVolume, Vec<u32>);

impl Restore {
    fn new(class: DeviceClass, client_name: &str) -> Restore {
        let mut control = DeviceVolume::connect(class, client_name).unwrap();
        let values = control.channel_volume().unwrap().values().to_vec();
        Restore(control, values)
    }
}

impl Drop for Restore {
    fn drop(&mut self) {
        // per-channel balance is not restored, only the level
        let _ = self.0.set_volume(self.1[0]);
    }
}

#[test]
#[ignore = "requires a running PulseAudio server"]
fn facility_type_for_each_class() {
    for class in [DeviceClass::Output, DeviceClass::Input] {
        let control = DeviceVolume::connect(class, "VolumeTest").unwrap();
        assert_eq!(control.facility_type(), class);
        assert!(!control.facility_name().is_empty());
    }
}

#[test]
#[ignore = "requires a running PulseAudio server"]
fn set_then_get_round_trips() {
    let mut speaker = Restore::new(DeviceClass::Output, "VolumeSpeaker");

    for v in [0, 1, 4000, 32768, 65535] {
        speaker.0.set_volume(v).unwrap();
        assert_eq!(speaker.0.volume().unwrap(), v);
    }
}

#[test]
#[ignore = "requires a running PulseAudio server"]
fn set_volume_reaches_every_channel() {
    let mut speaker = Restore::new(DeviceClass::Output, "VolumeSpeaker");

    speaker.0.set_volume(12345).unwrap();
    let cv = speaker.0.channel_volume().unwrap();
    assert!(cv.values().iter().all(|v| *v == 12345), "{:?}", cv);
}

#[test]
#[ignore = "requires a running PulseAudio server"]
fn independent_controls_see_each_other() {
    let mut a = Restore::new(DeviceClass::Input, "VolumeMicA");
    let mut b = DeviceVolume::connect(DeviceClass::Input, "VolumeMicB").unwrap();

    a.0.set_volume(1000).unwrap();
    assert_eq!(b.volume().unwrap(), 1000);
}

#[test]
#[ignore = "requires a running PulseAudio server"]
fn server_acknowledges_valid_volume() {
    let mut mic = Restore::new(DeviceClass::Input, "VolumeMic");
    assert!(mic.0.set_volume_acknowledged(2000).unwrap());
}

#[test]
fn unknown_class_is_rejected() {
    let err = DeviceVolume::open("ANY", "VolumeAny", &Config::default())
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidDeviceClass(_)));
}

#[test]
fn unreachable_server_is_a_connection_error() {
    let config = Config {
        server: Some("unix:/nonexistent/pulsevol/native".into()),
        connect_timeout_ms: 2000,
        ..Config::default()
    };

    let err = DeviceVolume::connect_with(DeviceClass::Output, "VolumeNowhere", &config)
        .err()
        .unwrap();
    assert!(
        matches!(
            err,
            Error::Connection { .. } | Error::ConnectTimeout(_) | Error::Binding(_)
        ),
        "{}",
        err
    );
}
