use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How to reach the sound server.
///
/// ```toml
/// client_name = "intercom"
/// server = "unix:/run/user/1000/pulse/native"
/// step_timeout_ms = 100
/// connect_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name this client announces to the server.
    pub client_name: String,
    /// Server address; when unset libpulse picks the default server.
    pub server: Option<String>,
    /// Upper bound for a single event loop step.
    pub step_timeout_ms: u64,
    /// How long to wait for the connection to become ready; `0` waits forever.
    pub connect_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client_name: "pulsevol".into(),
            server: None,
            step_timeout_ms: 100,
            connect_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Config> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Config::from_toml(&contents)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        match self.connect_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
