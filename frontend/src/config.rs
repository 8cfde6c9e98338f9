//! Runner configuration file (TOML).
//!
//! ```toml
//! [machine]
//! speed = 0.0
//! uncapped = true
//! dip_switches = [0x0E, 0x08, 0x00]
//!
//! [run]
//! frames = 600
//! report_every = 60
//! input = [{ frame = 100, bits = 0x01 }, { frame = 110, bits = 0x00 }]
//! ```

use std::path::{Path, PathBuf};

use invaders_machines::space_invaders::MachineConfig;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_DIR: &str = "invaders";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub machine: MachineSection,
    pub run: RunSection,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MachineSection {
    pub headless: bool,
    pub speed: f32,
    pub uncapped: bool,
    pub dip_switches: Option<[u8; 3]>,
}

impl Default for MachineSection {
    fn default() -> Self {
        let headless = MachineConfig::headless(None);
        Self {
            headless: headless.headless,
            speed: headless.speed_multiplier,
            uncapped: headless.uncapped,
            dip_switches: None,
        }
    }
}

impl MachineSection {
    pub fn to_machine_config(&self) -> MachineConfig {
        let mut config = MachineConfig::headless(self.dip_switches);
        config.headless = self.headless;
        config.speed_multiplier = self.speed;
        config.uncapped = self.uncapped || self.speed == 0.0;
        config
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub frames: Option<u64>,
    pub report_every: Option<u64>,
    pub input: Vec<InputEvent>,
}

/// Replace the input latch with `bits` before stepping frame `frame`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct InputEvent {
    pub frame: u64,
    pub bits: u8,
}

/// `$XDG_CONFIG_HOME/invaders/config.toml` or the platform equivalent.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load `explicit` if given (it must exist), otherwise the default file if
/// present, otherwise built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(FileConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = parse(&text).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    log::info!("using config {}", path.display());
    Ok(config)
}

pub fn parse(text: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(text)
}
