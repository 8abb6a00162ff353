// ── Settings ──
//
// Defaults, then the TOML config file, then `AMIDIPERSIST_*` environment
// variables. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use amidipersist_core::ControllerConfig;

use crate::ConfigError;

const ENV_PREFIX: &str = "AMIDIPERSIST_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Rules file read at startup.
    pub connections_file: PathBuf,

    /// Settle delay in milliseconds.
    pub settle_delay_ms: u64,

    /// Name the sequencer client registers under.
    pub client_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connections_file: PathBuf::from("amidipersist.connections"),
            settle_delay_ms: 1000,
            client_name: "amidipersist".into(),
        }
    }
}

impl Settings {
    /// Layered figment reading the config file at `path`.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            settle_delay: self.settle_delay(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    ProjectDirs::from("", "", "amidipersist").map_or_else(
        || PathBuf::from("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the canonical config path and the environment.
/// A missing config file is not an error.
pub fn load_settings() -> Result<Settings, ConfigError> {
    Ok(Settings::figment(&settings_path()).extract()?)
}
