//! CLI-aware settings: the layered settings file with command-line flags on top.

use std::path::PathBuf;
use std::time::Duration;

use amidipersist_config::{Settings, load_settings};
use amidipersist_core::ControllerConfig;

use crate::cli::Cli;
use crate::error::CliError;

/// Everything a command needs once flags and settings are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub connections_file: PathBuf,
    pub client_name: String,
    pub controller: ControllerConfig,
}

impl RunConfig {
    pub fn load(cli: &Cli) -> Result<Self, CliError> {
        Ok(Self::resolve(cli, load_settings()?))
    }

    /// Apply command-line overrides to `settings`.
    pub fn resolve(cli: &Cli, settings: Settings) -> Self {
        let mut controller = settings.controller_config();
        if let Some(ms) = cli.settle_ms {
            controller.settle_delay = Duration::from_millis(ms);
        }

        Self {
            connections_file: cli.file.clone().unwrap_or(settings.connections_file),
            client_name: cli.client_name.clone().unwrap_or(settings.client_name),
            controller,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_apply_without_flags() {
        let cli = Cli::try_parse_from(["amidipersist"]).unwrap();
        let cfg = RunConfig::resolve(&cli, Settings::default());

        assert_eq!(cfg.connections_file, PathBuf::from("amidipersist.connections"));
        assert_eq!(cfg.client_name, "amidipersist");
        assert_eq!(cfg.controller.settle_delay, Duration::from_secs(1));
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "amidipersist",
            "-f",
            "/etc/studio.connections",
            "--settle-ms",
            "250",
            "--client-name",
            "studio",
        ])
        .unwrap();
        let settings = Settings {
            settle_delay_ms: 5000,
            ..Settings::default()
        };
        let cfg = RunConfig::resolve(&cli, settings);

        assert_eq!(cfg.connections_file, PathBuf::from("/etc/studio.connections"));
        assert_eq!(cfg.client_name, "studio");
        assert_eq!(cfg.controller.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn once_and_dump_parse_together() {
        for args in [
            ["amidipersist", "--once", "--dump"],
            ["amidipersist", "--dump", "--once"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(cli.dump && cli.once);
        }
    }
}
