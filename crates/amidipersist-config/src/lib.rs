//! Rules-file grammar and settings for amidipersist.
//!
//! [`rules`] parses the line-oriented `srcClient:srcPort:dstClient:dstPort`
//! format into [`ConnectionRule`](amidipersist_core::ConnectionRule)s and
//! formats rules back into it. [`settings`] layers defaults, the TOML config
//! file and `AMIDIPERSIST_*` environment variables with figment.

pub mod rules;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use rules::{
    DiagnosticKind, ParsedRules, RuleDiagnostic, escape_field, format_rule_line, load_rules,
    parse_rules, split_fields,
};
pub use settings::{Settings, load_settings, settings_path};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
