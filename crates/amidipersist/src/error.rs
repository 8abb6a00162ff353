//! CLI error types with miette diagnostics.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use amidipersist_config::ConfigError;
use amidipersist_core::CoreError;
use amidipersist_seq::SeqError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const PROVIDER_UNAVAILABLE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device subsystem ─────────────────────────────────────────────

    #[error("ALSA sequencer unavailable: {reason}")]
    #[diagnostic(
        code(amidipersist::provider_unavailable),
        help(
            "Check that the snd-seq kernel module is loaded and /dev/snd/seq is accessible.\n\
             Binaries built without the `alsa` feature cannot open the sequencer."
        )
    )]
    ProviderUnavailable { reason: String },

    #[error("Topology event feed closed unexpectedly")]
    #[diagnostic(code(amidipersist::event_feed_closed))]
    EventFeedClosed,

    // ── Rules / configuration ────────────────────────────────────────

    #[error("No connection rules found in {}", path.display())]
    #[diagnostic(
        code(amidipersist::no_rules),
        help("Add lines of the form srcClient:srcPort:dstClient:dstPort, or run with --dump to list current connections.")
    )]
    NoRules { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(code(amidipersist::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(amidipersist::json))]
    Json(#[from] serde_json::Error),
}

impl From<SeqError> for CliError {
    fn from(err: SeqError) -> Self {
        Self::ProviderUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProviderUnavailable { reason } => Self::ProviderUnavailable { reason },
            CoreError::EventFeedClosed => Self::EventFeedClosed,
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ProviderUnavailable { .. } => exit_code::PROVIDER_UNAVAILABLE,
            Self::EventFeedClosed
            | Self::NoRules { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_exit_seven() {
        let err = CliError::from(SeqError::BackendDisabled);
        assert_eq!(err.exit_code(), exit_code::PROVIDER_UNAVAILABLE);
        let err = CliError::from(CoreError::ProviderUnavailable {
            reason: "no /dev/snd/seq".into(),
        });
        assert_eq!(err.exit_code(), 7);
    }

    #[cfg(feature = "alsa")]
    #[test]
    fn alsa_feature_reaches_the_sequencer_crate() {
        assert!(amidipersist_seq::backend_enabled());
    }

    #[test]
    fn closed_feed_is_a_general_failure() {
        assert_eq!(
            CliError::from(CoreError::EventFeedClosed).exit_code(),
            exit_code::GENERAL
        );
    }
}
