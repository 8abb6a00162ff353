use thiserror::Error;

use amidipersist_core::CoreError;

/// Failure opening or driving the ALSA sequencer.
#[derive(Debug, Error)]
pub enum SeqError {
    /// Built without the `alsa` feature.
    #[error("ALSA sequencer support not compiled in (rebuild with `--features alsa`)")]
    BackendDisabled,

    /// Client and port names are passed to ALSA as C strings.
    #[error("Invalid sequencer name {name:?}: contains a NUL byte")]
    InvalidName { name: String },

    #[cfg(feature = "alsa")]
    #[error("ALSA sequencer: {context}: {source}")]
    Alsa {
        context: &'static str,
        #[source]
        source: alsa::Error,
    },

    #[error("Failed to start topology monitor thread: {0}")]
    Thread(#[from] std::io::Error),
}

#[cfg(feature = "alsa")]
impl SeqError {
    pub(crate) fn alsa(context: &'static str) -> impl FnOnce(alsa::Error) -> Self {
        move |source| Self::Alsa { context, source }
    }
}

impl From<SeqError> for CoreError {
    fn from(err: SeqError) -> Self {
        Self::ProviderUnavailable {
            reason: err.to_string(),
        }
    }
}
