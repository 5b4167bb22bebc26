pub mod adapter;
pub mod console;
pub mod engine;
pub mod normalize;

pub use adapter::*;
pub use engine::*;
pub use normalize::normalize_for_speech;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Speech recognition is not supported on this platform")]
    CaptureUnsupported,
    #[error("Already listening")]
    CaptureBusy,
    #[error("Listening was cancelled")]
    CaptureCancelled,
    #[error("No speech detected")]
    NoSpeechDetected,
    #[error("Speech recognition stopped before anything was heard")]
    CaptureEnded,
    #[error("Speech recognition failed: {0}")]
    CaptureFailed(String),
    #[error("Speech synthesis is not supported on this platform")]
    PlaybackUnsupported,
    #[error("Playback was cancelled")]
    PlaybackCancelled,
    #[error("Speech playback failed: {0}")]
    PlaybackError(String),
}

impl VoiceError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, VoiceError::CaptureCancelled | VoiceError::PlaybackCancelled)
    }

    pub fn is_no_speech(&self) -> bool {
        matches!(self, VoiceError::NoSpeechDetected)
    }
}

pub type VoiceResult<T> = std::result::Result<T, VoiceError>;
