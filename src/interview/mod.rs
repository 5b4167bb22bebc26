pub mod controller;
pub mod feedback;
pub mod phase;

pub use controller::{ControllerOptions, ControllerView, TurnController};
pub use feedback::{parse_feedback, CompletionScorer, FeedbackScorer, TranscriptScorer};
pub use phase::{project, Phase, VoiceStatus};

use thiserror::Error;

use crate::session::SessionError;
use crate::voice::VoiceError;

/// Misuse of the turn controller. Voice and gateway failures inside a turn
/// never surface here; they become notices or scripted replies.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("No interview session has been started")]
    NoSession,
    #[error("An interview session is already in progress")]
    SessionAlreadyStarted,
    #[error("The interview session has ended")]
    SessionEnded,
    #[error("Not accepting input while {0}")]
    NotAcceptingInput(Phase),
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid interview setup: {0}")]
    InvalidSetup(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Voice(#[from] VoiceError),
}

impl From<SessionError> for TurnError {
    fn from(_: SessionError) -> Self {
        TurnError::SessionEnded
    }
}
