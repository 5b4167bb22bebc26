//! MockMate interview core: the turn controller that decides who speaks,
//! the voice I/O adapter it drives, and the gateway that writes the
//! interviewer's lines.

pub mod completion;
pub mod config;
pub mod database;
pub mod gateway;
pub mod interview;
pub mod session;
pub mod voice;

pub use config::Settings;
pub use gateway::{CompletionGateway, InterviewGateway};
pub use interview::{ControllerOptions, ControllerView, Phase, TurnController, TurnError, VoiceStatus};
pub use session::{Feedback, InterviewSession, InterviewSetup};
pub use voice::{VoiceError, VoiceIo};
