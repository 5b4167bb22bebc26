//! Platform seams for speech capture and playback.
//!
//! The adapter in [`super::adapter`] owns single-flight and cancellation;
//! engines only have to start, stop and report.

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use tokio::sync::mpsc;

use super::{VoiceError, VoiceResult};

/// What a recognition session reports while the microphone is open.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Interim hypothesis. Resets the silence window.
    Partial(String),
    /// Final transcript for the utterance.
    Final(String),
    /// The platform closed the session on its own.
    Ended,
    Error(VoiceError),
}

pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Opens a recognition session. Events flow on the returned channel
    /// until the session ends or [`SpeechRecognizer::stop`] is called.
    fn start(&self) -> VoiceResult<mpsc::UnboundedReceiver<RecognitionEvent>>;

    /// Must be idempotent.
    fn stop(&self);
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Plays `text` and returns when playback finishes.
    async fn speak(&self, text: &str, params: &SpeechParams) -> VoiceResult<()>;

    /// Must be idempotent.
    fn stop(&self);
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SpeechParams {
    pub fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self { rate, pitch, volume }.clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            rate: self.rate.clamp(0.1, 10.0),
            pitch: self.pitch.clamp(0.0, 2.0),
            volume: self.volume.clamp(0.0, 1.0),
        }
    }
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self { rate: 1.0, pitch: 1.0, volume: 1.0 }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCapabilities {
    pub capture_supported: bool,
    pub synthesis_supported: bool,
}
