//! Terminal-backed speech engines for the console runner.
//!
//! Typed lines stand in for recognised speech and playback is printed,
//! paced by word count so the turn timing resembles real speech.

use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use super::engine::{RecognitionEvent, SpeechParams, SpeechRecognizer, SpeechSynthesizer};
use super::{VoiceError, VoiceResult};

#[derive(Default)]
pub struct ConsoleRecognizer {
    session: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
}

impl ConsoleRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Delivers a typed line as the final transcript of the open capture.
    /// Returns false when nothing is listening.
    pub fn feed(&self, line: &str) -> bool {
        match self.session.lock().as_ref() {
            Some(tx) => tx.send(RecognitionEvent::Final(line.to_string())).is_ok(),
            None => false,
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self) -> VoiceResult<mpsc::UnboundedReceiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.session.lock() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.session.lock().take();
    }
}

pub struct ConsoleSynthesizer {
    words_per_minute: f32,
    interrupt: Notify,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self {
            words_per_minute: 170.0,
            interrupt: Notify::new(),
        }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, params: &SpeechParams) -> VoiceResult<()> {
        println!("🔊 {}", text);

        let words = text.split_whitespace().count() as f32;
        let seconds = words * 60.0 / (self.words_per_minute * params.rate.max(0.1));
        let pause = Duration::from_secs_f32(seconds.max(0.2));

        tokio::select! {
            _ = tokio::time::sleep(pause) => Ok(()),
            _ = self.interrupt.notified() => Err(VoiceError::PlaybackError("interrupted".to_string())),
        }
    }

    fn stop(&self) {
        self.interrupt.notify_waiters();
    }
}
