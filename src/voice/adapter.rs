use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use log::{debug, info};

use super::engine::{RecognitionEvent, SpeechParams, SpeechRecognizer, SpeechSynthesizer, VoiceCapabilities};
use super::normalize::normalize_for_speech;
use super::{VoiceError, VoiceResult};

/// How long the microphone stays open without any recognition result.
pub const DEFAULT_SILENCE_WINDOW: Duration = Duration::from_secs(10);

/// Holds the cancel handle of the one outstanding operation of a kind.
struct OpSlot {
    current: Mutex<Option<(u64, oneshot::Sender<()>)>>,
    next_id: AtomicU64,
}

impl OpSlot {
    fn new() -> Self {
        Self {
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn claim(&self) -> Option<(u64, oneshot::Receiver<()>)> {
        let mut current = self.current.lock();
        if current.is_some() {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *current = Some((id, tx));
        Some((id, rx))
    }

    /// Claims the slot, cancelling whoever held it. The flag reports whether
    /// something was cut off.
    fn preempt(&self) -> (u64, oneshot::Receiver<()>, bool) {
        let mut current = self.current.lock();
        let preempted = match current.take() {
            Some((_, cancel)) => {
                let _ = cancel.send(());
                true
            }
            None => false,
        };
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *current = Some((id, tx));
        (id, rx, preempted)
    }

    fn owns(&self, id: u64) -> bool {
        matches!(*self.current.lock(), Some((current, _)) if current == id)
    }

    fn release(&self, id: u64) -> bool {
        let mut current = self.current.lock();
        if matches!(*current, Some((held, _)) if held == id) {
            *current = None;
            true
        } else {
            false
        }
    }

    fn cancel(&self) -> bool {
        match self.current.lock().take() {
            Some((_, cancel)) => {
                let _ = cancel.send(());
                true
            }
            None => false,
        }
    }

    fn is_busy(&self) -> bool {
        self.current.lock().is_some()
    }
}

/// Releases a claim on every exit path. Stops the engine only if the claim
/// was still ours, so a newer operation is never cut off by an older one.
struct ClaimGuard<'a> {
    slot: &'a OpSlot,
    id: u64,
    stop: &'a (dyn Fn() + Send + Sync),
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.slot.release(self.id) {
            (self.stop)();
        }
    }
}

/// Normalized voice I/O over whatever speech engines the platform offers.
///
/// At most one capture and one playback are outstanding at a time. The
/// adapter does not coordinate the two with each other; that is the turn
/// controller's job.
pub struct VoiceIo {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    silence_window: Duration,
    capture: OpSlot,
    playback: OpSlot,
}

impl VoiceIo {
    pub fn new(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
            silence_window: DEFAULT_SILENCE_WINDOW,
            capture: OpSlot::new(),
            playback: OpSlot::new(),
        }
    }

    /// Text-only adapter: every capability probe reports false.
    pub fn without_voice() -> Self {
        Self::new(None, None)
    }

    pub fn with_silence_window(mut self, window: Duration) -> Self {
        self.silence_window = window;
        self
    }

    pub fn capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            capture_supported: self.recognizer.as_ref().map_or(false, |r| r.is_available()),
            synthesis_supported: self.synthesizer.as_ref().map_or(false, |s| s.is_available()),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_busy()
    }

    pub fn is_speaking(&self) -> bool {
        self.playback.is_busy()
    }

    /// Listens for one utterance and returns its final transcript.
    ///
    /// Fails immediately with [`VoiceError::CaptureBusy`] if a capture is
    /// already outstanding. The silence window restarts on every event from
    /// the recognizer.
    pub async fn capture_utterance(&self) -> VoiceResult<String> {
        let recognizer = match &self.recognizer {
            Some(r) if r.is_available() => Arc::clone(r),
            _ => return Err(VoiceError::CaptureUnsupported),
        };

        let (id, mut cancel_rx) = self.capture.claim().ok_or(VoiceError::CaptureBusy)?;
        let stop = || recognizer.stop();
        let _claim = ClaimGuard { slot: &self.capture, id, stop: &stop };

        let mut events = recognizer.start()?;
        debug!("🎤 Capture #{} listening", id);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    debug!("Capture #{} cancelled", id);
                    return Err(VoiceError::CaptureCancelled);
                }
                next = tokio::time::timeout(self.silence_window, events.recv()) => match next {
                    Err(_) => {
                        debug!("Capture #{} heard nothing for {:?}", id, self.silence_window);
                        return Err(VoiceError::NoSpeechDetected);
                    }
                    // Only the silence window counts as no speech.
                    Ok(None) | Ok(Some(RecognitionEvent::Ended)) => {
                        debug!("Capture #{} ended without a final transcript", id);
                        return Err(VoiceError::CaptureEnded);
                    }
                    Ok(Some(RecognitionEvent::Partial(text))) => {
                        debug!("Capture #{} partial: {}", id, text);
                    }
                    Ok(Some(RecognitionEvent::Final(text))) => {
                        let text = text.trim();
                        if !text.is_empty() {
                            info!("🎤 Captured utterance ({} chars)", text.len());
                            return Ok(text.to_string());
                        }
                    }
                    Ok(Some(RecognitionEvent::Error(e))) => return Err(e),
                }
            }
        }
    }

    /// Stops an outstanding capture; its caller sees
    /// [`VoiceError::CaptureCancelled`]. No-op when nothing is listening.
    pub fn cancel_capture(&self) {
        if self.capture.cancel() {
            debug!("Cancelling capture");
            if let Some(recognizer) = &self.recognizer {
                recognizer.stop();
            }
        }
    }

    /// Speaks `text` after stripping markup the synthesizer would read out.
    ///
    /// Cuts off any utterance that is still playing. Returns `Ok` without
    /// producing audio when nothing speakable is left after normalization.
    pub async fn speak(&self, text: &str, params: &SpeechParams) -> VoiceResult<()> {
        let synthesizer = match &self.synthesizer {
            Some(s) if s.is_available() => Arc::clone(s),
            _ => return Err(VoiceError::PlaybackUnsupported),
        };

        let spoken = normalize_for_speech(text);
        if spoken.is_empty() {
            debug!("Nothing speakable after normalization, skipping playback");
            return Ok(());
        }

        let (id, mut cancel_rx, preempted) = self.playback.preempt();
        if preempted {
            debug!("Playback #{} cuts off the previous utterance", id);
            synthesizer.stop();
        }
        let stop = || synthesizer.stop();
        let _claim = ClaimGuard { slot: &self.playback, id, stop: &stop };

        let params = params.clamped();
        debug!("🔊 Playback #{} started ({} chars)", id, spoken.len());
        let outcome = tokio::select! {
            biased;
            _ = &mut cancel_rx => Err(VoiceError::PlaybackCancelled),
            outcome = synthesizer.speak(&spoken, &params) => outcome,
        };

        // An engine that errors out because it was stopped still counts as cancelled.
        if !self.playback.owns(id) {
            return Err(VoiceError::PlaybackCancelled);
        }
        outcome
    }

    /// Stops playback; the pending `speak` settles with
    /// [`VoiceError::PlaybackCancelled`]. No-op when nothing is playing.
    pub fn cancel_speaking(&self) {
        if self.playback.cancel() {
            debug!("Cancelling playback");
            if let Some(synthesizer) = &self.synthesizer {
                synthesizer.stop();
            }
        }
    }
}
