use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use validator::Validate;
use log::{debug, error, info, warn};

use super::feedback::FeedbackScorer;
use super::phase::{project, Phase, VoiceStatus};
use super::TurnError;
use crate::database::SessionStore;
use crate::gateway::{InterviewGateway, OPENING_PROMPT};
use crate::session::{ChatTurn, Feedback, InterviewSession, InterviewSetup, Sender};
use crate::voice::{SpeechParams, VoiceCapabilities, VoiceError, VoiceIo};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub voice_enabled: bool,
    pub speech: SpeechParams,
    /// Upper bound on feedback scoring at the end of a session.
    pub feedback_timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            voice_enabled: false,
            speech: SpeechParams::default(),
            feedback_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot published to subscribers after every change.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerView {
    pub phase: Phase,
    pub status: VoiceStatus,
    pub notice: Option<String>,
    pub message_count: usize,
}

struct ControllerState {
    phase: Phase,
    session: Option<InterviewSession>,
    voice_enabled: bool,
    /// Set when the user stopped listening or capture failed; keeps the
    /// auto-listen rule from re-arming until the next turn.
    auto_listen_held: bool,
    notice: Option<String>,
    next_ticket: u64,
}

impl ControllerState {
    fn take_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

struct Inner {
    state: Mutex<ControllerState>,
    voice: Arc<VoiceIo>,
    gateway: Arc<dyn InterviewGateway>,
    scorer: Arc<dyn FeedbackScorer>,
    store: Arc<dyn SessionStore>,
    speech: SpeechParams,
    feedback_timeout: Duration,
    view: watch::Sender<ControllerView>,
}

/// Drives one interview: who speaks, when the microphone opens, and what
/// lands in the transcript.
///
/// Cheap to clone; clones share the same session. Capture and playback run
/// on spawned tasks, so the controller must be used inside a tokio runtime.
/// Every transition goes through [`Phase`] and is published to
/// [`TurnController::subscribe`] before any follow-up work is spawned.
#[derive(Clone)]
pub struct TurnController {
    inner: Arc<Inner>,
}

impl TurnController {
    pub fn new(
        voice: Arc<VoiceIo>,
        gateway: Arc<dyn InterviewGateway>,
        scorer: Arc<dyn FeedbackScorer>,
        store: Arc<dyn SessionStore>,
        options: ControllerOptions,
    ) -> Self {
        let (view, _) = watch::channel(ControllerView {
            phase: Phase::Idle,
            status: project(Phase::Idle, options.voice_enabled),
            notice: None,
            message_count: 0,
        });

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ControllerState {
                    phase: Phase::Idle,
                    session: None,
                    voice_enabled: options.voice_enabled,
                    auto_listen_held: false,
                    notice: None,
                    next_ticket: 0,
                }),
                voice,
                gateway,
                scorer,
                store,
                speech: options.speech.clamped(),
                feedback_timeout: options.feedback_timeout,
                view,
            }),
        }
    }

    /// Opens a session and fetches the interviewer's first line.
    pub async fn start(&self, setup: InterviewSetup) -> Result<(), TurnError> {
        setup.validate()?;

        {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Idle => {}
                Phase::Ended => return Err(TurnError::SessionEnded),
                _ => return Err(TurnError::SessionAlreadyStarted),
            }

            let session = InterviewSession::new(setup.clone());
            info!(
                "🎬 Interview {} started: {} / {} / {}",
                session.id, setup.industry, setup.difficulty, setup.personality
            );
            state.session = Some(session);
            state.notice = None;
            state.auto_listen_held = false;
            self.set_phase(&mut state, Phase::Starting);
            self.set_phase(&mut state, Phase::AiResponding);
        }

        let reply = self
            .inner
            .gateway
            .request_next_utterance(&[ChatTurn::user(OPENING_PROMPT)], &setup)
            .await;
        self.deliver_reply(reply);
        Ok(())
    }

    /// Submits a typed answer. Typing while the microphone is open cancels
    /// the capture.
    pub async fn submit_user_text(&self, content: &str) -> Result<(), TurnError> {
        self.submit(content, None).await
    }

    /// Opens the microphone for one answer, whether or not voice mode is on.
    pub fn start_capture(&self) -> Result<(), TurnError> {
        let mut state = self.inner.state.lock();
        match state.phase {
            Phase::WaitingForUser => {}
            Phase::Listening { .. } => return Err(VoiceError::CaptureBusy.into()),
            Phase::Idle => return Err(TurnError::NoSession),
            Phase::Ended => return Err(TurnError::SessionEnded),
            phase => return Err(TurnError::NotAcceptingInput(phase)),
        }
        if !self.inner.voice.capabilities().capture_supported {
            return Err(VoiceError::CaptureUnsupported.into());
        }

        state.auto_listen_held = false;
        self.begin_listening(&mut state);
        Ok(())
    }

    /// Closes the microphone without submitting anything. Auto-listen stays
    /// off until the next turn. No-op when not listening.
    pub fn stop_capture(&self) {
        let mut state = self.inner.state.lock();
        if !state.phase.is_listening() {
            return;
        }

        debug!("🎤 Capture stopped by user");
        self.inner.voice.cancel_capture();
        state.auto_listen_held = true;
        self.set_phase(&mut state, Phase::WaitingForUser);
    }

    pub fn toggle_voice(&self, enabled: bool) {
        let mut state = self.inner.state.lock();

        if enabled {
            state.auto_listen_held = false;
        } else {
            match state.phase {
                Phase::Listening { .. } => {
                    self.inner.voice.cancel_capture();
                    self.set_phase(&mut state, Phase::WaitingForUser);
                }
                Phase::Speaking { .. } => {
                    self.inner.voice.cancel_speaking();
                    self.set_phase(&mut state, Phase::WaitingForUser);
                }
                _ => {}
            }
        }

        if state.voice_enabled != enabled {
            info!("🔈 Voice mode {}", if enabled { "on" } else { "off" });
        }
        state.voice_enabled = enabled;
        self.publish(&state);
        self.rearm(&mut state);
    }

    /// Ends the session, scores it, and hands it to the store. Outstanding
    /// voice operations are cancelled and a late AI reply is dropped.
    pub async fn end(&self) -> Result<Feedback, TurnError> {
        let snapshot = {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Idle => return Err(TurnError::NoSession),
                Phase::Ended => return Err(TurnError::SessionEnded),
                _ => {}
            }
            let snapshot = state.session.clone().ok_or(TurnError::NoSession)?;

            self.inner.voice.cancel_capture();
            self.inner.voice.cancel_speaking();
            self.set_phase(&mut state, Phase::Ended);
            snapshot
        };

        info!("🏁 Ending interview {} after {} messages", snapshot.id, snapshot.messages().len());

        let feedback = match tokio::time::timeout(self.inner.feedback_timeout, self.inner.scorer.score(&snapshot)).await {
            Ok(Ok(feedback)) => feedback.clamped(),
            Ok(Err(e)) => {
                warn!("Feedback scoring failed, using neutral report: {:#}", e);
                Feedback::neutral()
            }
            Err(_) => {
                warn!("Feedback scoring took longer than {:?}, using neutral report", self.inner.feedback_timeout);
                Feedback::neutral()
            }
        };

        let finished = {
            let mut state = self.inner.state.lock();
            let session = state.session.as_mut().ok_or(TurnError::NoSession)?;
            session.finish(feedback.clone())?;
            let finished = session.clone();
            self.publish(&state);
            finished
        };

        info!(
            "📊 Interview {} scored: confidence {} / rating {}",
            finished.id, feedback.confidence_score, feedback.overall_rating
        );

        if let Err(e) = self.inner.store.save(&finished).await {
            error!("Failed to save interview {}: {}", finished.id, e);
        }

        Ok(feedback)
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    pub fn status(&self) -> VoiceStatus {
        let state = self.inner.state.lock();
        project(state.phase, state.voice_enabled)
    }

    /// Read-only copy of the current session.
    pub fn session(&self) -> Option<InterviewSession> {
        self.inner.state.lock().session.clone()
    }

    pub fn notice(&self) -> Option<String> {
        self.inner.state.lock().notice.clone()
    }

    pub fn dismiss_notice(&self) {
        let mut state = self.inner.state.lock();
        if state.notice.take().is_some() {
            self.publish(&state);
        }
    }

    pub fn voice_enabled(&self) -> bool {
        self.inner.state.lock().voice_enabled
    }

    pub fn capabilities(&self) -> VoiceCapabilities {
        self.inner.voice.capabilities()
    }

    /// False means the interviewer is running on scripted lines.
    pub fn is_gateway_configured(&self) -> bool {
        self.inner.gateway.is_configured()
    }

    pub fn view(&self) -> ControllerView {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.inner.view.subscribe()
    }

    async fn submit(&self, content: &str, from_capture: Option<u64>) -> Result<(), TurnError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let (history, setup) = {
            let mut state = self.inner.state.lock();
            match (state.phase, from_capture) {
                (Phase::WaitingForUser, None) => {}
                (Phase::Listening { ticket }, Some(captured)) if ticket == captured => {}
                (Phase::Listening { .. }, None) => {
                    debug!("Typed answer replaces the open capture");
                    self.inner.voice.cancel_capture();
                }
                (Phase::Idle, _) => return Err(TurnError::NoSession),
                (Phase::Ended, _) => return Err(TurnError::SessionEnded),
                (phase, _) => return Err(TurnError::NotAcceptingInput(phase)),
            }

            let session = state.session.as_mut().ok_or(TurnError::NoSession)?;
            session.append(Sender::User, content)?;
            let history = session.history();
            let setup = session.setup.clone();

            state.auto_listen_held = false;
            self.set_phase(&mut state, Phase::AiResponding);
            (history, setup)
        };

        info!(
            "💬 Answer submitted by {} ({} chars)",
            if from_capture.is_some() { "voice" } else { "text" },
            content.len()
        );

        let reply = self.inner.gateway.request_next_utterance(&history, &setup).await;
        self.deliver_reply(reply);
        Ok(())
    }

    /// Appends the interviewer's reply and moves on to speaking or waiting.
    /// Dropped if the session moved on while the reply was in flight.
    fn deliver_reply(&self, reply: String) {
        let mut state = self.inner.state.lock();
        if state.phase != Phase::AiResponding {
            debug!("Discarding interviewer reply, phase is now {}", state.phase);
            return;
        }

        let appended = match state.session.as_mut() {
            Some(session) => session.append(Sender::Ai, reply.as_str()).is_ok(),
            None => false,
        };
        if !appended {
            warn!("Interviewer reply arrived without an open session");
            return;
        }
        info!("🤖 Interviewer replied ({} chars)", reply.len());

        state.auto_listen_held = false;
        if state.voice_enabled && self.inner.voice.capabilities().synthesis_supported {
            let ticket = state.take_ticket();
            self.set_phase(&mut state, Phase::Speaking { ticket });
            self.spawn_playback(ticket, reply);
        } else {
            self.set_phase(&mut state, Phase::WaitingForUser);
            self.rearm(&mut state);
        }
    }

    /// Level-triggered auto-listen. Safe to call after any transition; only
    /// acts from `WaitingForUser`.
    fn rearm(&self, state: &mut ControllerState) {
        if state.phase == Phase::WaitingForUser
            && state.voice_enabled
            && !state.auto_listen_held
            && self.inner.voice.capabilities().capture_supported
        {
            self.begin_listening(state);
        }
    }

    fn begin_listening(&self, state: &mut ControllerState) {
        let ticket = state.take_ticket();
        self.set_phase(state, Phase::Listening { ticket });

        let this = self.clone();
        tokio::spawn(async move { this.run_capture(ticket).await });
    }

    fn spawn_playback(&self, ticket: u64, text: String) {
        let this = self.clone();
        tokio::spawn(async move { this.run_playback(ticket, text).await });
    }

    async fn run_capture(self, ticket: u64) {
        let mut view = self.inner.view.subscribe();

        // Leaving this phase by any route drops the capture future, which
        // releases the microphone.
        let outcome = tokio::select! {
            biased;
            _ = left_phase(&mut view, Phase::Listening { ticket }) => return,
            outcome = self.inner.voice.capture_utterance() => outcome,
        };

        match outcome {
            Ok(text) => {
                if let Err(e) = self.submit(&text, Some(ticket)).await {
                    match e {
                        TurnError::EmptyMessage => self.capture_failed(ticket, VoiceError::NoSpeechDetected),
                        e => debug!("Dropping captured answer: {}", e),
                    }
                }
            }
            Err(e) => self.capture_failed(ticket, e),
        }
    }

    fn capture_failed(&self, ticket: u64, error: VoiceError) {
        let mut state = self.inner.state.lock();
        if state.phase != (Phase::Listening { ticket }) {
            debug!("Ignoring stale capture outcome: {}", error);
            return;
        }

        if error.is_no_speech() {
            debug!("🎤 No speech detected, listening again");
        } else if error.is_cancellation() {
            state.auto_listen_held = true;
        } else {
            warn!("Capture failed: {}", error);
            state.notice = Some(error.to_string());
            state.auto_listen_held = true;
        }

        self.set_phase(&mut state, Phase::WaitingForUser);
        self.rearm(&mut state);
    }

    async fn run_playback(self, ticket: u64, text: String) {
        let mut view = self.inner.view.subscribe();

        let outcome = tokio::select! {
            biased;
            _ = left_phase(&mut view, Phase::Speaking { ticket }) => return,
            outcome = self.inner.voice.speak(&text, &self.inner.speech) => outcome,
        };

        let mut state = self.inner.state.lock();
        if state.phase != (Phase::Speaking { ticket }) {
            return;
        }

        match outcome {
            Ok(()) => debug!("🔊 Playback finished"),
            Err(e) if e.is_cancellation() => debug!("Playback cancelled"),
            Err(e) => {
                warn!("Playback failed: {}", e);
                state.notice = Some(e.to_string());
            }
        }

        self.set_phase(&mut state, Phase::WaitingForUser);
        self.rearm(&mut state);
    }

    fn set_phase(&self, state: &mut ControllerState, phase: Phase) {
        if state.phase != phase {
            debug!("Phase {} -> {}", state.phase, phase);
        }
        state.phase = phase;
        self.publish(state);
    }

    fn publish(&self, state: &ControllerState) {
        self.inner.view.send_replace(ControllerView {
            phase: state.phase,
            status: project(state.phase, state.voice_enabled),
            notice: state.notice.clone(),
            message_count: state.session.as_ref().map_or(0, |s| s.messages().len()),
        });
    }
}

/// Resolves once the published phase is no longer `phase`.
async fn left_phase(view: &mut watch::Receiver<ControllerView>, phase: Phase) {
    loop {
        if view.borrow_and_update().phase != phase {
            return;
        }
        if view.changed().await.is_err() {
            return;
        }
    }
}
