#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Notify, Semaphore};

use mockmate_interview::database::MemoryStore;
use mockmate_interview::gateway::InterviewGateway;
use mockmate_interview::interview::{ControllerOptions, ControllerView, FeedbackScorer, TranscriptScorer, TurnController};
use mockmate_interview::session::{ChatTurn, Difficulty, Feedback, InterviewSession, InterviewSetup, Personality};
use mockmate_interview::voice::{
    RecognitionEvent, SpeechParams, SpeechRecognizer, SpeechSynthesizer, VoiceError, VoiceIo, VoiceResult,
};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn friendly_setup() -> InterviewSetup {
    InterviewSetup::new("tech", Difficulty::Easy, Personality::Friendly)
}

/// Recognizer whose sessions stay open until the test emits something.
pub struct ScriptedRecognizer {
    available: bool,
    end_on_start: bool,
    session: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            end_on_start: false,
            session: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            end_on_start: false,
            session: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }

    /// Every session closes as soon as it opens, before anything is heard.
    pub fn ending_at_once() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            end_on_start: true,
            session: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn emit(&self, event: RecognitionEvent) -> bool {
        match self.session.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn say(&self, text: &str) -> bool {
        self.emit(RecognitionEvent::Final(text.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self) -> VoiceResult<mpsc::UnboundedReceiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.end_on_start {
            let _ = tx.send(RecognitionEvent::Ended);
        }
        *self.session.lock() = Some(tx);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn stop(&self) {
        self.session.lock().take();
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Synthesizer that either finishes at once or waits for [`FakeSynth::release`].
pub struct FakeSynth {
    held: bool,
    failure: Mutex<Option<VoiceError>>,
    gate: Semaphore,
    interrupt: Notify,
    spoken: Mutex<Vec<String>>,
    stops: AtomicUsize,
}

impl FakeSynth {
    fn build(held: bool) -> Arc<Self> {
        Arc::new(Self {
            held,
            failure: Mutex::new(None),
            gate: Semaphore::new(0),
            interrupt: Notify::new(),
            spoken: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn instant() -> Arc<Self> {
        Self::build(false)
    }

    pub fn held() -> Arc<Self> {
        Self::build(true)
    }

    pub fn failing(error: VoiceError) -> Arc<Self> {
        let synth = Self::build(false);
        *synth.failure.lock() = Some(error);
        synth
    }

    /// Lets one held utterance finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    fn is_available(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, _params: &SpeechParams) -> VoiceResult<()> {
        self.spoken.lock().push(text.to_string());
        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }
        if !self.held {
            return Ok(());
        }

        tokio::select! {
            permit = self.gate.acquire() => {
                if let Ok(permit) = permit {
                    permit.forget();
                }
                Ok(())
            }
            _ = self.interrupt.notified() => Err(VoiceError::PlaybackError("stopped".to_string())),
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.interrupt.notify_waiters();
    }
}

/// Gateway that replays canned lines and records every history it was sent.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<String>>,
    histories: Mutex<Vec<Vec<ChatTurn>>>,
    gate: Option<Semaphore>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            histories: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Every call waits for a [`ScriptedGateway::release`].
    pub fn held() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            histories: Mutex::new(Vec::new()),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub fn with_replies(self: Arc<Self>, replies: &[&str]) -> Arc<Self> {
        self.replies.lock().extend(replies.iter().map(|r| r.to_string()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.histories.lock().len()
    }

    pub fn histories(&self) -> Vec<Vec<ChatTurn>> {
        self.histories.lock().clone()
    }
}

#[async_trait]
impl InterviewGateway for ScriptedGateway {
    async fn request_next_utterance(&self, history: &[ChatTurn], _setup: &InterviewSetup) -> String {
        let call = {
            let mut histories = self.histories.lock();
            histories.push(history.to_vec());
            histories.len()
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("Question {}: tell me more.", call))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct FailingScorer;

#[async_trait]
impl FeedbackScorer for FailingScorer {
    async fn score(&self, _session: &InterviewSession) -> anyhow::Result<Feedback> {
        Err(anyhow!("scoring service unavailable"))
    }
}

pub struct StalledScorer;

#[async_trait]
impl FeedbackScorer for StalledScorer {
    async fn score(&self, _session: &InterviewSession) -> anyhow::Result<Feedback> {
        std::future::pending::<()>().await;
        Err(anyhow!("unreachable"))
    }
}

pub struct FixedScorer(pub Feedback);

#[async_trait]
impl FeedbackScorer for FixedScorer {
    async fn score(&self, _session: &InterviewSession) -> anyhow::Result<Feedback> {
        Ok(self.0.clone())
    }
}

pub struct Harness {
    pub controller: TurnController,
    pub voice: Arc<VoiceIo>,
    pub recognizer: Option<Arc<ScriptedRecognizer>>,
    pub synth: Option<Arc<FakeSynth>>,
    pub store: Arc<MemoryStore>,
}

pub struct HarnessBuilder {
    recognizer: Option<Arc<ScriptedRecognizer>>,
    synth: Option<Arc<FakeSynth>>,
    gateway: Arc<dyn InterviewGateway>,
    scorer: Arc<dyn FeedbackScorer>,
    options: ControllerOptions,
    silence_window: Option<Duration>,
}

impl HarnessBuilder {
    pub fn new(gateway: Arc<dyn InterviewGateway>) -> Self {
        Self {
            recognizer: None,
            synth: None,
            gateway,
            scorer: Arc::new(TranscriptScorer::new()),
            options: ControllerOptions::default(),
            silence_window: None,
        }
    }

    pub fn recognizer(mut self, recognizer: Arc<ScriptedRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn synth(mut self, synth: Arc<FakeSynth>) -> Self {
        self.synth = Some(synth);
        self
    }

    pub fn scorer(mut self, scorer: Arc<dyn FeedbackScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn voice_enabled(mut self, enabled: bool) -> Self {
        self.options.voice_enabled = enabled;
        self
    }

    pub fn silence_window(mut self, window: Duration) -> Self {
        self.silence_window = Some(window);
        self
    }

    pub fn feedback_timeout(mut self, timeout: Duration) -> Self {
        self.options.feedback_timeout = timeout;
        self
    }

    pub fn build(self) -> Harness {
        let mut voice = VoiceIo::new(
            self.recognizer.clone().map(|r| r as Arc<dyn SpeechRecognizer>),
            self.synth.clone().map(|s| s as Arc<dyn SpeechSynthesizer>),
        );
        if let Some(window) = self.silence_window {
            voice = voice.with_silence_window(window);
        }
        let voice = Arc::new(voice);
        let store = Arc::new(MemoryStore::new());
        let controller = TurnController::new(voice.clone(), self.gateway, self.scorer, store.clone(), self.options);

        Harness {
            controller,
            voice,
            recognizer: self.recognizer,
            synth: self.synth,
            store,
        }
    }
}

impl Harness {
    pub fn recognizer(&self) -> &ScriptedRecognizer {
        self.recognizer.as_deref().expect("harness built without a recognizer")
    }

    pub fn synth(&self) -> &FakeSynth {
        self.synth.as_deref().expect("harness built without a synthesizer")
    }

    pub fn message_count(&self) -> usize {
        self.controller.session().map_or(0, |s| s.messages().len())
    }
}

/// Waits until the published view satisfies `pred`.
pub async fn wait_for<F>(rx: &mut watch::Receiver<ControllerView>, mut pred: F) -> ControllerView
where
    F: FnMut(&ControllerView) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let view = rx.borrow_and_update().clone();
            if pred(&view) {
                return view;
            }
            rx.changed().await.expect("controller dropped");
        }
    })
    .await
    .expect("timed out waiting for controller view")
}

/// Polls `cond` until it holds.
pub async fn eventually<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true")
}
