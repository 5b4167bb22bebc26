pub mod fallback;
pub mod prompt;

pub use fallback::{fallback_lines, fallback_utterance};
pub use prompt::{build_system_prompt, OPENING_PROMPT};

use async_trait::async_trait;
use log::{info, warn};

use crate::completion::CompletionClient;
use crate::session::{ChatTurn, InterviewSetup};

/// Source of the interviewer's next line.
///
/// Implementations always return an utterance: failures are absorbed here
/// and never reach the turn controller.
#[async_trait]
pub trait InterviewGateway: Send + Sync {
    async fn request_next_utterance(&self, history: &[ChatTurn], setup: &InterviewSetup) -> String;

    /// True when a completion credential is present. Only drives the
    /// demo-mode banner.
    fn is_configured(&self) -> bool;
}

pub struct CompletionGateway {
    client: CompletionClient,
}

impl CompletionGateway {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InterviewGateway for CompletionGateway {
    async fn request_next_utterance(&self, history: &[ChatTurn], setup: &InterviewSetup) -> String {
        if !self.client.is_configured() {
            info!("🎭 No completion credential, using scripted {} interviewer", setup.personality);
            return fallback_utterance(setup.personality).to_string();
        }

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatTurn::system(build_system_prompt(setup)));
        messages.extend_from_slice(history);

        match self.client.complete(&messages).await {
            Ok(reply) => {
                info!("🤖 Interviewer reply received ({} chars)", reply.len());
                reply
            }
            Err(e) => {
                warn!("Completion request failed, using scripted response: {:#}", e);
                fallback_utterance(setup.personality).to_string()
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }
}
