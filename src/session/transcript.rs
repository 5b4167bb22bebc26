use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Feedback, InterviewSetup, SessionError};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One turn of the conversation. Never edited after it is appended.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Role-tagged history entry as sent to the completion service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        match message.sender {
            Sender::User => ChatTurn::user(message.content.clone()),
            Sender::Ai => ChatTurn::assistant(message.content.clone()),
        }
    }
}

/// One interview attempt. Only the turn controller mutates it; everyone
/// else gets clones.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: Uuid,
    pub setup: InterviewSetup,
    messages: Vec<Message>,
    pub start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    feedback: Option<Feedback>,
}

impl InterviewSession {
    pub(crate) fn new(setup: InterviewSetup) -> Self {
        Self {
            id: Uuid::new_v4(),
            setup,
            messages: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            feedback: None,
        }
    }

    /// Appends a message stamped no earlier than the previous one, so the
    /// transcript stays ordered even if the wall clock steps backwards.
    pub(crate) fn append(&mut self, sender: Sender, content: impl Into<String>) -> Result<&Message, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }

        let timestamp = self.next_timestamp();
        self.messages.push(Message {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp,
        });

        // just pushed
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub(crate) fn finish(&mut self, feedback: Feedback) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.end_time = Some(self.next_timestamp());
        self.feedback = Some(feedback);
        Ok(())
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let floor = self
            .messages
            .last()
            .map(|m| m.timestamp)
            .unwrap_or(self.start_time);
        Utc::now().max(floor)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn duration_seconds(&self) -> i64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_seconds().max(0)
    }

    /// Candidate answers only, in order.
    pub fn user_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.sender == Sender::User)
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(ChatTurn::from).collect()
    }
}
