use std::collections::HashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;
use log::debug;

use super::{Result, SessionStore};
use crate::session::InterviewSession;

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, InterviewSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, session: &InterviewSession) -> Result<()> {
        debug!("Storing session {} in memory", session.id);
        self.sessions.lock().insert(session.id, session.clone());
        Ok(())
    }

    async fn fetch(&self, id: &Uuid) -> Result<Option<InterviewSession>> {
        Ok(self.sessions.lock().get(id).cloned())
    }
}
