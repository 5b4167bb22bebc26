pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::session::InterviewSession;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Where finished interviews go. Keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces the session.
    async fn save(&self, session: &InterviewSession) -> Result<()>;

    async fn fetch(&self, id: &Uuid) -> Result<Option<InterviewSession>>;
}
