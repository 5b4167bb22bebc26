use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::types::Json;
use tokio_postgres::NoTls;
use uuid::Uuid;
use log::{error, info};

use super::{Result, SessionStore, StoreError};
use crate::session::InterviewSession;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS interview_sessions (
        id               UUID PRIMARY KEY,
        industry         TEXT NOT NULL,
        difficulty       TEXT NOT NULL,
        personality      TEXT NOT NULL,
        started_at       TIMESTAMPTZ NOT NULL,
        ended_at         TIMESTAMPTZ,
        message_count    INTEGER NOT NULL,
        confidence_score INTEGER,
        document         JSONB NOT NULL
    )
"#;

/// Sessions in PostgreSQL. Summary columns for reporting, the full session
/// as a jsonb document.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::ConnectionFailed(format!("Pool creation failed: {}", e)))?;

        let client = pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        client
            .batch_execute(CREATE_TABLE)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Schema setup failed: {}", e)))?;

        info!("✅ Session store connected");
        Ok(Self { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn save(&self, session: &InterviewSession) -> Result<()> {
        let client = self.client().await?;

        let message_count = i32::try_from(session.messages().len())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let confidence = session.feedback().map(|f| i32::from(f.confidence_score));

        client
            .execute(
                r#"
                INSERT INTO interview_sessions
                    (id, industry, difficulty, personality, started_at, ended_at,
                     message_count, confidence_score, document)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO UPDATE SET
                    ended_at = EXCLUDED.ended_at,
                    message_count = EXCLUDED.message_count,
                    confidence_score = EXCLUDED.confidence_score,
                    document = EXCLUDED.document
                "#,
                &[
                    &session.id,
                    &session.setup.industry,
                    &session.setup.difficulty.as_str(),
                    &session.setup.personality.as_str(),
                    &session.start_time,
                    &session.end_time(),
                    &message_count,
                    &confidence,
                    &Json(session),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to save session {}: {}", session.id, e);
                StoreError::QueryFailed(e.to_string())
            })?;

        info!("💾 Session {} saved ({} messages)", session.id, message_count);
        Ok(())
    }

    async fn fetch(&self, id: &Uuid) -> Result<Option<InterviewSession>> {
        let client = self.client().await?;

        let row = client
            .query_opt("SELECT document FROM interview_sessions WHERE id = $1", &[id])
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => {
                let Json(session): Json<InterviewSession> = row
                    .try_get(0)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }
}
