//! Per-candidate session registry and the service facade used by the CLI
//! and the REST routes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::dispatcher::{Collaborators, handle_turn, initialize_conversation};
use super::report::{AssessmentReport, ExportedDocument, ReportExporter};
use super::sentiment::{SentimentSummary, summarize};
use super::state::{Conversation, ConversationSnapshot, ConversationStage};
use crate::error::{Error, SessionError};

/// Handle to one candidate's conversation. The mutex serializes turns.
pub type SessionHandle = Arc<Mutex<Conversation>>;

struct StoredSession {
    handle: SessionHandle,
    last_active: Instant,
}

impl StoredSession {
    fn new(conversation: Conversation) -> Self {
        Self {
            handle: Arc::new(Mutex::new(conversation)),
            last_active: Instant::now(),
        }
    }
}

/// In-memory map from session id to conversation.
///
/// Every lookup refreshes the session's last-activity time; `evict_idle`
/// drops sessions nobody has touched for longer than a TTL.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, StoredSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, conversation: Conversation) -> Uuid {
        let id = conversation.id();
        self.sessions
            .write()
            .await
            .insert(id, StoredSession::new(conversation));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(&id).ok_or(SessionError::NotFound { id })?;
        stored.last_active = Instant::now();
        Ok(Arc::clone(&stored.handle))
    }

    /// Drop sessions idle for longer than `ttl`. Returns the evicted ids.
    pub async fn evict_idle(&self, ttl: Duration) -> Vec<Uuid> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, stored)| stored.last_active.elapsed() > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotFound { id })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Reply to one submitted turn.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub stage: ConversationStage,
    pub complete: bool,
}

/// A freshly opened (or restarted) session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpenedSession {
    pub session_id: Uuid,
    pub reply: String,
    pub stage: ConversationStage,
}

/// Screening operations over a `SessionStore`.
pub struct ScreeningService {
    store: SessionStore,
    collaborators: Collaborators,
    exporter: Arc<dyn ReportExporter>,
}

impl ScreeningService {
    pub fn new(collaborators: Collaborators, exporter: Arc<dyn ReportExporter>) -> Self {
        Self {
            store: SessionStore::new(),
            collaborators,
            exporter,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open a new session and return its greeting.
    pub async fn initialize_conversation(&self) -> OpenedSession {
        let (reply, conversation) = initialize_conversation(&self.collaborators).await;
        let stage = conversation.stage();
        let session_id = self.store.insert(conversation).await;
        tracing::info!(%session_id, "Opened screening session");
        OpenedSession {
            session_id,
            reply,
            stage,
        }
    }

    pub async fn submit_turn(&self, id: Uuid, input: &str) -> Result<TurnOutcome, SessionError> {
        let handle = self.store.get(id).await?;
        let mut conversation = handle.lock().await;
        let reply = handle_turn(input, &mut conversation, &self.collaborators).await;
        Ok(TurnOutcome {
            reply,
            stage: conversation.stage(),
            complete: conversation.is_complete(),
        })
    }

    pub async fn is_complete(&self, id: Uuid) -> Result<bool, SessionError> {
        let handle = self.store.get(id).await?;
        let conversation = handle.lock().await;
        Ok(conversation.is_complete())
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<ConversationSnapshot, SessionError> {
        let handle = self.store.get(id).await?;
        let conversation = handle.lock().await;
        Ok(conversation.snapshot())
    }

    /// Sentiment summary; only available once the assessment is complete.
    pub async fn summarize(&self, id: Uuid) -> Result<SentimentSummary, SessionError> {
        let handle = self.store.get(id).await?;
        let conversation = handle.lock().await;
        if !conversation.is_complete() {
            return Err(SessionError::Incomplete { id });
        }
        Ok(summarize(conversation.log()))
    }

    /// Build the assessment report; only available once the assessment is complete.
    pub async fn report(&self, id: Uuid) -> Result<AssessmentReport, SessionError> {
        let handle = self.store.get(id).await?;
        let conversation = handle.lock().await;
        if !conversation.is_complete() {
            return Err(SessionError::Incomplete { id });
        }
        Ok(
            AssessmentReport::new(conversation.tech_questions(), conversation.answers())
                .with_candidate_name(conversation.profile().full_name.clone()),
        )
    }

    pub async fn export_report(&self, id: Uuid) -> Result<ExportedDocument, Error> {
        let report = self.report(id).await?;
        Ok(self.exporter.export(&report).await?)
    }

    /// Replace the session's conversation with a fresh one, keeping its id.
    pub async fn restart(&self, id: Uuid) -> Result<OpenedSession, SessionError> {
        let handle = self.store.get(id).await?;
        let mut conversation = handle.lock().await;
        conversation.reset();
        let reply = handle_turn("", &mut conversation, &self.collaborators).await;
        tracing::info!(session_id = %id, "Restarted screening session");
        Ok(OpenedSession {
            session_id: id,
            reply,
            stage: conversation.stage(),
        })
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.store.remove(id).await?;
        tracing::info!(session_id = %id, "Closed screening session");
        Ok(())
    }

    /// Close every session idle for longer than `ttl`.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let evicted = self.store.evict_idle(ttl).await;
        for session_id in &evicted {
            tracing::info!(%session_id, idle_secs = ttl.as_secs(), "Evicted idle screening session");
        }
        evicted.len()
    }
}
