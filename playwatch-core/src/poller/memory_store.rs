use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use playwatch_model::PersistedSession;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ports::SessionStore;
use crate::error::Result;

/// Process-local [`SessionStore`]. Records are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, PersistedSession>>,
}

impl fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .sessions
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or_default();
        f.debug_struct("InMemorySessionStore")
            .field("session_count", &count)
            .finish()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record for a server, newest start first.
    pub async fn all_sessions(&self, server_id: &str) -> Vec<PersistedSession> {
        let guard = self.sessions.read().await;
        let mut sessions: Vec<_> = guard
            .values()
            .filter(|session| session.server_id == server_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions
    }

    pub async fn get(&self, id: Uuid) -> Option<PersistedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn active_session(
        &self,
        server_id: &str,
        session_key: &str,
    ) -> Result<Option<PersistedSession>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .find(|session| {
                session.is_active()
                    && session.server_id == server_id
                    && session.session_key == session_key
            })
            .cloned())
    }

    async fn active_sessions(
        &self,
        server_id: &str,
    ) -> Result<Vec<PersistedSession>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .filter(|session| session.is_active() && session.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn active_for_user_media(
        &self,
        server_id: &str,
        user_id: &str,
        media_id: &str,
    ) -> Result<Option<PersistedSession>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .filter(|session| {
                session.is_active()
                    && session.server_id == server_id
                    && session.user_id == user_id
                    && session.media_id == media_id
            })
            .max_by_key(|session| session.last_seen_at)
            .cloned())
    }

    async fn latest_stopped_for_user_media(
        &self,
        server_id: &str,
        user_id: &str,
        media_id: &str,
    ) -> Result<Option<PersistedSession>> {
        let guard = self.sessions.read().await;
        Ok(guard
            .values()
            .filter(|session| {
                session.server_id == server_id
                    && session.user_id == user_id
                    && session.media_id == media_id
            })
            .filter_map(|session| session.stopped_at.map(|at| (at, session)))
            .max_by_key(|(stopped_at, _)| *stopped_at)
            .map(|(_, session)| session.clone()))
    }

    async fn upsert(&self, session: PersistedSession) -> Result<()> {
        self.sessions.write().await.insert(session.id, session);
        Ok(())
    }
}
