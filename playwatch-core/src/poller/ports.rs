use async_trait::async_trait;
use playwatch_model::{PersistedSession, ServerType};
use serde_json::Value;

use crate::error::Result;

/// Fetches the raw "current sessions" payload from one media server.
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    /// Configured identifier, used as the store partition key.
    fn server_id(&self) -> &str;

    fn server_type(&self) -> ServerType;

    async fn fetch_sessions(&self) -> Result<Value>;

    /// Accounts with access to the server.
    async fn fetch_users(&self) -> Result<Value>;

    async fn fetch_libraries(&self) -> Result<Value>;

    /// The server's own play history. Only Plex exposes one.
    async fn fetch_history(&self) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Persistence for [`PersistedSession`] records.
///
/// All lookups are scoped to one server. "Active" means `stopped_at` is
/// unset.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn active_session(
        &self,
        server_id: &str,
        session_key: &str,
    ) -> Result<Option<PersistedSession>>;

    async fn active_sessions(
        &self,
        server_id: &str,
    ) -> Result<Vec<PersistedSession>>;

    /// Active record for the same user watching the same content, if any.
    async fn active_for_user_media(
        &self,
        server_id: &str,
        user_id: &str,
        media_id: &str,
    ) -> Result<Option<PersistedSession>>;

    /// Most recently stopped record for the same user and content.
    async fn latest_stopped_for_user_media(
        &self,
        server_id: &str,
        user_id: &str,
        media_id: &str,
    ) -> Result<Option<PersistedSession>>;

    /// Insert or replace by `id`.
    async fn upsert(&self, session: PersistedSession) -> Result<()>;
}
