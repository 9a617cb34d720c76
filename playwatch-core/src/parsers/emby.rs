//! Emby payloads (`/Sessions`, `/Users`, `/Library/VirtualFolders`).

use playwatch_model::{CanonicalSession, MediaLibrary, MediaUser, ServerType};
use serde_json::Value;

use crate::parsers::media_browser::{self, Dialect};

pub const DIALECT: Dialect = Dialect {
    server_type: ServerType::Emby,
    // Cinema intros arrive as `Trailer` items, which are filtered by type.
    preroll_provider_keys: &[],
    // Older Emby releases only populate `Id` on virtual folders.
    library_id_keys: &["ItemId", "Id"],
};

pub fn parse_sessions(payload: &Value) -> Vec<CanonicalSession> {
    media_browser::parse_sessions(&DIALECT, payload)
}

/// `None` when the player is idle or the item is a trailer/theme.
pub fn parse_session(raw: &Value) -> Option<CanonicalSession> {
    media_browser::parse_session(&DIALECT, raw)
}

pub fn parse_users(payload: &Value) -> Vec<MediaUser> {
    media_browser::parse_users(payload)
}

pub fn parse_libraries(payload: &Value) -> Vec<MediaLibrary> {
    media_browser::parse_libraries(&DIALECT, payload)
}
