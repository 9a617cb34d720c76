//! Jellyfin payloads (`/Sessions`, `/Users`, `/Library/VirtualFolders`).

use playwatch_model::{CanonicalSession, MediaLibrary, MediaUser, ServerType};
use serde_json::Value;

use crate::parsers::media_browser::{self, Dialect};

pub const DIALECT: Dialect = Dialect {
    server_type: ServerType::Jellyfin,
    // Local Intros and the prerolls.video plugin tag their items.
    preroll_provider_keys: &["prerolls.video", "LocalIntros"],
    library_id_keys: &["ItemId"],
};

pub fn parse_sessions(payload: &Value) -> Vec<CanonicalSession> {
    media_browser::parse_sessions(&DIALECT, payload)
}

/// `None` when the player is idle or the item is a trailer/preroll/theme.
pub fn parse_session(raw: &Value) -> Option<CanonicalSession> {
    media_browser::parse_session(&DIALECT, raw)
}

pub fn parse_users(payload: &Value) -> Vec<MediaUser> {
    media_browser::parse_users(payload)
}

pub fn parse_libraries(payload: &Value) -> Vec<MediaLibrary> {
    media_browser::parse_libraries(&DIALECT, payload)
}
