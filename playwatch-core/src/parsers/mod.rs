//! Translation of vendor payloads into the canonical model.
//!
//! Each vendor module is side-effect free and never fails: malformed fields
//! fall back to typed defaults through [`crate::coerce`]. The functions here
//! dispatch on [`ServerType`] for callers that hold a payload of a known
//! vendor.

pub mod emby;
pub mod jellyfin;
pub mod media_browser;
pub mod plex;

use playwatch_model::{
    CanonicalSession, HistoryEntry, MediaKind, MediaLibrary, MediaUser,
    PlaybackState, ServerType,
};
use serde_json::Value;
use tracing::debug;

pub(crate) static NULL: Value = Value::Null;

/// Parse one raw session entry. Plex always yields a session; Jellyfin and
/// Emby yield `None` for idle players and filtered extras.
pub fn parse_session(
    server_type: ServerType,
    raw: &Value,
) -> Option<CanonicalSession> {
    match server_type {
        ServerType::Plex => Some(plex::parse_session(raw)),
        ServerType::Jellyfin => jellyfin::parse_session(raw),
        ServerType::Emby => emby::parse_session(raw),
    }
}

/// Parse a full "current sessions" response.
pub fn parse_sessions(
    server_type: ServerType,
    payload: &Value,
) -> Vec<CanonicalSession> {
    match server_type {
        ServerType::Plex => plex::parse_sessions(payload),
        ServerType::Jellyfin => jellyfin::parse_sessions(payload),
        ServerType::Emby => emby::parse_sessions(payload),
    }
}

pub fn parse_users(server_type: ServerType, payload: &Value) -> Vec<MediaUser> {
    match server_type {
        ServerType::Plex => plex::parse_users(payload),
        ServerType::Jellyfin => jellyfin::parse_users(payload),
        ServerType::Emby => emby::parse_users(payload),
    }
}

pub fn parse_libraries(
    server_type: ServerType,
    payload: &Value,
) -> Vec<MediaLibrary> {
    match server_type {
        ServerType::Plex => plex::parse_libraries(payload),
        ServerType::Jellyfin => jellyfin::parse_libraries(payload),
        ServerType::Emby => emby::parse_libraries(payload),
    }
}

/// Plex is the only vendor with a history endpoint; other payloads yield
/// nothing.
pub fn parse_history(server_type: ServerType, payload: &Value) -> Vec<HistoryEntry> {
    match server_type {
        ServerType::Plex => plex::parse_history(payload),
        ServerType::Jellyfin | ServerType::Emby => Vec::new(),
    }
}

/// Vendor item type to [`MediaKind`]. Live TV is never inferred from the
/// type label here; each vendor has its own liveness signal.
pub(crate) fn media_kind_from_label(label: &str) -> MediaKind {
    match label.trim().to_ascii_lowercase().as_str() {
        "movie" => MediaKind::Movie,
        "episode" => MediaKind::Episode,
        "track" | "audio" => MediaKind::Track,
        "photo" => MediaKind::Photo,
        "" => MediaKind::Unknown,
        other => {
            debug!(media_type = other, "unrecognized media type");
            MediaKind::Unknown
        }
    }
}

/// Player state label; anything unrecognized counts as playing.
pub(crate) fn playback_state_from_label(label: &str) -> PlaybackState {
    match label.trim().to_ascii_lowercase().as_str() {
        "paused" => PlaybackState::Paused,
        "buffering" => PlaybackState::Buffering,
        "playing" | "" => PlaybackState::Playing,
        other => {
            debug!(state = other, "unrecognized playback state");
            PlaybackState::Playing
        }
    }
}
