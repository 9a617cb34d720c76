//! Plex Media Server payloads (`/status/sessions`, `/accounts`,
//! `/library/sections`, `/status/sessions/history/all`).
//!
//! Plex wraps every list in `{"MediaContainer": {...}}`. Times are already in
//! milliseconds. Plex has no idle-player or trailer signal on the sessions
//! endpoint, so every entry becomes a session.

use chrono::{DateTime, Utc};
use playwatch_model::{
    CanonicalSession, EpisodeDetails, HistoryEntry, LiveDetails, MediaDetails,
    MediaKind, MediaLibrary, MediaUser, SessionMedia,
    SessionNetwork, SessionPlayback, SessionPlayer, SessionQuality,
    SessionUser, StreamDetails, TrackDetails,
};
use serde_json::Value;

use crate::coerce::{
    field, read_array, read_bool, read_i64, read_object, read_opt_i64,
    read_opt_string, read_string,
};
use crate::decision;
use crate::parsers::{NULL, media_kind_from_label, playback_state_from_label};

const CONTAINER: &str = "MediaContainer";

/// Entries of `MediaContainer.<key>`, tolerating a bare array.
fn container_items<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    match payload {
        Value::Array(items) => items.as_slice(),
        other => match field(other, CONTAINER) {
            Some(container) => read_array(container, key),
            None => read_array(other, key),
        },
    }
}

/// Every session in a `/status/sessions` response.
pub fn parse_sessions(payload: &Value) -> Vec<CanonicalSession> {
    container_items(payload, "Metadata")
        .iter()
        .map(parse_session)
        .collect()
}

/// One `Metadata` entry of `/status/sessions`.
pub fn parse_session(raw: &Value) -> CanonicalSession {
    let media = selected_media(raw);
    let transcode_session = read_object(raw, "TranscodeSession");
    let player = field(raw, "Player").unwrap_or(&NULL);
    let user = field(raw, "User").unwrap_or(&NULL);

    let duration_ms = read_i64(raw, "duration").max(0);
    let position_ms = read_i64(raw, "viewOffset").max(0);
    let state = playback_state_from_label(&read_string(player, "state"));

    CanonicalSession {
        session_key: read_string(raw, "sessionKey"),
        media_id: read_string(raw, "ratingKey"),
        vendor_session_id: field(raw, "Session")
            .and_then(|session| read_opt_string(session, "id")),
        user: SessionUser::new(
            read_string(user, "id"),
            read_string(user, "title"),
            read_opt_string(user, "thumb"),
        ),
        media: SessionMedia {
            title: read_string(raw, "title"),
            duration_ms,
            year: read_opt_i64(raw, "year"),
            thumb_path: read_opt_string(raw, "thumb"),
            details: media_details(raw, media),
        },
        playback: SessionPlayback::new(state, position_ms, duration_ms),
        player: SessionPlayer {
            name: read_string(player, "title"),
            device_id: read_string(player, "machineIdentifier"),
            product: read_opt_string(player, "product"),
            platform: read_opt_string(player, "platform"),
        },
        network: network(player),
        quality: quality(media, transcode_session),
    }
}

/// The media version actually playing: the entry flagged `selected`, else
/// the first one.
fn selected_media(raw: &Value) -> Option<&Value> {
    let versions = read_array(raw, "Media");
    versions
        .iter()
        .find(|media| read_bool(media, "selected"))
        .or_else(|| versions.first())
}

/// Local players report their LAN address; remote ones prefer the public
/// address so geolocation does not resolve a private one.
fn network(player: &Value) -> SessionNetwork {
    let is_local = read_bool(player, "local");
    let local_address = read_string(player, "address");
    let ip_address = if is_local {
        local_address
    } else {
        read_opt_string(player, "remotePublicAddress").unwrap_or(local_address)
    };

    SessionNetwork {
        ip_address,
        is_local,
    }
}

fn quality(
    media: Option<&Value>,
    transcode_session: Option<&Value>,
) -> SessionQuality {
    let part_decision = media
        .and_then(|m| read_array(m, "Part").first())
        .and_then(|part| read_opt_string(part, "decision"));
    let video_decision = transcode_session
        .and_then(|session| read_opt_string(session, "videoDecision"));
    let audio_decision = transcode_session
        .and_then(|session| read_opt_string(session, "audioDecision"));

    let overall = decision::plex(
        video_decision.as_deref(),
        audio_decision.as_deref(),
        part_decision.as_deref(),
    );

    let stream = media.and_then(|m| {
        StreamDetails {
            container: read_opt_string(m, "container"),
            video_codec: read_opt_string(m, "videoCodec"),
            audio_codec: read_opt_string(m, "audioCodec"),
            video_resolution: read_opt_string(m, "videoResolution"),
            width: read_opt_i64(m, "width"),
            height: read_opt_i64(m, "height"),
            video_decision: decision::plex_stream(
                transcode_session,
                "videoDecision",
            ),
            audio_decision: decision::plex_stream(
                transcode_session,
                "audioDecision",
            ),
        }
        .into_option()
    });

    SessionQuality {
        decision: overall,
        bitrate_kbps: media.map(|m| read_i64(m, "bitrate")).unwrap_or(0).max(0),
        stream,
    }
}

fn media_details(raw: &Value, media: Option<&Value>) -> MediaDetails {
    // Live TV may still carry movie/episode fields; the flag wins.
    if read_bool(raw, "live") {
        let channel_title = media
            .and_then(|m| read_opt_string(m, "channelTitle"))
            .or_else(|| read_opt_string(raw, "channelTitle"))
            .or_else(|| read_opt_string(raw, "title"));
        return MediaDetails::Live(LiveDetails {
            channel_title,
            channel_identifier: media
                .and_then(|m| read_opt_string(m, "channelIdentifier"))
                .or_else(|| read_opt_string(raw, "channelIdentifier")),
            channel_thumb: media
                .and_then(|m| read_opt_string(m, "channelThumb"))
                .or_else(|| read_opt_string(raw, "channelThumb")),
        });
    }

    match media_kind_from_label(&read_string(raw, "type")) {
        MediaKind::Movie => MediaDetails::Movie,
        MediaKind::Episode => MediaDetails::Episode(EpisodeDetails {
            show_title: read_opt_string(raw, "grandparentTitle"),
            show_id: read_opt_string(raw, "grandparentRatingKey"),
            season_number: read_opt_i64(raw, "parentIndex"),
            episode_number: read_opt_i64(raw, "index"),
            season_name: read_opt_string(raw, "parentTitle"),
            show_thumb_path: read_opt_string(raw, "grandparentThumb"),
        }),
        MediaKind::Track => MediaDetails::Track(TrackDetails {
            // grandparent is the album artist; per-track artist is the fallback
            artist_name: read_opt_string(raw, "grandparentTitle")
                .or_else(|| read_opt_string(raw, "originalTitle")),
            album_name: read_opt_string(raw, "parentTitle"),
            track_number: read_opt_i64(raw, "index"),
            disc_number: read_opt_i64(raw, "parentIndex"),
        }),
        MediaKind::Photo => MediaDetails::Photo,
        MediaKind::Live | MediaKind::Unknown => MediaDetails::Unknown,
    }
}

/// Server-local accounts from `/accounts`.
pub fn parse_users(payload: &Value) -> Vec<MediaUser> {
    container_items(payload, "Account")
        .iter()
        .filter_map(|account| {
            let id = read_opt_string(account, "id")?;
            // Plex reserves id 0 for the anonymous system account.
            if id == "0" {
                return None;
            }
            Some(MediaUser {
                is_admin: id == "1",
                id,
                name: read_opt_string(account, "name")
                    .unwrap_or_else(|| SessionUser::UNKNOWN_NAME.to_string()),
                thumb: read_opt_string(account, "thumb"),
                email: read_opt_string(account, "email"),
            })
        })
        .collect()
}

/// Library sections from `/library/sections`.
pub fn parse_libraries(payload: &Value) -> Vec<MediaLibrary> {
    container_items(payload, "Directory")
        .iter()
        .filter_map(|section| {
            Some(MediaLibrary {
                id: read_opt_string(section, "key")?,
                title: read_string(section, "title"),
                kind: read_string(section, "type").to_ascii_lowercase(),
                item_count: read_opt_i64(section, "count"),
            })
        })
        .collect()
}

/// Play history from `/status/sessions/history/all`.
pub fn parse_history(payload: &Value) -> Vec<HistoryEntry> {
    container_items(payload, "Metadata")
        .iter()
        .map(|item| HistoryEntry {
            media_id: read_string(item, "ratingKey"),
            user_id: read_string(item, "accountID"),
            title: read_string(item, "title"),
            grandparent_title: read_opt_string(item, "grandparentTitle"),
            kind: media_kind_from_label(&read_string(item, "type")),
            viewed_at: read_opt_i64(item, "viewedAt")
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        })
        .collect()
}
