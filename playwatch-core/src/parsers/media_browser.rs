//! Session payloads shared by Jellyfin and Emby.
//!
//! Jellyfin forked from Emby and both still serve `/Sessions`, `/Users` and
//! `/Library/VirtualFolders` with the same PascalCase shape. Where the two
//! diverge the difference lives in a [`Dialect`].
//!
//! Times are 100ns ticks; every position and duration is converted with
//! [`ticks_to_ms`] before any arithmetic.

use std::net::IpAddr;

use playwatch_model::{
    CanonicalSession, EpisodeDetails, LiveDetails, MediaDetails, MediaKind,
    MediaLibrary, MediaUser, PlaybackState, ServerType, SessionMedia,
    SessionNetwork, SessionPlayback, SessionPlayer, SessionQuality,
    SessionUser, StreamDetails, TrackDetails,
};
use serde_json::Value;
use tracing::trace;

use crate::coerce::{
    as_string, field, items_or_wrapped, read_array, read_bool, read_first_string,
    read_i64, read_object, read_opt_i64, read_opt_string, read_string,
};
use crate::decision;
use crate::parsers::{NULL, media_kind_from_label};

const TICKS_PER_MS: i64 = 10_000;

/// Item types that mark live TV, compared case-insensitively.
const LIVE_ITEM_TYPES: &[&str] = &["tvchannel", "livetvchannel", "livetvprogram"];

/// Extras that the server plays around real content and that must never be
/// reported as viewing sessions.
const FILTERED_ITEM_TYPES: &[&str] = &["trailer", "preroll"];
const FILTERED_EXTRA_TYPES: &[&str] =
    &["trailer", "themesong", "themevideo", "preroll"];

/// Per-vendor differences in the shared payload shape.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub server_type: ServerType,
    /// `ProviderIds` keys set by intro/preroll plugins.
    pub preroll_provider_keys: &'static [&'static str],
    /// Keys holding a library's id in `/Library/VirtualFolders`, in order.
    pub library_id_keys: &'static [&'static str],
}

/// 100ns ticks to milliseconds, truncating.
pub fn ticks_to_ms(ticks: i64) -> i64 {
    ticks / TICKS_PER_MS
}

pub fn parse_sessions(dialect: &Dialect, payload: &Value) -> Vec<CanonicalSession> {
    items_or_wrapped(payload, "Items")
        .iter()
        .filter_map(|raw| parse_session(dialect, raw))
        .collect()
}

/// `None` for idle players and for trailers, prerolls and theme media.
pub fn parse_session(dialect: &Dialect, raw: &Value) -> Option<CanonicalSession> {
    let item = read_object(raw, "NowPlayingItem")?;
    if is_filtered_item(dialect, item) {
        trace!(
            server_type = %dialect.server_type,
            item_type = %read_string(item, "Type"),
            "skipping non-content playback"
        );
        return None;
    }

    let play_state = field(raw, "PlayState").unwrap_or(&NULL);
    let transcoding = read_object(raw, "TranscodingInfo");

    let duration_ms = ticks_to_ms(read_i64(item, "RunTimeTicks")).max(0);
    let position_ms = ticks_to_ms(read_i64(play_state, "PositionTicks")).max(0);
    // Neither vendor reports buffering on the sessions endpoint.
    let state = if read_bool(play_state, "IsPaused") {
        PlaybackState::Paused
    } else {
        PlaybackState::Playing
    };

    let session_id = read_string(raw, "Id");
    let user_id = read_string(raw, "UserId");
    let user_thumb = read_opt_string(raw, "UserPrimaryImageTag")
        .filter(|_| !user_id.is_empty())
        .map(|_| format!("/Users/{user_id}/Images/Primary"));

    Some(CanonicalSession {
        vendor_session_id: (!session_id.is_empty()).then(|| session_id.clone()),
        session_key: session_id,
        media_id: read_string(item, "Id"),
        user: SessionUser::new(user_id, read_string(raw, "UserName"), user_thumb),
        media: SessionMedia {
            title: read_string(item, "Name"),
            duration_ms,
            year: read_opt_i64(item, "ProductionYear"),
            thumb_path: primary_image(item, "Id", "ImageTags"),
            details: media_details(item),
        },
        playback: SessionPlayback::new(state, position_ms, duration_ms),
        player: SessionPlayer {
            name: read_string(raw, "DeviceName"),
            device_id: read_string(raw, "DeviceId"),
            product: read_opt_string(raw, "Client"),
            platform: None,
        },
        network: network(raw),
        quality: quality(item, play_state, transcoding),
    })
}

fn is_filtered_item(dialect: &Dialect, item: &Value) -> bool {
    let item_type = read_string(item, "Type").to_ascii_lowercase();
    if FILTERED_ITEM_TYPES.contains(&item_type.as_str()) {
        return true;
    }

    let extra_type = read_string(item, "ExtraType").to_ascii_lowercase();
    if FILTERED_EXTRA_TYPES.contains(&extra_type.as_str()) {
        return true;
    }

    if read_bool(item, "IsThemeMedia") {
        return true;
    }

    match read_object(item, "ProviderIds") {
        Some(Value::Object(ids)) => ids.keys().any(|key| {
            dialect
                .preroll_provider_keys
                .iter()
                .any(|preroll| key.eq_ignore_ascii_case(preroll))
        }),
        _ => false,
    }
}

fn is_live(item: &Value) -> bool {
    let item_type = read_string(item, "Type").to_ascii_lowercase();
    LIVE_ITEM_TYPES.contains(&item_type.as_str())
}

/// `/Items/{id}/Images/Primary` when the item advertises a primary image.
fn primary_image(item: &Value, id_key: &str, tags_key: &str) -> Option<String> {
    let id = read_opt_string(item, id_key)?;
    let has_primary = match field(item, tags_key) {
        Some(tags @ Value::Object(_)) => read_opt_string(tags, "Primary").is_some(),
        Some(tag) => as_string(tag).is_some_and(|tag| !tag.is_empty()),
        None => false,
    };
    has_primary.then(|| format!("/Items/{id}/Images/Primary"))
}

fn media_details(item: &Value) -> MediaDetails {
    if is_live(item) {
        return MediaDetails::Live(LiveDetails {
            channel_title: read_opt_string(item, "ChannelName")
                .or_else(|| read_opt_string(item, "Name")),
            channel_identifier: read_opt_string(item, "ChannelNumber")
                .or_else(|| read_opt_string(item, "Number"))
                .or_else(|| read_opt_string(item, "ChannelId")),
            channel_thumb: primary_image(item, "ChannelId", "ChannelPrimaryImageTag")
                .or_else(|| primary_image(item, "Id", "ImageTags")),
        });
    }

    match media_kind_from_label(&read_string(item, "Type")) {
        MediaKind::Movie => MediaDetails::Movie,
        MediaKind::Episode => MediaDetails::Episode(EpisodeDetails {
            show_title: read_opt_string(item, "SeriesName"),
            show_id: read_opt_string(item, "SeriesId"),
            season_number: read_opt_i64(item, "ParentIndexNumber"),
            episode_number: read_opt_i64(item, "IndexNumber"),
            season_name: read_opt_string(item, "SeasonName"),
            show_thumb_path: primary_image(item, "SeriesId", "SeriesPrimaryImageTag"),
        }),
        MediaKind::Track => MediaDetails::Track(TrackDetails {
            artist_name: read_opt_string(item, "AlbumArtist")
                .or_else(|| read_first_string(item, "Artists")),
            album_name: read_opt_string(item, "Album"),
            track_number: read_opt_i64(item, "IndexNumber"),
            disc_number: read_opt_i64(item, "ParentIndexNumber"),
        }),
        MediaKind::Photo => MediaDetails::Photo,
        MediaKind::Live | MediaKind::Unknown => MediaDetails::Unknown,
    }
}

fn network(raw: &Value) -> SessionNetwork {
    let ip_address = read_opt_string(raw, "RemoteEndPoint")
        .map(|endpoint| strip_port(&endpoint))
        .unwrap_or_default();
    SessionNetwork {
        is_local: is_private_address(&ip_address),
        ip_address,
    }
}

/// `1.2.3.4:8096` and `[::1]:8096` down to the bare address.
fn strip_port(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if let Some(rest) = endpoint.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }
    match endpoint.rsplit_once(':') {
        // a single colon means host:port, several mean a bare IPv6 address
        Some((host, port))
            if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) =>
        {
            host.to_string()
        }
        _ => endpoint.to_string(),
    }
}

fn is_private_address(address: &str) -> bool {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
            None => {
                v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local()
            }
        },
        Err(_) => false,
    }
}

fn stream_of_type<'a>(item: &'a Value, kind: &str) -> Option<&'a Value> {
    read_array(item, "MediaStreams")
        .iter()
        .find(|stream| read_string(stream, "Type").eq_ignore_ascii_case(kind))
}

/// Plex-style resolution label from a frame height.
fn resolution_label(height: i64) -> Option<String> {
    let label = match height {
        h if h <= 0 => return None,
        h if h >= 2160 => "4k",
        h if h >= 1080 => "1080",
        h if h >= 720 => "720",
        h if h >= 480 => "480",
        _ => "sd",
    };
    Some(label.to_string())
}

fn quality(
    item: &Value,
    play_state: &Value,
    transcoding: Option<&Value>,
) -> SessionQuality {
    let play_method = read_opt_string(play_state, "PlayMethod");
    let overall = decision::media_browser(play_method.as_deref(), transcoding);

    let video = stream_of_type(item, "Video");
    let audio = stream_of_type(item, "Audio");

    let bitrate_bps = transcoding
        .and_then(|info| read_opt_i64(info, "Bitrate"))
        .or_else(|| read_opt_i64(item, "Bitrate"))
        .or_else(|| video.and_then(|stream| read_opt_i64(stream, "BitRate")))
        .unwrap_or(0);

    let from_transcode =
        |key: &str| transcoding.and_then(|info| read_opt_string(info, key));
    let width = transcoding
        .and_then(|info| read_opt_i64(info, "Width"))
        .or_else(|| video.and_then(|stream| read_opt_i64(stream, "Width")));
    let height = transcoding
        .and_then(|info| read_opt_i64(info, "Height"))
        .or_else(|| video.and_then(|stream| read_opt_i64(stream, "Height")));

    let stream = StreamDetails {
        container: from_transcode("Container")
            .or_else(|| read_opt_string(item, "Container")),
        video_codec: from_transcode("VideoCodec")
            .or_else(|| video.and_then(|stream| read_opt_string(stream, "Codec"))),
        audio_codec: from_transcode("AudioCodec")
            .or_else(|| audio.and_then(|stream| read_opt_string(stream, "Codec"))),
        video_resolution: height.and_then(resolution_label),
        width,
        height,
        video_decision: decision::media_browser_stream(transcoding, "IsVideoDirect"),
        audio_decision: decision::media_browser_stream(transcoding, "IsAudioDirect"),
    }
    .into_option();

    SessionQuality {
        decision: overall,
        bitrate_kbps: (bitrate_bps / 1000).max(0),
        stream,
    }
}

/// Accounts from `/Users`.
pub fn parse_users(payload: &Value) -> Vec<MediaUser> {
    items_or_wrapped(payload, "Items")
        .iter()
        .filter_map(|user| {
            let id = read_opt_string(user, "Id")?;
            let thumb = read_opt_string(user, "PrimaryImageTag")
                .map(|_| format!("/Users/{id}/Images/Primary"));
            Some(MediaUser {
                name: read_opt_string(user, "Name")
                    .unwrap_or_else(|| SessionUser::UNKNOWN_NAME.to_string()),
                thumb,
                email: None,
                is_admin: field(user, "Policy")
                    .map(|policy| read_bool(policy, "IsAdministrator"))
                    .unwrap_or(false),
                id,
            })
        })
        .collect()
}

/// Libraries from `/Library/VirtualFolders`.
pub fn parse_libraries(dialect: &Dialect, payload: &Value) -> Vec<MediaLibrary> {
    items_or_wrapped(payload, "Items")
        .iter()
        .filter_map(|folder| {
            let id = dialect
                .library_id_keys
                .iter()
                .find_map(|key| read_opt_string(folder, key))?;
            Some(MediaLibrary {
                id,
                title: read_string(folder, "Name"),
                kind: read_opt_string(folder, "CollectionType")
                    .unwrap_or_else(|| "mixed".to_string())
                    .to_ascii_lowercase(),
                item_count: read_opt_i64(folder, "ChildCount"),
            })
        })
        .collect()
}
