//! Collapses each vendor's transcode vocabulary into [`StreamDecision`].

use playwatch_model::StreamDecision;
use serde_json::Value;
use tracing::debug;

use crate::coerce::{read_opt_bool, read_opt_string};

/// Map a free-form decision label. Unknown labels yield `None` so callers can
/// pick their own fallback.
pub fn from_label(label: &str) -> Option<StreamDecision> {
    let normalized: String = label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    match normalized.as_str() {
        "directplay" | "direct" => Some(StreamDecision::DirectPlay),
        "copy" | "directstream" | "remux" => Some(StreamDecision::Copy),
        "transcode" | "transcoding" => Some(StreamDecision::Transcode),
        "" => None,
        other => {
            debug!(label = other, "unrecognized stream decision label");
            None
        }
    }
}

/// The stronger of two decisions: transcode beats copy beats direct play.
pub fn combine(a: StreamDecision, b: StreamDecision) -> StreamDecision {
    fn rank(d: StreamDecision) -> u8 {
        match d {
            StreamDecision::DirectPlay => 0,
            StreamDecision::Copy => 1,
            StreamDecision::Transcode => 2,
        }
    }
    if rank(a) >= rank(b) { a } else { b }
}

/// Plex decision from the per-stream `TranscodeSession` decisions, falling
/// back to the selected part's own `decision` field.
pub fn plex(
    video_decision: Option<&str>,
    audio_decision: Option<&str>,
    part_decision: Option<&str>,
) -> StreamDecision {
    let video = video_decision.and_then(from_label);
    let audio = audio_decision.and_then(from_label);

    match (video, audio) {
        (None, None) => part_decision
            .and_then(from_label)
            .unwrap_or(StreamDecision::DirectPlay),
        (video, audio) => combine(
            video.unwrap_or(StreamDecision::DirectPlay),
            audio.unwrap_or(StreamDecision::DirectPlay),
        ),
    }
}

/// Jellyfin/Emby decision from `PlayState.PlayMethod` plus the optional
/// `TranscodingInfo` block.
///
/// - `DirectStream` without transcoding detail is direct play.
/// - `DirectStream` with transcoding detail is a container copy.
/// - No play method at all: a transcoding block whose video is not direct is
///   a transcode, one whose video is direct is a copy, and no block means
///   direct play.
pub fn media_browser(
    play_method: Option<&str>,
    transcoding: Option<&Value>,
) -> StreamDecision {
    let method = play_method.map(|m| m.trim().to_ascii_lowercase());

    match method.as_deref() {
        Some("transcode") => StreamDecision::Transcode,
        Some("directplay") => StreamDecision::DirectPlay,
        Some("directstream") => match transcoding {
            Some(_) => StreamDecision::Copy,
            None => StreamDecision::DirectPlay,
        },
        Some(other) if !other.is_empty() => from_label(other)
            .unwrap_or_else(|| infer_from_transcoding(transcoding)),
        _ => infer_from_transcoding(transcoding),
    }
}

fn infer_from_transcoding(transcoding: Option<&Value>) -> StreamDecision {
    match transcoding.and_then(|info| read_opt_bool(info, "IsVideoDirect")) {
        Some(false) => StreamDecision::Transcode,
        Some(true) => StreamDecision::Copy,
        None => StreamDecision::DirectPlay,
    }
}

/// Per-stream decision from a `TranscodingInfo` flag such as `IsVideoDirect`.
pub fn media_browser_stream(
    transcoding: Option<&Value>,
    direct_flag: &str,
) -> Option<StreamDecision> {
    let info = transcoding?;
    read_opt_bool(info, direct_flag).map(|direct| {
        if direct {
            StreamDecision::Copy
        } else {
            StreamDecision::Transcode
        }
    })
}

/// Plex per-stream decision straight from a `TranscodeSession` field.
pub fn plex_stream(
    transcode_session: Option<&Value>,
    key: &str,
) -> Option<StreamDecision> {
    transcode_session
        .and_then(|session| read_opt_string(session, key))
        .and_then(|label| from_label(&label))
}
