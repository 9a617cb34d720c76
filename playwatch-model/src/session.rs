//! Canonical, vendor-neutral view of one observed playback.
//!
//! A [`CanonicalSession`] is rebuilt from scratch on every poll tick and is
//! never stored as-is; the tracker folds it into a
//! [`PersistedSession`](crate::PersistedSession).

use crate::{MediaDetails, MediaKind, PlaybackState, StreamDecision};

/// One playback instance as reported by a media server.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanonicalSession {
    /// Vendor-scoped key. Only unique within one server.
    pub session_key: String,
    /// Vendor item id of the content being played.
    pub media_id: String,
    /// Native session id, needed for termination commands.
    pub vendor_session_id: Option<String>,
    pub user: SessionUser,
    pub media: SessionMedia,
    pub playback: SessionPlayback,
    pub player: SessionPlayer,
    pub network: SessionNetwork,
    pub quality: SessionQuality,
}

impl CanonicalSession {
    pub fn kind(&self) -> MediaKind {
        self.media.details.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionUser {
    pub id: String,
    /// Never empty; vendors that omit the name yield `"Unknown"`.
    pub name: String,
    pub thumb: Option<String>,
}

impl SessionUser {
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    pub fn new(id: String, name: String, thumb: Option<String>) -> Self {
        let name = if name.trim().is_empty() {
            Self::UNKNOWN_NAME.to_string()
        } else {
            name
        };
        Self { id, name, thumb }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionMedia {
    pub title: String,
    /// Total runtime in milliseconds, `0` when unknown.
    pub duration_ms: i64,
    pub year: Option<i64>,
    pub thumb_path: Option<String>,
    pub details: MediaDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionPlayback {
    pub state: PlaybackState,
    pub position_ms: i64,
    /// Always within `0..=100`.
    pub progress_percent: u8,
}

impl SessionPlayback {
    pub fn new(state: PlaybackState, position_ms: i64, duration_ms: i64) -> Self {
        let position_ms = position_ms.max(0);
        Self {
            state,
            position_ms,
            progress_percent: progress_percent(position_ms, duration_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionPlayer {
    pub name: String,
    pub device_id: String,
    pub product: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionNetwork {
    pub ip_address: String,
    pub is_local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionQuality {
    pub decision: StreamDecision,
    /// Kilobits per second, `0` when the vendor does not report it.
    pub bitrate_kbps: i64,
    pub stream: Option<StreamDetails>,
}

impl SessionQuality {
    pub fn is_transcode(&self) -> bool {
        self.decision.is_transcode()
    }
}

/// Codec and resolution detail, present only when the vendor reported any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamDetails {
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub video_resolution: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub video_decision: Option<StreamDecision>,
    pub audio_decision: Option<StreamDecision>,
}

impl StreamDetails {
    pub fn is_empty(&self) -> bool {
        *self == StreamDetails::default()
    }

    /// `None` when nothing was filled in.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Whole-percent progress, clamped to 100. Zero or negative durations yield 0.
pub fn progress_percent(position_ms: i64, duration_ms: i64) -> u8 {
    if duration_ms <= 0 || position_ms <= 0 {
        return 0;
    }
    let ratio = position_ms as f64 / duration_ms as f64 * 100.0;
    ratio.min(100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_rounded_and_capped() {
        assert_eq!(progress_percent(0, 1000), 0);
        assert_eq!(progress_percent(505, 1000), 51);
        assert_eq!(progress_percent(1500, 1000), 100);
        assert_eq!(progress_percent(500, 0), 0);
        assert_eq!(progress_percent(500, -10), 0);
    }

    #[test]
    fn empty_user_name_defaults() {
        let user = SessionUser::new("1".into(), "  ".into(), None);
        assert_eq!(user.name, "Unknown");
    }

    #[test]
    fn empty_stream_details_collapse_to_none() {
        assert!(StreamDetails::default().into_option().is_none());
        let details = StreamDetails {
            video_codec: Some("h264".into()),
            ..Default::default()
        };
        assert!(details.into_option().is_some());
    }
}
