use std::fmt::{self, Display, Formatter};

/// Flat media type tag, used for storage and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    Movie,
    Episode,
    Track,
    Live,
    Photo,
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
            MediaKind::Track => "track",
            MediaKind::Live => "live",
            MediaKind::Photo => "photo",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Show metadata carried by episodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeDetails {
    pub show_title: Option<String>,
    pub show_id: Option<String>,
    pub season_number: Option<i64>,
    pub episode_number: Option<i64>,
    pub season_name: Option<String>,
    pub show_thumb_path: Option<String>,
}

/// Music metadata carried by tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackDetails {
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub track_number: Option<i64>,
    pub disc_number: Option<i64>,
}

/// Channel metadata carried by live TV.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveDetails {
    pub channel_title: Option<String>,
    pub channel_identifier: Option<String>,
    pub channel_thumb: Option<String>,
}

/// Type-specific media metadata. The variant is the media type, so an
/// episode can never carry track fields and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "details", rename_all = "lowercase")
)]
pub enum MediaDetails {
    Movie,
    Episode(EpisodeDetails),
    Track(TrackDetails),
    Live(LiveDetails),
    Photo,
    #[default]
    Unknown,
}

impl MediaDetails {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetails::Movie => MediaKind::Movie,
            MediaDetails::Episode(_) => MediaKind::Episode,
            MediaDetails::Track(_) => MediaKind::Track,
            MediaDetails::Live(_) => MediaKind::Live,
            MediaDetails::Photo => MediaKind::Photo,
            MediaDetails::Unknown => MediaKind::Unknown,
        }
    }

    pub fn episode(&self) -> Option<&EpisodeDetails> {
        match self {
            MediaDetails::Episode(details) => Some(details),
            _ => None,
        }
    }

    pub fn track(&self) -> Option<&TrackDetails> {
        match self {
            MediaDetails::Track(details) => Some(details),
            _ => None,
        }
    }

    pub fn live(&self) -> Option<&LiveDetails> {
        match self {
            MediaDetails::Live(details) => Some(details),
            _ => None,
        }
    }
}
