//! Server directory records: accounts, libraries and play history.

use chrono::{DateTime, Utc};

use crate::MediaKind;

/// Account known to a media server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaUser {
    pub id: String,
    pub name: String,
    pub thumb: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
}

/// Top-level library section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaLibrary {
    pub id: String,
    pub title: String,
    /// Vendor collection type, lowercased (`movie`, `show`, `tvshows`, `music`, ...).
    pub kind: String,
    pub item_count: Option<i64>,
}

/// One completed play from a server's own history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    pub media_id: String,
    pub user_id: String,
    pub title: String,
    pub grandparent_title: Option<String>,
    pub kind: MediaKind,
    pub viewed_at: Option<DateTime<Utc>>,
}
