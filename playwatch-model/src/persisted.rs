use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{CanonicalSession, MediaKind, PlaybackState, StreamDecision};

/// Durable session record.
///
/// Created the first tick a canonical session has no active record, updated
/// every tick while the vendor keeps reporting it, and finalized exactly once
/// when it disappears. A stopped record is terminal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedSession {
    pub id: Uuid,
    pub server_id: String,
    pub session_key: String,
    pub vendor_session_id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub media_id: String,
    pub media_title: String,
    pub media_kind: MediaKind,
    pub total_duration_ms: Option<i64>,

    pub state: PlaybackState,
    pub decision: StreamDecision,
    pub bitrate_kbps: i64,
    pub ip_address: String,
    pub device_name: String,

    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub last_paused_at: Option<DateTime<Utc>>,
    pub paused_duration_ms: i64,
    pub duration_ms: Option<i64>,
    pub watched: bool,
    pub progress_ms: Option<i64>,
    /// Anchor of the resume chain this record belongs to. `None` means the
    /// record is its own anchor.
    pub reference_id: Option<Uuid>,
    pub last_seen_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Open a record for a session seen for the first time.
    pub fn start(
        server_id: impl Into<String>,
        session: &CanonicalSession,
        now: DateTime<Utc>,
        reference_id: Option<Uuid>,
    ) -> Self {
        let state = session.playback.state;
        Self {
            id: Uuid::new_v4(),
            server_id: server_id.into(),
            session_key: session.session_key.clone(),
            vendor_session_id: session.vendor_session_id.clone(),
            user_id: session.user.id.clone(),
            user_name: session.user.name.clone(),
            media_id: session.media_id.clone(),
            media_title: session.media.title.clone(),
            media_kind: session.kind(),
            total_duration_ms: (session.media.duration_ms > 0)
                .then_some(session.media.duration_ms),
            state,
            decision: session.quality.decision,
            bitrate_kbps: session.quality.bitrate_kbps,
            ip_address: session.network.ip_address.clone(),
            device_name: session.player.name.clone(),
            started_at: now,
            stopped_at: None,
            last_paused_at: state.is_paused().then_some(now),
            paused_duration_ms: 0,
            duration_ms: None,
            watched: false,
            progress_ms: Some(session.playback.position_ms),
            reference_id,
            last_seen_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// Id every later link in this chain should point at.
    pub fn anchor_id(&self) -> Uuid {
        self.reference_id.unwrap_or(self.id)
    }
}
