//! Attributing a newly observed session to an earlier one.
//!
//! Vendors hand out a fresh session key after an app restart, a network blip
//! or a quality switch. Those sessions are linked to the first one through
//! `reference_id` so the timeline shows one act of watching. Links always
//! point at the chain anchor, never at an intermediate record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use playwatch_model::PersistedSession;
use uuid::Uuid;

/// How long after a stop a new session may still resume the old one.
pub const DEFAULT_RESUME_WINDOW: Duration = Duration::from_secs(60);

/// The parts of an earlier session that chaining looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCandidate {
    pub id: Uuid,
    pub reference_id: Option<Uuid>,
    pub progress_ms: Option<i64>,
    pub watched: bool,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl ChainCandidate {
    pub fn anchor_id(&self) -> Uuid {
        self.reference_id.unwrap_or(self.id)
    }
}

impl From<&PersistedSession> for ChainCandidate {
    fn from(session: &PersistedSession) -> Self {
        Self {
            id: session.id,
            reference_id: session.reference_id,
            progress_ms: session.progress_ms,
            watched: session.watched,
            stopped_at: session.stopped_at,
        }
    }
}

/// Anchor to chain a new session onto, if it resumes `previous`.
///
/// All must hold: `previous` was not watched to completion, it stopped no
/// longer than `window` before `now`, and playback did not rewind
/// (`new_progress_ms >= previous.progress_ms`). A rewind starts a fresh
/// viewing.
pub fn resolve_resume_chain(
    previous: &ChainCandidate,
    new_progress_ms: i64,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<Uuid> {
    if previous.watched {
        return None;
    }

    let stopped_at = previous.stopped_at?;
    let gap_ms = (now - stopped_at).num_milliseconds().max(0);
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    if gap_ms > window_ms {
        return None;
    }

    if new_progress_ms < previous.progress_ms.unwrap_or(0) {
        return None;
    }

    Some(previous.anchor_id())
}

/// Anchor for a new session key observed while `existing` (same user, same
/// content) is still active: the client renegotiated the stream. Stopped
/// sessions are handled by [`resolve_resume_chain`] instead.
pub fn detect_quality_change(existing: Option<&ChainCandidate>) -> Option<Uuid> {
    existing
        .filter(|session| session.stopped_at.is_none())
        .map(ChainCandidate::anchor_id)
}
