use chrono::{DateTime, Utc};
use playwatch_model::PersistedSession;

use super::millis_between;

/// Slack allowed between watched time and the last reported position, to
/// absorb buffering and seeks that happen between polls.
pub const DRIFT_TOLERANCE_MS: i64 = 60_000;

/// What the stop calculation needs from a persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopInputs {
    pub started_at: DateTime<Utc>,
    pub last_paused_at: Option<DateTime<Utc>>,
    pub paused_duration_ms: i64,
    pub progress_ms: Option<i64>,
}

impl From<&PersistedSession> for StopInputs {
    fn from(session: &PersistedSession) -> Self {
        Self {
            started_at: session.started_at,
            last_paused_at: session.last_paused_at,
            paused_duration_ms: session.paused_duration_ms,
            progress_ms: session.progress_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopDuration {
    /// Time actually spent playing.
    pub duration_ms: i64,
    /// Total paused time, including a pause still open at stop time.
    pub final_paused_duration_ms: i64,
}

/// Final watched time for a session that stopped at `stopped_at`.
///
/// Wall-clock time minus observed pauses is only right when every pause was
/// seen. The last reported position bounds how much was really played, so a
/// duration past `progress + DRIFT_TOLERANCE_MS` is clamped there and the
/// difference is booked as paused time. Both outputs always add up to the
/// elapsed wall-clock time or less.
pub fn calculate_stop_duration(
    inputs: &StopInputs,
    stopped_at: DateTime<Utc>,
) -> StopDuration {
    let elapsed_ms = millis_between(inputs.started_at, stopped_at);

    let open_pause_ms = inputs
        .last_paused_at
        .map(|paused_at| millis_between(paused_at, stopped_at))
        .unwrap_or(0);
    let final_paused_duration_ms = inputs
        .paused_duration_ms
        .max(0)
        .saturating_add(open_pause_ms)
        .min(elapsed_ms);

    let duration_ms = (elapsed_ms - final_paused_duration_ms).max(0);

    match inputs.progress_ms {
        Some(progress_ms)
            if progress_ms > 0
                && duration_ms > progress_ms.saturating_add(DRIFT_TOLERANCE_MS) =>
        {
            let capped = progress_ms.saturating_add(DRIFT_TOLERANCE_MS);
            StopDuration {
                duration_ms: capped,
                final_paused_duration_ms: elapsed_ms - capped,
            }
        }
        _ => StopDuration {
            duration_ms,
            final_paused_duration_ms,
        },
    }
}
