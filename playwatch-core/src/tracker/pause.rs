use chrono::{DateTime, Utc};
use playwatch_model::{PersistedSession, PlaybackState};

use super::millis_between;

/// Pause bookkeeping carried on a persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseState {
    /// Set while the session is paused.
    pub last_paused_at: Option<DateTime<Utc>>,
    pub paused_duration_ms: i64,
}

impl From<&PersistedSession> for PauseState {
    fn from(session: &PersistedSession) -> Self {
        Self {
            last_paused_at: session.last_paused_at,
            paused_duration_ms: session.paused_duration_ms,
        }
    }
}

/// Fold one observed state transition into the pause totals.
///
/// Buffering counts as playing. Repeating the same state is a no-op, so the
/// reconciler can call this on every tick.
pub fn accumulate_pause(
    from: PlaybackState,
    to: PlaybackState,
    pause: PauseState,
    now: DateTime<Utc>,
) -> PauseState {
    match (from.is_paused(), to.is_paused()) {
        (false, true) => PauseState {
            last_paused_at: Some(now),
            ..pause
        },
        (true, false) => PauseState {
            last_paused_at: None,
            paused_duration_ms: pause.paused_duration_ms
                + pause
                    .last_paused_at
                    .map(|paused_at| millis_between(paused_at, now))
                    .unwrap_or(0),
        },
        _ => pause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use playwatch_model::PlaybackState::{Buffering, Paused, Playing};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn pausing_records_the_moment() {
        let next = accumulate_pause(Playing, Paused, PauseState::default(), t0());
        assert_eq!(next.last_paused_at, Some(t0()));
        assert_eq!(next.paused_duration_ms, 0);
    }

    #[test]
    fn resuming_adds_the_pause_length() {
        let paused = PauseState {
            last_paused_at: Some(t0()),
            paused_duration_ms: 5_000,
        };
        let next =
            accumulate_pause(Paused, Playing, paused, t0() + Duration::seconds(30));
        assert_eq!(next.last_paused_at, None);
        assert_eq!(next.paused_duration_ms, 35_000);
    }

    #[test]
    fn buffering_counts_as_playing() {
        let paused = PauseState {
            last_paused_at: Some(t0()),
            paused_duration_ms: 0,
        };
        let next =
            accumulate_pause(Paused, Buffering, paused, t0() + Duration::seconds(2));
        assert_eq!(next.paused_duration_ms, 2_000);

        let unchanged = accumulate_pause(Playing, Buffering, next, t0());
        assert_eq!(unchanged, next);
    }

    #[test]
    fn repeated_states_are_idempotent() {
        let paused = PauseState {
            last_paused_at: Some(t0()),
            paused_duration_ms: 1_000,
        };
        let later = t0() + Duration::minutes(5);
        assert_eq!(accumulate_pause(Paused, Paused, paused, later), paused);
        assert_eq!(
            accumulate_pause(Playing, Playing, PauseState::default(), later),
            PauseState::default()
        );
    }

    #[test]
    fn pause_cycles_sum_their_lengths() {
        let mut state = PauseState::default();
        let mut now = t0();
        let pauses = [10, 45, 120];
        for secs in pauses {
            now += Duration::seconds(60);
            state = accumulate_pause(Playing, Paused, state, now);
            now += Duration::seconds(secs);
            state = accumulate_pause(Paused, Playing, state, now);
        }
        assert_eq!(state.paused_duration_ms, 175_000);
        assert!(state.last_paused_at.is_none());
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let paused = PauseState {
            last_paused_at: Some(t0()),
            paused_duration_ms: 500,
        };
        let next =
            accumulate_pause(Paused, Playing, paused, t0() - Duration::seconds(10));
        assert_eq!(next.paused_duration_ms, 500);
    }
}
