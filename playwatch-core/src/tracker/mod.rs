//! Session lifecycle tracking.
//!
//! Every operation here is a free function over explicit inputs: no captured
//! state, no I/O, no error returns. The poll reconciler owns persistence and
//! guarantees that calls for one session arrive in tick order.
//!
//! Timestamps going backwards are clamped: a negative interval contributes
//! zero, it is never subtracted.

pub mod chain;
pub mod completion;
pub mod pause;
pub mod stop;

use chrono::{DateTime, Utc};

pub use chain::{
    ChainCandidate, DEFAULT_RESUME_WINDOW, detect_quality_change,
    resolve_resume_chain,
};
pub use completion::{WATCH_COMPLETION_THRESHOLD, check_watch_completion};
pub use pause::{PauseState, accumulate_pause};
pub use stop::{
    DRIFT_TOLERANCE_MS, StopDuration, StopInputs, calculate_stop_duration,
};

/// Milliseconds from `from` to `to`, never negative.
pub(crate) fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().max(0)
}
