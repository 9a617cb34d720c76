/// Fraction of the runtime a play must reach to count as watched.
///
/// Older fixtures used 0.80; 0.85 is the production value.
pub const WATCH_COMPLETION_THRESHOLD: f64 = 0.85;

/// `true` when the last position covers at least
/// [`WATCH_COMPLETION_THRESHOLD`] of the runtime. Missing inputs or a
/// non-positive runtime are never complete.
pub fn check_watch_completion(
    progress_ms: Option<i64>,
    total_duration_ms: Option<i64>,
) -> bool {
    match (progress_ms, total_duration_ms) {
        (Some(progress), Some(total)) if total > 0 => {
            progress as f64 / total as f64 >= WATCH_COMPLETION_THRESHOLD
        }
        _ => false,
    }
}
