use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use playwatch_model::{CanonicalSession, PersistedSession};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PollSettings;
use super::ports::{MediaServerClient, SessionStore};
use crate::error::{PlaywatchError, Result};
use crate::parsers;
use crate::tracker::{
    ChainCandidate, PauseState, StopInputs, accumulate_pause,
    calculate_stop_duration, check_watch_completion, detect_quality_change,
    resolve_resume_chain,
};

/// What one reconciliation pass did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub observed: usize,
    pub started: usize,
    pub updated: usize,
    pub stopped: usize,
    /// Sessions left untouched because `now` was older than their last update.
    pub skipped: usize,
}

impl CycleSummary {
    pub fn is_quiet(&self) -> bool {
        self.started == 0 && self.stopped == 0 && self.skipped == 0
    }
}

/// Fetch one server's sessions and fold them into the store.
///
/// A failed or timed-out fetch leaves the store untouched, so active
/// sessions are not stopped because a server was briefly unreachable.
pub async fn reconcile_cycle(
    client: &dyn MediaServerClient,
    store: &dyn SessionStore,
    settings: &PollSettings,
    now: DateTime<Utc>,
) -> Result<CycleSummary> {
    let server_id = client.server_id();
    let payload =
        within_timeout(server_id, settings.fetch_timeout, client.fetch_sessions())
            .await?;

    let sessions = parsers::parse_sessions(client.server_type(), &payload);
    reconcile_sessions(server_id, &sessions, store, settings, now).await
}

/// Bound one vendor request by `after`.
pub(super) async fn within_timeout<T>(
    server_id: &str,
    after: Duration,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, request).await {
        Ok(result) => result,
        Err(_) => Err(PlaywatchError::Timeout {
            server: server_id.to_string(),
            after,
        }),
    }
}

/// Diff already-parsed sessions against the active records of `server_id`.
pub async fn reconcile_sessions(
    server_id: &str,
    sessions: &[CanonicalSession],
    store: &dyn SessionStore,
    settings: &PollSettings,
    now: DateTime<Utc>,
) -> Result<CycleSummary> {
    let mut summary = CycleSummary {
        observed: sessions.len(),
        ..CycleSummary::default()
    };
    let mut seen: HashSet<&str> = HashSet::with_capacity(sessions.len());

    for session in sessions {
        if !seen.insert(session.session_key.as_str()) {
            debug!(server = %server_id, session_key = %session.session_key, "duplicate session key in payload");
            continue;
        }

        match store.active_session(server_id, &session.session_key).await? {
            Some(record) if now < record.last_seen_at => {
                warn!(
                    server = %server_id,
                    session_key = %session.session_key,
                    last_seen_at = %record.last_seen_at,
                    %now,
                    "poll timestamp is older than the last update, skipping"
                );
                summary.skipped += 1;
            }
            Some(record) => {
                store.upsert(apply_observation(record, session, now)).await?;
                summary.updated += 1;
            }
            None => {
                let reference_id =
                    resolve_reference(server_id, session, store, settings, now)
                        .await?;
                let record =
                    PersistedSession::start(server_id, session, now, reference_id);
                info!(
                    server = %server_id,
                    session_key = %record.session_key,
                    user = %record.user_name,
                    title = %record.media_title,
                    kind = %record.media_kind,
                    decision = %record.decision,
                    reference_id = ?record.reference_id,
                    "session started"
                );
                store.upsert(record).await?;
                summary.started += 1;
            }
        }
    }

    for record in store.active_sessions(server_id).await? {
        if seen.contains(record.session_key.as_str()) {
            continue;
        }
        if now < record.last_seen_at {
            warn!(
                server = %server_id,
                session_key = %record.session_key,
                last_seen_at = %record.last_seen_at,
                %now,
                "poll timestamp is older than the last update, not stopping"
            );
            summary.skipped += 1;
            continue;
        }
        let record = finalize(record, now);
        info!(
            server = %server_id,
            session_key = %record.session_key,
            user = %record.user_name,
            title = %record.media_title,
            duration_ms = record.duration_ms.unwrap_or_default(),
            paused_ms = record.paused_duration_ms,
            watched = record.watched,
            "session stopped"
        );
        store.upsert(record).await?;
        summary.stopped += 1;
    }

    Ok(summary)
}

/// Chain anchor for a session key seen for the first time: a renegotiated
/// stream of a still-active record wins over a resume after a short stop.
async fn resolve_reference(
    server_id: &str,
    session: &CanonicalSession,
    store: &dyn SessionStore,
    settings: &PollSettings,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>> {
    let active = store
        .active_for_user_media(server_id, &session.user.id, &session.media_id)
        .await?;
    if let Some(anchor) =
        detect_quality_change(active.as_ref().map(ChainCandidate::from).as_ref())
    {
        debug!(server = %server_id, session_key = %session.session_key, %anchor, "quality change");
        return Ok(Some(anchor));
    }

    let previous = store
        .latest_stopped_for_user_media(server_id, &session.user.id, &session.media_id)
        .await?;
    Ok(previous.and_then(|previous| {
        resolve_resume_chain(
            &ChainCandidate::from(&previous),
            session.playback.position_ms,
            now,
            settings.resume_window,
        )
    }))
}

fn apply_observation(
    mut record: PersistedSession,
    session: &CanonicalSession,
    now: DateTime<Utc>,
) -> PersistedSession {
    let next_state = session.playback.state;
    if next_state != record.state {
        debug!(
            session_key = %record.session_key,
            from = %record.state,
            to = %next_state,
            "playback state changed"
        );
    }

    let pause = accumulate_pause(
        record.state,
        next_state,
        PauseState::from(&record),
        now,
    );
    record.last_paused_at = pause.last_paused_at;
    record.paused_duration_ms = pause.paused_duration_ms;
    record.state = next_state;

    record.progress_ms = Some(session.playback.position_ms);
    if session.media.duration_ms > 0 {
        record.total_duration_ms = Some(session.media.duration_ms);
    }
    record.decision = session.quality.decision;
    record.bitrate_kbps = session.quality.bitrate_kbps;
    record.ip_address.clone_from(&session.network.ip_address);
    record.last_seen_at = now;
    record
}

fn finalize(mut record: PersistedSession, stopped_at: DateTime<Utc>) -> PersistedSession {
    let stop = calculate_stop_duration(&StopInputs::from(&record), stopped_at);
    record.stopped_at = Some(stopped_at);
    record.duration_ms = Some(stop.duration_ms);
    record.paused_duration_ms = stop.final_paused_duration_ms;
    record.last_paused_at = None;
    record.watched = check_watch_completion(record.progress_ms, record.total_duration_ms);
    record
}
