use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use playwatch_core::poller::{
    InMemorySessionStore, MediaServerClient, PollScheduler, PollSettings,
    SessionStore, load_inventory, reconcile_cycle, reconcile_sessions,
};
use playwatch_core::{PlaywatchError, Result};
use playwatch_model::{PersistedSession, PlaybackState, ServerType, StreamDecision};
use serde_json::{Value, json};
use tokio::sync::Mutex;

const SERVER: &str = "living-room";
const MINUTE_MS: i64 = 60_000;

/// Serves whatever payload the test last stored; `None` simulates an outage.
struct FakeClient {
    server_type: ServerType,
    payload: Mutex<Option<Value>>,
    delay: Option<Duration>,
}

impl FakeClient {
    fn new(server_type: ServerType) -> Self {
        Self {
            server_type,
            payload: Mutex::new(None),
            delay: None,
        }
    }

    async fn serve(&self, payload: Value) {
        *self.payload.lock().await = Some(payload);
    }

    async fn go_offline(&self) {
        *self.payload.lock().await = None;
    }
}

#[async_trait]
impl MediaServerClient for FakeClient {
    fn server_id(&self) -> &str {
        SERVER
    }

    fn server_type(&self) -> ServerType {
        self.server_type
    }

    async fn fetch_sessions(&self) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.payload
            .lock()
            .await
            .clone()
            .ok_or_else(|| PlaywatchError::UnexpectedStatus {
                server: SERVER.to_string(),
                status: 503,
            })
    }

    async fn fetch_users(&self) -> Result<Value> {
        Ok(match self.server_type {
            ServerType::Plex => json!({"MediaContainer": {"Account": [
                {"id": 0, "name": ""},
                {"id": 1, "name": "owner"},
                {"id": 7, "name": "alice"}
            ]}}),
            _ => json!([{"Id": "u1", "Name": "bob"}]),
        })
    }

    async fn fetch_libraries(&self) -> Result<Value> {
        Ok(match self.server_type {
            ServerType::Plex => json!({"MediaContainer": {"Directory": [
                {"key": "1", "title": "Movies", "type": "movie", "count": 812}
            ]}}),
            _ => json!([{"Name": "Shows", "ItemId": "tv", "CollectionType": "tvshows"}]),
        })
    }

    async fn fetch_history(&self) -> Result<Option<Value>> {
        Ok((self.server_type == ServerType::Plex).then(|| {
            json!({"MediaContainer": {"Metadata": [
                {"ratingKey": "5001", "accountID": 7, "title": "Heat", "type": "movie", "viewedAt": 1_700_000_000}
            ]}})
        }))
    }
}

struct PlexPlay<'a> {
    key: &'a str,
    user: &'a str,
    media: &'a str,
    state: &'a str,
    offset_ms: i64,
}

fn plex_payload(plays: &[PlexPlay<'_>]) -> Value {
    let metadata: Vec<Value> = plays
        .iter()
        .map(|play| {
            json!({
                "sessionKey": play.key,
                "ratingKey": play.media,
                "type": "movie",
                "title": "Heat",
                "duration": 10 * MINUTE_MS,
                "viewOffset": play.offset_ms,
                "User": {"id": play.user, "title": play.user},
                "Player": {
                    "title": "Living Room TV",
                    "state": play.state,
                    "local": true,
                    "address": "192.168.1.20"
                },
                "Media": [{"bitrate": 8000, "Part": [{"decision": "directplay"}]}]
            })
        })
        .collect();
    json!({"MediaContainer": {"size": metadata.len(), "Metadata": metadata}})
}

fn play<'a>(key: &'a str, state: &'a str, offset_ms: i64) -> PlexPlay<'a> {
    PlexPlay {
        key,
        user: "7",
        media: "5001",
        state,
        offset_ms,
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 18, 20, 0, 0).unwrap()
}

fn at(minutes: i64, seconds: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::minutes(minutes) + chrono::Duration::seconds(seconds)
}

#[tokio::test]
async fn full_lifecycle_accounts_for_pauses() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    let summary = reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    assert_eq!(summary.started, 1);

    client.serve(plex_payload(&[play("1", "paused", MINUTE_MS)])).await;
    reconcile_cycle(&client, &store, &settings, at(1, 0)).await.unwrap();

    let paused = store.active_session(SERVER, "1").await.unwrap().unwrap();
    assert_eq!(paused.state, PlaybackState::Paused);
    assert_eq!(paused.last_paused_at, Some(at(1, 0)));

    client.serve(plex_payload(&[play("1", "playing", MINUTE_MS)])).await;
    let summary = reconcile_cycle(&client, &store, &settings, at(3, 0)).await.unwrap();
    assert_eq!(summary.updated, 1);

    client
        .serve(plex_payload(&[play("1", "playing", 8 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(9, 0)).await.unwrap();

    client.serve(plex_payload(&[])).await;
    let summary = reconcile_cycle(&client, &store, &settings, at(10, 0)).await.unwrap();
    assert_eq!(summary.stopped, 1);
    assert!(store.active_sessions(SERVER).await.unwrap().is_empty());

    let record = store.all_sessions(SERVER).await.remove(0);
    assert_eq!(record.stopped_at, Some(at(10, 0)));
    assert_eq!(record.paused_duration_ms, 2 * MINUTE_MS);
    assert_eq!(record.duration_ms, Some(8 * MINUTE_MS));
    assert_eq!(record.last_paused_at, None);
    assert_eq!(record.decision, StreamDecision::DirectPlay);
    assert_eq!(record.bitrate_kbps, 8000);
    // 8 of 10 minutes is below the completion threshold.
    assert!(!record.watched);
}

#[tokio::test]
async fn reaching_the_threshold_marks_watched() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    client
        .serve(plex_payload(&[play("1", "playing", 9 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(9, 0)).await.unwrap();
    client.serve(plex_payload(&[])).await;
    reconcile_cycle(&client, &store, &settings, at(9, 15)).await.unwrap();

    let record = store.all_sessions(SERVER).await.remove(0);
    assert!(record.watched);
    assert_eq!(record.progress_ms, Some(9 * MINUTE_MS));
}

#[tokio::test]
async fn short_gap_resume_chains_to_the_anchor() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client
        .serve(plex_payload(&[play("1", "playing", 2 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    let anchor = store.active_session(SERVER, "1").await.unwrap().unwrap();

    client.serve(plex_payload(&[])).await;
    reconcile_cycle(&client, &store, &settings, at(1, 0)).await.unwrap();

    client
        .serve(plex_payload(&[play("2", "playing", 2 * MINUTE_MS + 5_000)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(1, 30)).await.unwrap();
    let second = store.active_session(SERVER, "2").await.unwrap().unwrap();
    assert_eq!(second.reference_id, Some(anchor.id));

    client.serve(plex_payload(&[])).await;
    reconcile_cycle(&client, &store, &settings, at(2, 0)).await.unwrap();

    client
        .serve(plex_payload(&[play("3", "playing", 3 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(2, 20)).await.unwrap();
    let third = store.active_session(SERVER, "3").await.unwrap().unwrap();
    assert_eq!(third.reference_id, Some(anchor.id));
}

#[tokio::test]
async fn rewind_or_long_gap_starts_a_new_chain() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client
        .serve(plex_payload(&[play("1", "playing", 5 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    client.serve(plex_payload(&[])).await;
    reconcile_cycle(&client, &store, &settings, at(0, 30)).await.unwrap();

    client.serve(plex_payload(&[play("2", "playing", 0)])).await;
    reconcile_cycle(&client, &store, &settings, at(0, 45)).await.unwrap();
    let rewound = store.active_session(SERVER, "2").await.unwrap().unwrap();
    assert_eq!(rewound.reference_id, None);

    client.serve(plex_payload(&[])).await;
    reconcile_cycle(&client, &store, &settings, at(1, 0)).await.unwrap();

    client
        .serve(plex_payload(&[play("3", "playing", 6 * MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(5, 0)).await.unwrap();
    let late = store.active_session(SERVER, "3").await.unwrap().unwrap();
    assert_eq!(late.reference_id, None);
}

#[tokio::test]
async fn new_key_for_active_playback_is_a_quality_change() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client
        .serve(plex_payload(&[play("1", "playing", MINUTE_MS)]))
        .await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    let original = store.active_session(SERVER, "1").await.unwrap().unwrap();

    client
        .serve(plex_payload(&[play("2", "playing", MINUTE_MS + 15_000)]))
        .await;
    let summary = reconcile_cycle(&client, &store, &settings, at(0, 15)).await.unwrap();
    assert_eq!(summary.started, 1);
    assert_eq!(summary.stopped, 1);

    let renegotiated = store.active_session(SERVER, "2").await.unwrap().unwrap();
    assert_eq!(renegotiated.reference_id, Some(original.id));
    let original = store.get(original.id).await.unwrap();
    assert_eq!(original.stopped_at, Some(at(0, 15)));
}

#[tokio::test]
async fn failed_fetch_keeps_sessions_open() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();

    client.go_offline().await;
    let err = reconcile_cycle(&client, &store, &settings, at(0, 15))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaywatchError::UnexpectedStatus { status: 503, .. }));
    assert_eq!(store.active_sessions(SERVER).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_server_times_out() {
    let client = FakeClient {
        delay: Some(Duration::from_secs(30)),
        ..FakeClient::new(ServerType::Plex)
    };
    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    let store = InMemorySessionStore::new();
    let settings = PollSettings {
        fetch_timeout: Duration::from_secs(2),
        ..PollSettings::default()
    };

    let err = reconcile_cycle(&client, &store, &settings, at(0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaywatchError::Timeout { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn out_of_order_tick_is_skipped() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    reconcile_cycle(&client, &store, &settings, at(1, 0)).await.unwrap();

    client.serve(plex_payload(&[play("1", "paused", 30_000)])).await;
    let summary = reconcile_cycle(&client, &store, &settings, at(0, 30)).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.stopped, 0);

    let record = store.active_session(SERVER, "1").await.unwrap().unwrap();
    assert_eq!(record.state, PlaybackState::Playing);
    assert_eq!(record.last_seen_at, at(1, 0));
    assert_eq!(record.progress_ms, Some(0));
}

#[tokio::test]
async fn stale_empty_tick_does_not_stop_newer_session() {
    let client = FakeClient::new(ServerType::Plex);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client.serve(plex_payload(&[play("1", "playing", 0)])).await;
    reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    client.serve(plex_payload(&[play("1", "playing", 300_000)])).await;
    reconcile_cycle(&client, &store, &settings, at(5, 0)).await.unwrap();

    let summary = reconcile_sessions(SERVER, &[], &store, &settings, at(2, 0))
        .await
        .unwrap();
    assert_eq!(summary.stopped, 0);
    assert_eq!(summary.skipped, 1);

    let record = store.active_session(SERVER, "1").await.unwrap().unwrap();
    assert!(record.is_active());
    assert_eq!(record.last_seen_at, at(5, 0));

    let summary = reconcile_sessions(SERVER, &[], &store, &settings, at(6, 0))
        .await
        .unwrap();
    assert_eq!(summary.stopped, 1);
    let stopped = store.all_sessions(SERVER).await;
    assert_eq!(stopped[0].stopped_at, Some(at(6, 0)));
}

#[tokio::test]
async fn jellyfin_idle_players_are_not_sessions() {
    let client = FakeClient::new(ServerType::Jellyfin);
    let store = InMemorySessionStore::new();
    let settings = PollSettings::default();

    client
        .serve(json!([
            {"Id": "idle", "UserId": "u1", "UserName": "bob", "DeviceName": "Phone"},
            {
                "Id": "abc",
                "UserId": "u1",
                "UserName": "bob",
                "DeviceName": "Shield",
                "NowPlayingItem": {
                    "Id": "item-9",
                    "Name": "Pilot",
                    "Type": "Episode",
                    "RunTimeTicks": 26_000_000_000_i64
                },
                "PlayState": {"PositionTicks": 13_000_000_000_i64, "IsPaused": true}
            }
        ]))
        .await;

    let summary = reconcile_cycle(&client, &store, &settings, at(0, 0)).await.unwrap();
    assert_eq!(summary.observed, 1);
    assert_eq!(summary.started, 1);

    let record = store.active_session(SERVER, "abc").await.unwrap().unwrap();
    assert_eq!(record.vendor_session_id.as_deref(), Some("abc"));
    assert_eq!(record.state, PlaybackState::Paused);
    assert_eq!(record.last_paused_at, Some(at(0, 0)));
    assert_eq!(record.progress_ms, Some(1_300_000));
    assert_eq!(record.total_duration_ms, Some(2_600_000));
}

#[tokio::test]
async fn inventory_parses_directory_endpoints() {
    let settings = PollSettings::default();

    let plex = FakeClient::new(ServerType::Plex);
    let inventory = load_inventory(&plex, &settings).await.unwrap();
    let names: Vec<_> = inventory.users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["owner", "alice"]);
    assert!(inventory.users[0].is_admin);
    assert_eq!(inventory.libraries[0].item_count, Some(812));
    assert_eq!(inventory.history.len(), 1);
    assert_eq!(inventory.history[0].user_id, "7");

    let jellyfin = FakeClient::new(ServerType::Jellyfin);
    let inventory = load_inventory(&jellyfin, &settings).await.unwrap();
    assert_eq!(inventory.users.len(), 1);
    assert_eq!(inventory.libraries[0].kind, "tvshows");
    assert!(inventory.history.is_empty());
}

#[tokio::test]
async fn scheduler_runs_one_cycle_per_client() {
    let plex = Arc::new(FakeClient::new(ServerType::Plex));
    plex.serve(plex_payload(&[play("1", "playing", 0)])).await;
    let store = Arc::new(InMemorySessionStore::new());
    let scheduler = PollScheduler::new(store.clone(), PollSettings::default());

    let clients: Vec<Arc<dyn MediaServerClient>> = vec![plex as Arc<dyn MediaServerClient>];
    let results = scheduler.run_once(&clients).await;

    assert_eq!(results.len(), 1);
    let (server, outcome) = &results[0];
    assert_eq!(server, SERVER);
    assert_eq!(outcome.as_ref().unwrap().started, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn scheduler_polls_until_shutdown() {
    let plex = Arc::new(FakeClient::new(ServerType::Plex));
    plex.serve(plex_payload(&[play("1", "playing", 0)])).await;
    let store = Arc::new(InMemorySessionStore::new());
    let settings = PollSettings {
        poll_interval: Duration::from_secs(5),
        ..PollSettings::default()
    };
    let scheduler = PollScheduler::new(store.clone(), settings);

    scheduler.spawn(plex.clone()).await;
    tokio::time::sleep(Duration::from_secs(12)).await;
    scheduler.shutdown().await;

    assert!(scheduler.shutdown_token().is_cancelled());
    let active = store.active_sessions(SERVER).await.unwrap();
    assert_eq!(active.len(), 1);
}

/// Store that never answers, leaving a poll task stuck mid-cycle.
struct StalledStore;

#[async_trait]
impl SessionStore for StalledStore {
    async fn active_session(
        &self,
        _server_id: &str,
        _session_key: &str,
    ) -> Result<Option<PersistedSession>> {
        std::future::pending().await
    }

    async fn active_sessions(&self, _server_id: &str) -> Result<Vec<PersistedSession>> {
        std::future::pending().await
    }

    async fn active_for_user_media(
        &self,
        _server_id: &str,
        _user_id: &str,
        _media_id: &str,
    ) -> Result<Option<PersistedSession>> {
        std::future::pending().await
    }

    async fn latest_stopped_for_user_media(
        &self,
        _server_id: &str,
        _user_id: &str,
        _media_id: &str,
    ) -> Result<Option<PersistedSession>> {
        std::future::pending().await
    }

    async fn upsert(&self, _session: PersistedSession) -> Result<()> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_stuck_pollers() {
    let plex = Arc::new(FakeClient::new(ServerType::Plex));
    plex.serve(plex_payload(&[play("1", "playing", 0)])).await;
    let scheduler = PollScheduler::new(Arc::new(StalledStore), PollSettings::default());

    scheduler.spawn(plex.clone()).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(Arc::strong_count(&plex), 2);

    scheduler.shutdown().await;
    for _ in 0..10 {
        if Arc::strong_count(&plex) == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(Arc::strong_count(&plex), 1);
}
