use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PollSettings;
use super::ports::{MediaServerClient, SessionStore};
use super::reconcile::{CycleSummary, reconcile_cycle};
use crate::error::Result;

/// Runs one reconciliation loop per server until shut down.
///
/// Each server gets its own task, so a slow server only delays its own
/// ticks. Records of one server are only written by that server's task.
pub struct PollScheduler {
    store: Arc<dyn SessionStore>,
    settings: PollSettings,
    shutdown_token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task_count = self
            .handles
            .try_lock()
            .map(|handles| handles.len())
            .unwrap_or_default();
        f.debug_struct("PollScheduler")
            .field("settings", &self.settings)
            .field("task_count", &task_count)
            .field("shutdown_cancelled", &self.shutdown_token.is_cancelled())
            .finish()
    }
}

impl PollScheduler {
    pub fn new(store: Arc<dyn SessionStore>, settings: PollSettings) -> Self {
        Self {
            store,
            settings,
            shutdown_token: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start polling `client` every `poll_interval`. The first tick fires
    /// immediately.
    pub async fn spawn(&self, client: Arc<dyn MediaServerClient>) {
        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        let shutdown = self.shutdown_token.clone();

        let handle = tokio::spawn(async move {
            let server_id = client.server_id().to_string();
            let mut ticker = tokio::time::interval(settings.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                server = %server_id,
                server_type = %client.server_type(),
                interval = ?settings.poll_interval,
                "poller started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!(server = %server_id, "poller shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let outcome = reconcile_cycle(
                            client.as_ref(),
                            store.as_ref(),
                            &settings,
                            Utc::now(),
                        )
                        .await;
                        log_cycle(&server_id, &outcome);
                    }
                }
            }
        });

        self.handles.lock().await.push(handle);
    }

    /// Run a single cycle for every client concurrently, without spawning
    /// long-lived tasks.
    pub async fn run_once(
        &self,
        clients: &[Arc<dyn MediaServerClient>],
    ) -> Vec<(String, Result<CycleSummary>)> {
        let now = Utc::now();
        let cycles = clients.iter().map(|client| async move {
            let outcome =
                reconcile_cycle(client.as_ref(), self.store.as_ref(), &self.settings, now)
                    .await;
            log_cycle(client.server_id(), &outcome);
            (client.server_id().to_string(), outcome)
        });
        futures::future::join_all(cycles).await
    }

    /// Cancel every poll task and wait for them to finish.
    pub async fn shutdown(&self) {
        info!("stopping pollers");
        self.shutdown_token.cancel();

        let handles = {
            let mut guard = self.handles.lock().await;
            std::mem::take(&mut *guard)
        };

        for mut handle in handles {
            match tokio::time::timeout(self.settings.fetch_timeout * 2, &mut handle)
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("poll task failed: {err:?}"),
                Err(_) => {
                    warn!("poll task timed out during shutdown, aborting");
                    handle.abort();
                }
            }
        }

        info!("all pollers stopped");
    }
}

fn log_cycle(server_id: &str, outcome: &Result<CycleSummary>) {
    match outcome {
        Ok(summary) if summary.is_quiet() => {
            debug!(server = %server_id, observed = summary.observed, "poll cycle complete");
        }
        Ok(summary) => info!(
            server = %server_id,
            observed = summary.observed,
            started = summary.started,
            updated = summary.updated,
            stopped = summary.stopped,
            skipped = summary.skipped,
            "poll cycle complete"
        ),
        Err(err) => warn!(server = %server_id, "poll cycle skipped: {err}"),
    }
}
