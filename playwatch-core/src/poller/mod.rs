//! Poll reconciliation: fetch, parse, diff against the store, persist.

pub mod clients;
pub mod inventory;
pub mod memory_store;
pub mod ports;
pub mod reconcile;
pub mod scheduler;

use std::time::Duration;

use crate::tracker::DEFAULT_RESUME_WINDOW;

pub use clients::{
    EmbyClient, JellyfinClient, MediaBrowserClient, PlexClient, ServerConnection,
    build_client,
};
pub use inventory::{ServerInventory, load_inventory};
pub use memory_store::InMemorySessionStore;
pub use ports::{MediaServerClient, SessionStore};
pub use reconcile::{CycleSummary, reconcile_cycle, reconcile_sessions};
pub use scheduler::PollScheduler;

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    /// Upper bound for one vendor fetch; a slower server skips the cycle.
    pub fetch_timeout: Duration,
    pub resume_window: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            resume_window: DEFAULT_RESUME_WINDOW,
        }
    }
}
