//! One-off snapshot of a server's accounts, libraries and play history.

use playwatch_model::{HistoryEntry, MediaLibrary, MediaUser};
use tracing::debug;

use super::PollSettings;
use super::ports::MediaServerClient;
use super::reconcile::within_timeout;
use crate::error::Result;
use crate::parsers;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInventory {
    pub users: Vec<MediaUser>,
    pub libraries: Vec<MediaLibrary>,
    /// Empty for servers without a history endpoint.
    pub history: Vec<HistoryEntry>,
}

/// Fetch and parse the directory endpoints of `client`, each request bounded
/// by `fetch_timeout`.
pub async fn load_inventory(
    client: &dyn MediaServerClient,
    settings: &PollSettings,
) -> Result<ServerInventory> {
    let server_id = client.server_id();
    let server_type = client.server_type();
    let timeout = settings.fetch_timeout;

    let users = within_timeout(server_id, timeout, client.fetch_users()).await?;
    let libraries =
        within_timeout(server_id, timeout, client.fetch_libraries()).await?;
    let history = within_timeout(server_id, timeout, client.fetch_history()).await?;

    let inventory = ServerInventory {
        users: parsers::parse_users(server_type, &users),
        libraries: parsers::parse_libraries(server_type, &libraries),
        history: history
            .map(|payload| parsers::parse_history(server_type, &payload))
            .unwrap_or_default(),
    };
    debug!(
        server = %server_id,
        users = inventory.users.len(),
        libraries = inventory.libraries.len(),
        history = inventory.history.len(),
        "inventory loaded"
    );
    Ok(inventory)
}
