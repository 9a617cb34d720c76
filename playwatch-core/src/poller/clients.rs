//! reqwest adapters for the vendor "current sessions" endpoints.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use playwatch_model::ServerType;
use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::ports::MediaServerClient;
use crate::error::{PlaywatchError, Result};

const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";
const MEDIA_BROWSER_TOKEN_HEADER: &str = "X-Emby-Token";

/// Connection settings shared by every vendor client.
#[derive(Clone)]
pub struct ServerConnection {
    pub id: String,
    pub base_url: Url,
    pub token: String,
    pub timeout: Duration,
}

impl fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConnection")
            .field("id", &self.id)
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServerConnection {
    pub fn new(
        id: impl Into<String>,
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // Without a trailing slash `Url::join` would drop the last path segment
        // of servers mounted under a prefix.
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            id: id.into(),
            base_url,
            token: token.into(),
            timeout,
        })
    }
}

/// The plain GET-JSON plumbing behind each vendor client.
#[derive(Debug, Clone)]
struct JsonEndpoint {
    connection: ServerConnection,
    client: Client,
    token_header: &'static str,
}

impl JsonEndpoint {
    fn new(connection: ServerConnection, token_header: &'static str) -> Result<Self> {
        let client = Client::builder().timeout(connection.timeout).build()?;
        Ok(Self {
            connection,
            client,
            token_header,
        })
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.connection.base_url.join(path.trim_start_matches('/'))?;
        debug!(server = %self.connection.id, %url, "fetching");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(self.token_header, &self.connection.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaywatchError::UnexpectedStatus {
                server: self.connection.id.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Plex Media Server, `GET /status/sessions`.
#[derive(Debug, Clone)]
pub struct PlexClient {
    endpoint: JsonEndpoint,
}

impl PlexClient {
    pub fn new(connection: ServerConnection) -> Result<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new(connection, PLEX_TOKEN_HEADER)?,
        })
    }

}

#[async_trait]
impl MediaServerClient for PlexClient {
    fn server_id(&self) -> &str {
        &self.endpoint.connection.id
    }

    fn server_type(&self) -> ServerType {
        ServerType::Plex
    }

    async fn fetch_sessions(&self) -> Result<Value> {
        self.endpoint.get("status/sessions").await
    }

    async fn fetch_users(&self) -> Result<Value> {
        self.endpoint.get("accounts").await
    }

    async fn fetch_libraries(&self) -> Result<Value> {
        self.endpoint.get("library/sections").await
    }

    async fn fetch_history(&self) -> Result<Option<Value>> {
        Ok(Some(self.endpoint.get("status/sessions/history/all").await?))
    }
}

/// Jellyfin and Emby share the session API they inherited from Media
/// Browser; only the reported [`ServerType`] differs.
#[derive(Debug, Clone)]
pub struct MediaBrowserClient {
    endpoint: JsonEndpoint,
    server_type: ServerType,
}

pub type JellyfinClient = MediaBrowserClient;
pub type EmbyClient = MediaBrowserClient;

impl MediaBrowserClient {
    pub fn jellyfin(connection: ServerConnection) -> Result<Self> {
        Self::new(connection, ServerType::Jellyfin)
    }

    pub fn emby(connection: ServerConnection) -> Result<Self> {
        Self::new(connection, ServerType::Emby)
    }

    fn new(connection: ServerConnection, server_type: ServerType) -> Result<Self> {
        if server_type == ServerType::Plex {
            return Err(PlaywatchError::Config(format!(
                "server {} is a Plex server, not a Media Browser one",
                connection.id
            )));
        }
        Ok(Self {
            endpoint: JsonEndpoint::new(connection, MEDIA_BROWSER_TOKEN_HEADER)?,
            server_type,
        })
    }
}

#[async_trait]
impl MediaServerClient for MediaBrowserClient {
    fn server_id(&self) -> &str {
        &self.endpoint.connection.id
    }

    fn server_type(&self) -> ServerType {
        self.server_type
    }

    async fn fetch_sessions(&self) -> Result<Value> {
        self.endpoint.get("Sessions").await
    }

    async fn fetch_users(&self) -> Result<Value> {
        self.endpoint.get("Users").await
    }

    async fn fetch_libraries(&self) -> Result<Value> {
        self.endpoint.get("Library/VirtualFolders").await
    }
}

/// Build the client matching `server_type`.
pub fn build_client(
    server_type: ServerType,
    connection: ServerConnection,
) -> Result<Box<dyn MediaServerClient>> {
    let client: Box<dyn MediaServerClient> = match server_type {
        ServerType::Plex => Box::new(PlexClient::new(connection)?),
        ServerType::Jellyfin => Box::new(MediaBrowserClient::jellyfin(connection)?),
        ServerType::Emby => Box::new(MediaBrowserClient::emby(connection)?),
    };
    Ok(client)
}
