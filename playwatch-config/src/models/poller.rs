use anyhow::{Context, anyhow};
use playwatch_core::poller::{PollSettings, ServerConnection};
use playwatch_core::tracker::DEFAULT_RESUME_WINDOW;
use playwatch_model::ServerType;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_PATH_ENV: &str = "PLAYWATCH_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "PLAYWATCH_CONFIG_JSON";

const DEFAULT_CONFIG_LOCATIONS: &[&str] = &[
    "playwatch.toml",
    "playwatch.json",
    "config/playwatch.toml",
    "config/playwatch.json",
];

/// Source that produced the poller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollerConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Poll timing and the media servers to watch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between two fetches of the same server. Lower values catch short
    /// pauses more accurately at the cost of more requests.
    #[serde(with = "humantime_duration")]
    pub poll_interval: Duration,
    /// A server that has not answered within this window skips the cycle.
    #[serde(with = "humantime_duration")]
    pub fetch_timeout: Duration,
    /// How long after a stop a new playback of the same content still counts
    /// as the same viewing.
    #[serde(with = "humantime_duration")]
    pub resume_window: Duration,
    pub servers: Vec<ServerEntry>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        let settings = PollSettings::default();
        Self {
            poll_interval: settings.poll_interval,
            fetch_timeout: settings.fetch_timeout,
            resume_window: DEFAULT_RESUME_WINDOW,
            servers: Vec::new(),
        }
    }
}

/// One media server to poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerEntry {
    /// Stable identifier; partitions stored sessions.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ServerEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn connection(
        &self,
        timeout: Duration,
    ) -> playwatch_core::Result<ServerConnection> {
        ServerConnection::new(&self.id, &self.url, &self.token, timeout)
    }
}

impl PollerConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            poll_interval: self.poll_interval,
            fetch_timeout: self.fetch_timeout,
            resume_window: self.resume_window,
        }
    }

    pub fn enabled_servers(&self) -> impl Iterator<Item = &ServerEntry> {
        self.servers.iter().filter(|server| server.enabled)
    }

    /// Load the configuration using environment variables.
    /// Evaluation order:
    /// 1) `$PLAYWATCH_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$PLAYWATCH_CONFIG_JSON` (inline JSON),
    /// 3) the first existing default location,
    /// 4) defaults if none of the above exist.
    pub fn load_from_env() -> anyhow::Result<(Self, PollerConfigSource)> {
        if let Ok(path_str) = env::var(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, PollerConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_ENV}"))?;
            return Ok((parsed, PollerConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, PollerConfigSource::File(path)));
        }

        Ok((Self::default(), PollerConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read poller config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid poller config {}", path.display())
            }),
            Some("toml") | Some("tml") => toml::from_str(&contents).map_err(|err| {
                anyhow!("invalid poller config {}: {}", path.display(), err)
            }),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // Try TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse poller config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid poller config json: {err}"))
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }
}

/// Durations as humantime strings (`"15s"`, `"1m 30s"`); bare integers are
/// read as seconds.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|err| de::Error::custom(format!("invalid duration '{text}': {err}"))),
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}
