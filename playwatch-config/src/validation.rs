//! Sanity checks run after loading.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::models::PollerConfig;

/// Below this interval the vendor APIs start to feel the polling.
const MIN_RECOMMENDED_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("poll_interval must be greater than zero")]
    ZeroPollInterval,
    #[error("fetch_timeout must be greater than zero")]
    ZeroFetchTimeout,
    #[error("server id '{id}' is configured more than once")]
    DuplicateServerId { id: String },
    #[error("server '{id}' has an empty id or url")]
    MissingServerField { id: String },
    #[error("server '{id}' has an invalid url '{url}'")]
    InvalidServerUrl {
        id: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &PollerConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.poll_interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroPollInterval);
    }
    if config.fetch_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroFetchTimeout);
    }

    let mut seen = HashSet::new();
    for server in &config.servers {
        if server.id.trim().is_empty() || server.url.trim().is_empty() {
            return Err(ConfigGuardRailError::MissingServerField {
                id: server.id.clone(),
            });
        }
        if !seen.insert(server.id.as_str()) {
            return Err(ConfigGuardRailError::DuplicateServerId {
                id: server.id.clone(),
            });
        }
        if let Err(source) = Url::parse(server.url.trim()) {
            return Err(ConfigGuardRailError::InvalidServerUrl {
                id: server.id.clone(),
                url: server.url.clone(),
                source,
            });
        }

        if server.token.trim().is_empty() {
            warnings.push_with_hint(
                format!("server '{}' has no token", server.id),
                "Most servers reject anonymous session listing; set `token`",
            );
        }
        if !server.enabled {
            warnings.push(format!("server '{}' is disabled", server.id));
        }
    }

    if config.enabled_servers().next().is_none() {
        warnings.push_with_hint(
            "no enabled servers configured; the poller has nothing to do",
            "Add a [[servers]] entry with id, type, url and token",
        );
    }

    if config.poll_interval < MIN_RECOMMENDED_INTERVAL {
        warnings.push_with_hint(
            format!(
                "poll_interval of {} is very short",
                humantime::format_duration(config.poll_interval)
            ),
            "Intervals under 5s add server load without improving accuracy much",
        );
    }

    if config.fetch_timeout >= config.poll_interval {
        warnings.push_with_hint(
            "fetch_timeout is not shorter than poll_interval",
            "A slow server will delay its next tick; lower fetch_timeout",
        );
    }

    if config.resume_window.is_zero() {
        warnings.push(
            "resume_window is zero; restarted playback will never be linked to the previous session",
        );
    }

    Ok(warnings)
}
