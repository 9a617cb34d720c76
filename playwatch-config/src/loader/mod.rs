pub mod error;

use std::path::PathBuf;

use tracing::debug;

use crate::models::{PollerConfig, PollerConfigSource};
use crate::validation::{ConfigWarnings, apply_guard_rails};
use error::ConfigLoadError;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: PollerConfig,
    pub source: PollerConfigSource,
    pub warnings: ConfigWarnings,
    pub env_file_loaded: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, resolve the configuration and run the guard rails.
    ///
    /// An explicit config path wins over the environment lookup done by
    /// [`PollerConfig::load_from_env`]. A missing `.env` file is not an
    /// error.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let (config, source) = match &self.options.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfigFile {
                        path: path.clone(),
                    });
                }
                let config = PollerConfig::load_from_file(path)
                    .map_err(ConfigLoadError::Poller)?;
                (config, PollerConfigSource::File(path.clone()))
            }
            None => {
                PollerConfig::load_from_env().map_err(ConfigLoadError::Poller)?
            }
        };

        debug!(?source, servers = config.servers.len(), "poller config resolved");

        let warnings = apply_guard_rails(&config)?;

        Ok(ConfigLoad {
            config,
            source,
            warnings,
            env_file_loaded,
        })
    }
}
