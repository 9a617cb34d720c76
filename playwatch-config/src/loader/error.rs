use crate::validation::ConfigGuardRailError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load poller configuration: {0}")]
    Poller(#[source] anyhow::Error),
    #[error("config file {path} does not exist")]
    MissingConfigFile { path: PathBuf },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
