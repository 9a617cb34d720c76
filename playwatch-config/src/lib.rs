//! Configuration library for Playwatch.
//!
//! Resolves the poller configuration from an explicit file, the
//! `PLAYWATCH_CONFIG_PATH` / `PLAYWATCH_CONFIG_JSON` environment variables or
//! a default file location, loads `.env`, and validates the result. Hard
//! mistakes are [`ConfigGuardRailError`]s; questionable values become
//! [`ConfigWarnings`] for the binary to log.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{
    CONFIG_JSON_ENV, CONFIG_PATH_ENV, PollerConfig, PollerConfigSource,
    ServerEntry,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
