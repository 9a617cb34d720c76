pub mod poller;

pub use poller::{
    CONFIG_JSON_ENV, CONFIG_PATH_ENV, PollerConfig, PollerConfigSource,
    ServerEntry,
};
