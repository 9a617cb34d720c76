//! Core data model definitions shared across Playwatch crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod decision;
pub mod directory;
pub mod media_kind;
pub mod persisted;
pub mod playback;
pub mod server;
pub mod session;

// Intentionally curated re-exports for downstream consumers.
pub use decision::StreamDecision;
pub use directory::{HistoryEntry, MediaLibrary, MediaUser};
pub use media_kind::{
    EpisodeDetails, LiveDetails, MediaDetails, MediaKind, TrackDetails,
};
pub use persisted::PersistedSession;
pub use playback::PlaybackState;
pub use server::ServerType;
pub use session::{
    CanonicalSession, SessionMedia, SessionNetwork, SessionPlayback,
    SessionPlayer, SessionQuality, SessionUser, StreamDetails,
    progress_percent,
};
