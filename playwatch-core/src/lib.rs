//! # Playwatch Core
//!
//! Core library for Playwatch, turning the session lists of Plex, Jellyfin
//! and Emby servers into one vendor-neutral playback timeline.
//!
//! ## Overview
//!
//! - **Parsing**: per-vendor translation of raw JSON into
//!   [`CanonicalSession`](playwatch_model::CanonicalSession)s, plus users,
//!   libraries and history
//! - **Lifecycle tracking**: pause accounting, stop duration with drift
//!   correction, completion detection, resume and quality-change chaining
//! - **Polling**: per-server reconciliation of fetched sessions against a
//!   [`SessionStore`](poller::SessionStore)
//!
//! ## Architecture
//!
//! - [`coerce`]: defensive readers for loosely typed vendor JSON
//! - [`decision`]: vendor transcode vocabulary to
//!   [`StreamDecision`](playwatch_model::StreamDecision)
//! - [`parsers`]: the Plex, Jellyfin and Emby translation layers
//! - [`tracker`]: pure lifecycle functions, no I/O
//! - [`poller`]: ports, reference adapters, the reconciler and the scheduler
//!
//! ## Examples
//!
//! ```
//! use playwatch_core::parsers;
//! use playwatch_model::ServerType;
//! use serde_json::json;
//!
//! let payload = json!({
//!     "MediaContainer": {
//!         "Metadata": [{
//!             "sessionKey": "12",
//!             "ratingKey": "5001",
//!             "type": "movie",
//!             "title": "Heat",
//!             "duration": 10_200_000,
//!             "viewOffset": 5_100_000,
//!             "User": {"id": "1", "title": "alice"},
//!             "Player": {"state": "playing", "local": true, "address": "10.0.0.2"}
//!         }]
//!     }
//! });
//!
//! let sessions = parsers::parse_sessions(ServerType::Plex, &payload);
//! assert_eq!(sessions.len(), 1);
//! assert_eq!(sessions[0].playback.progress_percent, 50);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Typed accessors over untyped JSON
pub mod coerce;

/// Stream decision normalization
pub mod decision;

/// Error types and error handling utilities
pub mod error;

/// Vendor payload parsers
pub mod parsers;

/// Poll loop, its ports and reference adapters
pub mod poller;

/// Session lifecycle calculations
pub mod tracker;

pub use error::{PlaywatchError, Result};
