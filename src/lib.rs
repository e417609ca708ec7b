//! clouder-harvest: weekly Beatport-to-Spotify harvest pipeline
//!
//! One invocation processes a single `(ISO week, year, style)` batch:
//! collect the week's catalog releases and tracks, cross-match them against
//! the streaming catalog by ISRC, then create and populate the week's
//! category playlists. All persistence is upsert-by-key on the run's
//! clouder week id, which makes re-runs safe.

pub mod collector;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod week;

pub use error::{Error, Result};
pub use week::WeekWindow;
