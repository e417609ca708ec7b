//! Error types for clouder-harvest

use thiserror::Error;

/// Common result type for harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the week harvest pipeline
///
/// Construction-time errors (`InvalidStyle`, `WeekOutOfRange`) abort the run
/// before any network call. Persistence errors are fatal to the enclosing
/// stage. Page-level collection failures are handled inside the collector and
/// never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Style id is not present in the style table
    #[error("Style ID {0} is not recognized")]
    InvalidStyle(u32),

    /// Requested week starts outside the requested year
    #[error("Week number {week} is out of bounds for the year {year}")]
    WeekOutOfRange { week: u32, year: i32 },

    /// No playlist record exists for the requested category
    #[error("Playlist not found for '{0}'")]
    PlaylistNotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP transport or status error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document failed a structural requirement (e.g. missing key field)
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Upstream returned a response the client cannot interpret
    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
