// ================================================================
// File: tunebot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Voice error: {0}")]
    Voice(String),
}
