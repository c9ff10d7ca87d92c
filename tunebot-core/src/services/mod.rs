// File: tunebot-core/src/services/mod.rs

pub mod discord;
pub mod download;

pub use download::YtDlpDownloader;
