// File: tunebot-core/src/services/download/mod.rs

pub mod ytdlp;

pub use ytdlp::YtDlpDownloader;
