// File: tunebot-common/src/traits/mod.rs
pub mod api;

pub use api::{CommandRegistrar, MediaDownloader, Requester, VideoSearch, VoiceSession, VoiceTransport};
