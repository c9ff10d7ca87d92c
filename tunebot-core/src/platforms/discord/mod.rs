// File: tunebot-core/src/platforms/discord/mod.rs

pub mod requester;
pub mod runtime;
pub mod songbird;

pub use requester::InteractionRequester;
pub use runtime::DiscordPlatform;
pub use self::songbird::SongbirdManager;
