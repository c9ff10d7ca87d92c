// File: tunebot-common/src/traits/api.rs
//
// The narrow interfaces the request coordinator talks to. Production
// implementations live in tunebot-core; tests swap in fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::oneshot;
use twilight_model::application::command::Command;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use crate::error::Error;
use crate::models::{DownloadTarget, PlaybackSignal, SearchHit};

/// Free-text video search.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Returns the best match, or `Ok(None)` when the service found nothing.
    async fn search(&self, query: &str, max_results: u32) -> Result<Option<SearchHit>, Error>;
}

/// Fetch + transcode to a local audio file.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Audio only, one fixed format, first item of a collection only.
    /// Returns the path of the produced file.
    async fn download(&self, url: &str, target: &DownloadTarget) -> Result<PathBuf, Error>;
}

/// Opens voice sessions.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn join(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Box<dyn VoiceSession>, Error>;
}

/// A joined voice channel, owned by exactly one request.
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Starts streaming `path`. The receiver resolves once, with whichever of
    /// "finished" or "failed" happens first.
    async fn play(&mut self, path: &Path) -> Result<oneshot::Receiver<PlaybackSignal>, Error>;

    /// Leaves the channel. Safe to call after a failed `play`.
    async fn close(&mut self) -> Result<(), Error>;
}

/// The user who issued a command, plus the channel to answer them on.
#[async_trait]
pub trait Requester: Send + Sync {
    fn user_id(&self) -> Option<Id<UserMarker>>;

    fn guild_id(&self) -> Option<Id<GuildMarker>>;

    /// Sends a user-visible message tied to this invocation.
    async fn reply(&self, text: &str) -> Result<(), Error>;

    /// The voice channel the requester currently occupies in this guild, if any.
    async fn voice_channel(&self) -> Result<Option<Id<ChannelMarker>>, Error>;
}

/// Declares slash commands for one guild. Each call replaces the guild's whole
/// command set.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    async fn overwrite_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: Vec<Command>,
    ) -> Result<Vec<Command>, Error>;
}
