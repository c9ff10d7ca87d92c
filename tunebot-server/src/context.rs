//! tunebot-server/src/context.rs
//!
//! Defines the one process-wide context (BotContext): gateway connection,
//! voice manager, search client and request coordinator, built once at startup
//! and torn down by `shutdown`.

use std::sync::Arc;

use tracing::{error, info, warn};
use twilight_gateway::Shard;

use tunebot_core::coordinator::files::DownloadDir;
use tunebot_core::platforms::discord::{DiscordPlatform, SongbirdManager};
use tunebot_core::platforms::youtube::YouTubeClient;
use tunebot_core::services::YtDlpDownloader;
use tunebot_core::services::discord::{HttpCommandRegistrar, SlashCommandDispatcher, register_guild_slash_commands};
use tunebot_core::{BotConfig, Error, RequestCoordinator};

pub struct BotContext {
    pub config: BotConfig,
    pub platform: DiscordPlatform,
    pub voice: SongbirdManager,
    pub coordinator: Arc<RequestCoordinator>,

    /// Shards are created in `new` (songbird needs their senders) but only
    /// start pulling events in `start`.
    pending_shards: Vec<Shard>,
}

impl BotContext {
    pub async fn new(config: BotConfig) -> Result<Self, Error> {
        let mut platform = DiscordPlatform::new(config.discord_token.clone());

        let bot_user = platform.current_user_id().await?;
        info!("Authenticated to Discord as user {bot_user}");

        let pending_shards = platform.create_shards().await?;
        let voice = SongbirdManager::new(platform.build_songbird(bot_user));

        let search = Arc::new(YouTubeClient::new(&config.youtube_api_key)?);
        let downloader = Arc::new(YtDlpDownloader::new(config.options.yt_dlp_path.clone()));
        let coordinator = Arc::new(RequestCoordinator::new(
            search,
            downloader,
            Arc::new(voice.clone()),
            DownloadDir::new(config.options.downloads_dir.clone()),
            config.options.locale,
        ));

        Ok(Self {
            config,
            platform,
            voice,
            coordinator,
            pending_shards,
        })
    }

    /// Registers `/play` (unless disabled) and starts the shard runners.
    pub async fn start(&mut self) -> Result<(), Error> {
        if self.config.options.register_commands {
            let registrar = HttpCommandRegistrar::new(self.platform.http(), self.config.application_id);
            // The bot still answers with whatever commands Discord already has.
            if let Err(e) = register_guild_slash_commands(&registrar, self.config.guild_id).await {
                error!("Slash command registration failed: {:?}", e);
            }
        } else {
            info!("Skipping slash command registration");
        }

        let shards = std::mem::take(&mut self.pending_shards);
        if shards.is_empty() {
            return Err(Error::Platform("BotContext already started".into()));
        }

        let dispatcher = Arc::new(SlashCommandDispatcher::new(
            self.platform.http(),
            self.platform.cache(),
            self.config.application_id,
            self.coordinator.clone(),
        ));
        self.platform.start(shards, self.voice.songbird(), dispatcher);
        info!("TuneBot is up. Waiting for /play in guild {}", self.config.guild_id);
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        if let Err(e) = self.voice.leave_voice_channel(self.config.guild_id).await {
            warn!("Error leaving voice during shutdown: {:?}", e);
        }
        if let Err(e) = self.platform.disconnect().await {
            error!("Error disconnecting from Discord: {:?}", e);
        }
        info!("Shutdown complete.");
    }
}
