use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use songbird::Songbird;
use songbird::shards::TwilightMap;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use crate::Error;
use crate::services::discord::SlashCommandDispatcher;

/// Guild membership plus voice states is all `/play` needs.
pub const INTENTS: Intents = Intents::GUILDS.union(Intents::GUILD_VOICE_STATES);

const SHARD_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache (voice states drive presence lookups)
///   - hands every event to songbird so voice handshakes complete
///   - forwards slash commands to the dispatcher.
async fn shard_runner(
    mut shard: Shard,
    cache: Arc<InMemoryCache>,
    songbird: Arc<Songbird>,
    dispatcher: Arc<SlashCommandDispatcher>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        cache.update(&event);
        songbird.process(&event).await;

        match &event {
            Event::Ready(ready) => {
                let data: &ReadyPayload = ready;
                info!(
                    "Shard {shard_id} => READY as {} (ID={})",
                    data.user.name, data.user.id
                );
            }
            Event::InteractionCreate(interaction) => {
                if let Err(e) = dispatcher.handle_interaction_create(interaction).await {
                    error!("Shard {shard_id} => interaction handling failed: {e:?}");
                }
            }
            Event::GatewayClose(frame) => {
                debug!("Shard {shard_id} => gateway closed: {frame:?}");
            }
            _ => {
                trace!("Shard {shard_id} => unhandled event: {:?}", event.kind());
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Owns the gateway side of the bot: REST client, cache, shards.
///
/// Startup is split in two because songbird needs the shard senders before the
/// shards start running:
///   1. `create_shards` connects and records the senders
///   2. `start` spawns a runner per shard.
pub struct DiscordPlatform {
    pub token: String,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<(u32, MessageSender)>,

    pub http: Arc<HttpClient>,
    pub cache: Arc<InMemoryCache>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );

        let cache = Arc::new(
            InMemoryCache::builder()
                .resource_types(
                    ResourceType::GUILD | ResourceType::CHANNEL | ResourceType::VOICE_STATE,
                )
                .build(),
        );

        Self {
            token,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http,
            cache,
        }
    }

    pub fn http(&self) -> Arc<HttpClient> {
        self.http.clone()
    }

    pub fn cache(&self) -> Arc<InMemoryCache> {
        self.cache.clone()
    }

    /// The bot's own user id, needed by songbird to recognise its voice state.
    pub async fn current_user_id(&self) -> Result<Id<UserMarker>, Error> {
        let user = self
            .http
            .current_user()
            .await
            .map_err(|e| Error::Platform(format!("Error fetching current user: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing current user: {e}")))?;
        Ok(user.id)
    }

    pub async fn create_shards(&mut self) -> Result<Vec<Shard>, Error> {
        if self.token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }

        let config = Config::new(self.token.clone(), INTENTS);
        let shards: Vec<Shard> = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?
            .collect();

        self.shard_senders = shards
            .iter()
            .map(|shard| (shard.id().number(), shard.sender()))
            .collect();
        info!("(DiscordPlatform) Created {} shard(s)", shards.len());
        Ok(shards)
    }

    /// Songbird instance that speaks through our shards.
    pub fn build_songbird(&self, user_id: Id<UserMarker>) -> Arc<Songbird> {
        let senders: HashMap<u32, MessageSender> = self.shard_senders.iter().cloned().collect();
        Arc::new(Songbird::twilight(Arc::new(TwilightMap::new(senders)), user_id))
    }

    pub fn start(
        &mut self,
        shards: Vec<Shard>,
        songbird: Arc<Songbird>,
        dispatcher: Arc<SlashCommandDispatcher>,
    ) {
        for shard in shards {
            let cache_for_shard = self.cache.clone();
            let songbird_for_shard = songbird.clone();
            let dispatcher_for_shard = dispatcher.clone();

            let handle = tokio::spawn(async move {
                shard_runner(shard, cache_for_shard, songbird_for_shard, dispatcher_for_shard)
                    .await;
            });
            self.shard_tasks.push(handle);
        }
    }

    pub async fn disconnect(&mut self) -> Result<(), Error> {
        // Gracefully close shards
        for (_, sender) in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        // Wait for them, but don't hang shutdown on a shard that won't close
        for task in &mut self.shard_tasks {
            match tokio::time::timeout(SHARD_CLOSE_TIMEOUT, &mut *task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("(DiscordPlatform) Shard task ended abnormally: {e}"),
                Err(_) => {
                    warn!("(DiscordPlatform) Shard did not close in time; aborting its task");
                    task.abort();
                }
            }
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();
        Ok(())
    }
}
