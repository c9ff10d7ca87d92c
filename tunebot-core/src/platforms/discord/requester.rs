// File: tunebot-core/src/platforms/discord/requester.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::trace;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::Interaction;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, GuildMarker, InteractionMarker, UserMarker};

use tunebot_common::traits::Requester;

use crate::Error;

/// Interaction tokens accept follow-ups for 15 minutes. Past this, replies go
/// to the channel as ordinary messages.
pub const FOLLOWUP_WINDOW: Duration = Duration::from_secs(14 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRoute {
    Response,
    Followup,
    ChannelMessage,
}

pub fn reply_route(responded: bool, elapsed: Duration, has_channel: bool) -> ReplyRoute {
    if !responded {
        ReplyRoute::Response
    } else if elapsed >= FOLLOWUP_WINDOW && has_channel {
        ReplyRoute::ChannelMessage
    } else {
        ReplyRoute::Followup
    }
}

/// A slash-command invocation seen from the coordinator's side.
///
/// The first reply answers the interaction itself; anything after that goes
/// out as a follow-up message on the same interaction token, or straight to
/// the channel once the token is about to expire.
pub struct InteractionRequester {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    application_id: Id<ApplicationMarker>,
    interaction_id: Id<InteractionMarker>,
    token: String,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
    user_id: Option<Id<UserMarker>>,
    responded: AtomicBool,
    received_at: Instant,
}

impl InteractionRequester {
    pub fn new(
        http: Arc<HttpClient>,
        cache: Arc<InMemoryCache>,
        application_id: Id<ApplicationMarker>,
        interaction: &Interaction,
    ) -> Self {
        Self {
            http,
            cache,
            application_id,
            interaction_id: interaction.id,
            token: interaction.token.clone(),
            guild_id: interaction.guild_id,
            channel_id: interaction.channel.as_ref().map(|c| c.id),
            user_id: interaction.author_id(),
            responded: AtomicBool::new(false),
            received_at: Instant::now(),
        }
    }
}

#[async_trait]
impl Requester for InteractionRequester {
    fn user_id(&self) -> Option<Id<UserMarker>> {
        self.user_id
    }

    fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.guild_id
    }

    async fn reply(&self, text: &str) -> Result<(), Error> {
        let client = self.http.interaction(self.application_id);
        let responded = self.responded.swap(true, Ordering::SeqCst);

        match reply_route(responded, self.received_at.elapsed(), self.channel_id.is_some()) {
            ReplyRoute::Response => {
                let result = client
                    .create_response(
                        self.interaction_id,
                        &self.token,
                        &InteractionResponse {
                            kind: InteractionResponseType::ChannelMessageWithSource,
                            data: Some(InteractionResponseData {
                                content: Some(text.to_string()),
                                ..Default::default()
                            }),
                        },
                    )
                    .await;
                if let Err(e) = result {
                    // Without an original response there is nothing to follow up on.
                    self.responded.store(false, Ordering::SeqCst);
                    return Err(Error::Platform(format!("Error responding to interaction: {e}")));
                }
            }
            ReplyRoute::Followup => {
                client
                    .create_followup(&self.token)
                    .content(text)
                    .await
                    .map_err(|e| Error::Platform(format!("Error sending follow-up message: {e}")))?;
            }
            ReplyRoute::ChannelMessage => {
                if let Some(channel_id) = self.channel_id {
                    self.http
                        .create_message(channel_id)
                        .content(text)
                        .await
                        .map_err(|e| {
                            Error::Platform(format!("Error posting to channel {channel_id}: {e}"))
                        })?;
                }
            }
        }
        Ok(())
    }

    async fn voice_channel(&self) -> Result<Option<Id<ChannelMarker>>, Error> {
        let (Some(guild_id), Some(user_id)) = (self.guild_id, self.user_id) else {
            return Ok(None);
        };
        let channel = self
            .cache
            .voice_state(user_id, guild_id)
            .map(|state| state.channel_id());
        trace!("voice_state({user_id}, {guild_id}) => {channel:?}");
        Ok(channel)
    }
}
