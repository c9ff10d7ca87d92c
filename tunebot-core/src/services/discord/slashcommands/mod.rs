// File: tunebot-core/src/services/discord/slashcommands/mod.rs

pub mod play;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};

use tunebot_common::traits::CommandRegistrar;

use crate::Error;
use crate::coordinator::RequestCoordinator;
use crate::platforms::discord::requester::InteractionRequester;
use crate::services::discord::slashcommands::play::{PLAY_COMMAND, create_play_command, query_option};

/// Every command this bot exposes.
pub fn all_commands() -> Vec<Command> {
    vec![create_play_command().build()]
}

/// Replaces the guild's command set with ours. Running it twice leaves one
/// `/play`, not two.
pub async fn register_guild_slash_commands(
    registrar: &dyn CommandRegistrar,
    guild_id: Id<GuildMarker>,
) -> Result<Vec<Command>, Error> {
    info!("Overwriting slash commands for guild {guild_id}");
    let active = registrar.overwrite_guild_commands(guild_id, all_commands()).await?;
    let names: Vec<&str> = active.iter().map(|c| c.name.as_str()).collect();
    info!("Slash commands registered: {}", names.join(", "));
    Ok(active)
}

/// `CommandRegistrar` backed by the Discord REST API (`PUT .../guilds/{id}/commands`).
pub struct HttpCommandRegistrar {
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
}

impl HttpCommandRegistrar {
    pub fn new(http: Arc<HttpClient>, application_id: Id<ApplicationMarker>) -> Self {
        Self { http, application_id }
    }
}

#[async_trait]
impl CommandRegistrar for HttpCommandRegistrar {
    async fn overwrite_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: Vec<Command>,
    ) -> Result<Vec<Command>, Error> {
        let response = self
            .http
            .interaction(self.application_id)
            .set_guild_commands(guild_id, &commands)
            .await
            .map_err(|e| Error::Platform(format!("Failed to register guild slash commands: {e}")))?;

        response
            .models()
            .await
            .map_err(|e| Error::Platform(format!("Failed to read registered commands: {e}")))
    }
}

/// Routes slash-command interactions. `/play` runs on its own task so a long
/// download or song never holds up the shard.
pub struct SlashCommandDispatcher {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    application_id: Id<ApplicationMarker>,
    coordinator: Arc<RequestCoordinator>,
}

impl SlashCommandDispatcher {
    pub fn new(
        http: Arc<HttpClient>,
        cache: Arc<InMemoryCache>,
        application_id: Id<ApplicationMarker>,
        coordinator: Arc<RequestCoordinator>,
    ) -> Self {
        Self {
            http,
            cache,
            application_id,
            coordinator,
        }
    }

    /// Dispatch slash commands from an `InteractionCreate`.
    pub async fn handle_interaction_create(&self, event: &InteractionCreate) -> Result<(), Error> {
        let interaction = &event.0;

        // Only handle ApplicationCommand interactions:
        let Some(InteractionData::ApplicationCommand(cmd_data)) = &interaction.data else {
            debug!("Ignoring non-command interaction {}", interaction.id);
            return Ok(());
        };

        match cmd_data.name.as_str() {
            PLAY_COMMAND => {
                let Some(query) = query_option(cmd_data) else {
                    warn!("/play invoked without a query option");
                    return Ok(());
                };
                let requester = InteractionRequester::new(
                    self.http.clone(),
                    self.cache.clone(),
                    self.application_id,
                    interaction,
                );
                let coordinator = self.coordinator.clone();
                tokio::spawn(async move {
                    coordinator.handle_request(&query, &requester).await;
                });
            }
            other => {
                // For unknown commands, respond with error:
                self.http
                    .interaction(self.application_id)
                    .create_response(
                        interaction.id,
                        &interaction.token,
                        &InteractionResponse {
                            kind: InteractionResponseType::ChannelMessageWithSource,
                            data: Some(InteractionResponseData {
                                content: Some(self.coordinator.locale().unknown_command(other)),
                                ..Default::default()
                            }),
                        },
                    )
                    .await
                    .map_err(|e| {
                        Error::Platform(format!("Error responding to unknown command: {e}"))
                    })?;
            }
        }

        Ok(())
    }
}
