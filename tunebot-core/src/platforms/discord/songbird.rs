//! songbird.rs
//!
//! Voice transport on top of Songbird. Songbird rides the twilight shards for
//! the voice-state handshake, so the runtime feeds it every gateway event.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use songbird::events::context_data::{DisconnectKind, DisconnectReason};
use songbird::input::{File as FileInput, Input};
use songbird::tracks::PlayMode;
use songbird::{CoreEvent, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};

use tunebot_common::models::PlaybackSignal;
use tunebot_common::traits::{VoiceSession, VoiceTransport};

use crate::Error;

/// SongbirdManager hands out one `SongbirdSession` per successful join.
#[derive(Clone)]
pub struct SongbirdManager {
    songbird: Arc<Songbird>,
}

impl SongbirdManager {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        Self { songbird }
    }

    pub fn songbird(&self) -> Arc<Songbird> {
        self.songbird.clone()
    }

    /// Leaves a guild's voice channel, if we are in one.
    pub async fn leave_voice_channel(&self, guild_id: Id<GuildMarker>) -> Result<(), Error> {
        if self.songbird.get(guild_id).is_none() {
            return Ok(());
        }
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| Error::Voice(format!("Failed to leave voice in guild {guild_id}: {e}")))
    }
}

#[async_trait]
impl VoiceTransport for SongbirdManager {
    async fn join(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Box<dyn VoiceSession>, Error> {
        match self.songbird.join(guild_id, channel_id).await {
            Ok(call) => {
                info!("Joined voice channel {channel_id} in guild {guild_id}");
                call.lock().await.add_global_event(
                    Event::Core(CoreEvent::DriverDisconnect),
                    DisconnectLogger { guild_id },
                );
                Ok(Box::new(SongbirdSession {
                    songbird: self.songbird.clone(),
                    guild_id,
                    call,
                    closed: false,
                }))
            }
            Err(e) => {
                // A failed join can leave a half-open Call registered for the guild.
                if let Err(remove_err) = self.songbird.remove(guild_id).await {
                    debug!("No call to tear down after failed join: {remove_err}");
                }
                Err(Error::Voice(format!(
                    "Failed to join channel {channel_id} in guild {guild_id}: {e}"
                )))
            }
        }
    }
}

pub struct SongbirdSession {
    songbird: Arc<Songbird>,
    guild_id: Id<GuildMarker>,
    call: Arc<Mutex<songbird::Call>>,
    closed: bool,
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play(&mut self, path: &Path) -> Result<oneshot::Receiver<PlaybackSignal>, Error> {
        let input: Input = FileInput::new(path.to_path_buf()).into();

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input)
        };

        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));

        handle
            .add_event(
                Event::Track(TrackEvent::End),
                PlaybackNotifier { slot: slot.clone() },
            )
            .map_err(|e| Error::Voice(format!("Could not watch for track end: {e}")))?;
        handle
            .add_event(Event::Track(TrackEvent::Error), PlaybackNotifier { slot })
            .map_err(|e| Error::Voice(format!("Could not watch for track errors: {e}")))?;

        debug!("Started playback of {} in guild {}", path.display(), self.guild_id);
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        {
            let mut call = self.call.lock().await;
            call.stop();
        }
        match self.songbird.remove(self.guild_id).await {
            Ok(()) => {
                info!("Left voice in guild {}", self.guild_id);
                Ok(())
            }
            Err(songbird::error::JoinError::NoCall) => Ok(()),
            Err(e) => Err(Error::Voice(format!("Failed to leave voice: {e}"))),
        }
    }
}

/// Registered for both "end" and "error" on one track. Whichever fires first
/// takes the sender; both detach themselves afterwards.
struct PlaybackNotifier {
    slot: Arc<Mutex<Option<oneshot::Sender<PlaybackSignal>>>>,
}

#[async_trait]
impl VoiceEventHandler for PlaybackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let signal = match ctx {
            EventContext::Track(tracks) => match tracks.first().map(|(state, _)| &state.playing) {
                Some(PlayMode::Errored(e)) => PlaybackSignal::Failed(format!("{e:?}")),
                _ => PlaybackSignal::Finished,
            },
            _ => PlaybackSignal::Finished,
        };

        if let Some(tx) = self.slot.lock().await.take() {
            if tx.send(signal).is_err() {
                warn!("Playback signal dropped: request is no longer waiting");
            }
        }

        Some(Event::Cancel)
    }
}

/// Kicks, channel deletions and dropped voice websockets all land here.
struct DisconnectLogger {
    guild_id: Id<GuildMarker>,
}

#[async_trait]
impl VoiceEventHandler for DisconnectLogger {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            warn!("{}", disconnect_message(self.guild_id, &data.kind, data.reason.as_ref()));
        }
        None
    }
}

fn disconnect_message(
    guild_id: Id<GuildMarker>,
    kind: &DisconnectKind,
    reason: Option<&DisconnectReason>,
) -> String {
    match reason {
        Some(reason) => {
            format!("Voice connection in guild {guild_id} dropped ({kind:?}): {reason:?}")
        }
        None => format!("Voice connection in guild {guild_id} closed ({kind:?})"),
    }
}
