//! coordinator/mod.rs
//!
//! Takes one `/play` request from submission to a terminal state:
//!
//!   Received -> Classified -> [Resolving] -> Downloading -> CheckingPresence
//!            -> Joining -> Playing -> Completed | Errored
//!
//! Every collaborator fault ends the request with a notice to the requester and
//! a log entry. Nothing is retried and nothing escapes to the caller. Once the
//! audio file exists it is removed on every exit path, before the voice
//! session (if any) is closed.

pub mod classify;
pub mod files;
pub mod messages;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};

use tunebot_common::models::{PlaybackRequest, PlaybackSignal, RequestId, RequestOutcome, SearchHit};
use tunebot_common::traits::{MediaDownloader, Requester, VideoSearch, VoiceSession, VoiceTransport};

use crate::Error;
use classify::{Classification, classify};
use files::{DownloadDir, TempAudioFile, discard_partial};
use messages::Locale;

/// The search service is always asked for a single best match.
pub const SEARCH_RESULT_LIMIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Classified,
    Resolving,
    Downloading,
    CheckingPresence,
    Joining,
    Playing,
    Finished(RequestOutcome),
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Received => write!(f, "received"),
            RequestState::Classified => write!(f, "classified"),
            RequestState::Resolving => write!(f, "resolving"),
            RequestState::Downloading => write!(f, "downloading"),
            RequestState::CheckingPresence => write!(f, "checking-presence"),
            RequestState::Joining => write!(f, "joining"),
            RequestState::Playing => write!(f, "playing"),
            RequestState::Finished(outcome) => write!(f, "finished ({outcome})"),
        }
    }
}

enum Presence {
    Present(Id<GuildMarker>, Id<ChannelMarker>),
    Absent,
}

pub struct RequestCoordinator {
    search: Arc<dyn VideoSearch>,
    downloader: Arc<dyn MediaDownloader>,
    voice: Arc<dyn VoiceTransport>,
    downloads: DownloadDir,
    locale: Locale,
}

impl RequestCoordinator {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        downloader: Arc<dyn MediaDownloader>,
        voice: Arc<dyn VoiceTransport>,
        downloads: DownloadDir,
        locale: Locale,
    ) -> Self {
        Self {
            search,
            downloader,
            voice,
            downloads,
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Runs one request to completion. The returned outcome is for logging and
    /// tests; the requester has already been told.
    pub async fn handle_request(&self, query: &str, requester: &dyn Requester) -> RequestOutcome {
        let mut request = PlaybackRequest::new(query);
        let id = request.id;
        enter(id, RequestState::Received);
        info!("[{id}] Play request from {:?}: '{}'", requester.user_id(), request.query);

        let outcome = self.run(&mut request, requester).await;
        enter(id, RequestState::Finished(outcome));
        outcome
    }

    async fn run(&self, request: &mut PlaybackRequest, requester: &dyn Requester) -> RequestOutcome {
        let id = request.id;

        let classification = classify(&request.query);
        enter(id, RequestState::Classified);

        let url = match classification {
            Classification::DirectLink(url) => {
                debug!("[{id}] Direct link, skipping search");
                self.notify(id, requester, &self.locale.playing_link(&url)).await;
                url
            }
            Classification::SearchNeeded(text) => {
                enter(id, RequestState::Resolving);
                match self.search.search(&text, SEARCH_RESULT_LIMIT).await {
                    Ok(Some(SearchHit { title, url })) => {
                        info!("[{id}] Resolved '{text}' to '{title}' ({url})");
                        self.notify(id, requester, &self.locale.found_video(&title)).await;
                        request.title = Some(title);
                        url
                    }
                    Ok(None) => {
                        info!("[{id}] No search results for '{text}'");
                        self.notify(id, requester, &self.locale.not_found()).await;
                        return RequestOutcome::NotFound;
                    }
                    Err(e) => {
                        error!("[{id}] Search failed for '{text}': {e:?}");
                        self.notify(id, requester, &self.locale.search_error()).await;
                        return RequestOutcome::SearchFailed;
                    }
                }
            }
        };
        request.resolved_url = Some(url);

        enter(id, RequestState::Downloading);
        let file = match self.download(request).await {
            Ok(file) => file,
            Err(e) => {
                error!("[{id}] Download failed: {e:?}");
                self.notify(id, requester, &self.locale.download_error()).await;
                return RequestOutcome::DownloadFailed;
            }
        };
        request.local_file_path = Some(file.path().to_path_buf());

        enter(id, RequestState::CheckingPresence);
        let (guild_id, channel_id) = match self.presence(requester).await {
            Ok(Presence::Present(guild_id, channel_id)) => (guild_id, channel_id),
            Ok(Presence::Absent) => {
                info!("[{id}] Requester is not in a voice channel");
                release_file(id, file).await;
                self.notify(id, requester, &self.locale.join_voice_first()).await;
                return RequestOutcome::Absent;
            }
            Err(e) => {
                error!("[{id}] Voice presence lookup failed: {e:?}");
                release_file(id, file).await;
                self.notify(id, requester, &self.locale.playback_error()).await;
                return RequestOutcome::Errored;
            }
        };

        enter(id, RequestState::Joining);
        let mut session = match self.voice.join(guild_id, channel_id).await {
            Ok(session) => session,
            Err(e) => {
                error!("[{id}] Failed to join voice channel {channel_id} in guild {guild_id}: {e:?}");
                release_file(id, file).await;
                self.notify(id, requester, &self.locale.playback_error()).await;
                return RequestOutcome::Errored;
            }
        };

        enter(id, RequestState::Playing);
        let signal = play_to_end(session.as_mut(), file.path()).await;

        release_file(id, file).await;
        if let Err(e) = session.close().await {
            warn!("[{id}] Failed to close voice session: {e:?}");
        }

        match signal {
            PlaybackSignal::Finished => {
                info!("[{id}] Playback finished");
                self.notify(id, requester, &self.locale.finished(request.display_name())).await;
                RequestOutcome::Completed
            }
            PlaybackSignal::Failed(reason) => {
                error!("[{id}] Playback failed: {reason}");
                self.notify(id, requester, &self.locale.playback_error()).await;
                RequestOutcome::Errored
            }
        }
    }

    async fn download(&self, request: &PlaybackRequest) -> Result<TempAudioFile, Error> {
        let url = request
            .resolved_url
            .as_deref()
            .ok_or_else(|| Error::Download("request has no resolved link".into()))?;

        self.downloads.ensure_exists().await?;
        let target = self.downloads.target_for(request.id);

        match self.downloader.download(url, &target).await {
            Ok(path) => {
                info!("[{}] Downloaded {url} to {}", request.id, path.display());
                Ok(TempAudioFile::new(path))
            }
            Err(e) => {
                discard_partial(&target).await;
                Err(e)
            }
        }
    }

    async fn presence(&self, requester: &dyn Requester) -> Result<Presence, Error> {
        let Some(guild_id) = requester.guild_id() else {
            return Ok(Presence::Absent);
        };
        Ok(match requester.voice_channel().await? {
            Some(channel_id) => Presence::Present(guild_id, channel_id),
            None => Presence::Absent,
        })
    }

    async fn notify(&self, id: RequestId, requester: &dyn Requester, text: &str) {
        if let Err(e) = requester.reply(text).await {
            warn!("[{id}] Could not deliver message to requester: {e:?}");
        }
    }
}

async fn play_to_end(session: &mut dyn VoiceSession, path: &Path) -> PlaybackSignal {
    match session.play(path).await {
        Ok(rx) => rx
            .await
            .unwrap_or_else(|_| PlaybackSignal::Failed("voice session dropped before the track ended".into())),
        Err(e) => PlaybackSignal::Failed(e.to_string()),
    }
}

async fn release_file(id: RequestId, file: TempAudioFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.remove().await {
        warn!("[{id}] Failed to remove {}: {e:?}", path.display());
    }
}

fn enter(id: RequestId, state: RequestState) {
    debug!("[{id}] -> {state}");
}
