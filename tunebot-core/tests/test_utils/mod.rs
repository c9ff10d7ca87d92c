// File: tunebot-core/tests/test_utils/mod.rs
//
// Hand-written stand-ins for the requester and the voice transport. The search
// and download collaborators are mocked with mockall in the test files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use tunebot_common::models::PlaybackSignal;
use tunebot_common::traits::{Requester, VoiceSession, VoiceTransport};
use tunebot_core::Error;

pub const GUILD: u64 = 111;
pub const VOICE_CHANNEL: u64 = 222;
pub const USER: u64 = 333;

/// A requester that records everything it is told.
pub struct RecordingRequester {
    pub guild_id: Option<Id<GuildMarker>>,
    pub user_id: Option<Id<UserMarker>>,
    pub voice_channel: Option<Id<ChannelMarker>>,
    pub presence_fails: bool,
    pub replies: Mutex<Vec<String>>,
}

impl RecordingRequester {
    /// In a guild and sitting in a voice channel.
    pub fn in_voice() -> Self {
        Self {
            guild_id: Some(Id::new(GUILD)),
            user_id: Some(Id::new(USER)),
            voice_channel: Some(Id::new(VOICE_CHANNEL)),
            presence_fails: false,
            replies: Mutex::new(Vec::new()),
        }
    }

    /// In the guild, not in any voice channel.
    pub fn not_in_voice() -> Self {
        Self {
            voice_channel: None,
            ..Self::in_voice()
        }
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Requester for RecordingRequester {
    fn user_id(&self) -> Option<Id<UserMarker>> {
        self.user_id
    }

    fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.guild_id
    }

    async fn reply(&self, text: &str) -> Result<(), Error> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn voice_channel(&self) -> Result<Option<Id<ChannelMarker>>, Error> {
        if self.presence_fails {
            return Err(Error::Platform("cache unavailable".into()));
        }
        Ok(self.voice_channel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayBehavior {
    /// Track ends normally.
    Finish,
    /// Track reports an error.
    Fail,
    /// `play` itself returns an error.
    Refuse,
    /// Session drops the sender without signalling.
    DropSignal,
}

/// Shared counters so tests can inspect what sessions did after the fact.
#[derive(Default)]
pub struct VoiceLog {
    pub joins: AtomicUsize,
    pub closes: AtomicUsize,
    pub played: Mutex<Vec<PathBuf>>,
    /// For each `play`, whether the file existed at that moment.
    pub file_present_at_play: Mutex<Vec<bool>>,
    /// For each `close`, whether the last played file still existed.
    pub file_present_at_close: Mutex<Vec<bool>>,
}

pub struct FakeVoice {
    pub log: Arc<VoiceLog>,
    pub behavior: PlayBehavior,
    pub fail_join: bool,
}

impl FakeVoice {
    pub fn new(behavior: PlayBehavior) -> Self {
        Self {
            log: Arc::new(VoiceLog::default()),
            behavior,
            fail_join: false,
        }
    }

    pub fn failing_join() -> Self {
        Self {
            fail_join: true,
            ..Self::new(PlayBehavior::Finish)
        }
    }

    pub fn joins(&self) -> usize {
        self.log.joins.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.log.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceTransport for FakeVoice {
    async fn join(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Box<dyn VoiceSession>, Error> {
        if self.fail_join {
            return Err(Error::Voice(format!("cannot connect to {channel_id} in {guild_id}")));
        }
        self.log.joins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            log: self.log.clone(),
            behavior: self.behavior,
            last_played: None,
        }))
    }
}

struct FakeSession {
    log: Arc<VoiceLog>,
    behavior: PlayBehavior,
    last_played: Option<PathBuf>,
}

#[async_trait]
impl VoiceSession for FakeSession {
    async fn play(&mut self, path: &Path) -> Result<oneshot::Receiver<PlaybackSignal>, Error> {
        self.log.played.lock().unwrap().push(path.to_path_buf());
        self.log.file_present_at_play.lock().unwrap().push(path.exists());
        self.last_played = Some(path.to_path_buf());

        let (tx, rx) = oneshot::channel();
        match self.behavior {
            PlayBehavior::Finish => {
                let _ = tx.send(PlaybackSignal::Finished);
            }
            PlayBehavior::Fail => {
                let _ = tx.send(PlaybackSignal::Failed("decoder exploded".into()));
            }
            PlayBehavior::Refuse => return Err(Error::Voice("driver not ready".into())),
            PlayBehavior::DropSignal => drop(tx),
        }
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        let present = self.last_played.as_ref().map(|p| p.exists()).unwrap_or(false);
        self.log.file_present_at_close.lock().unwrap().push(present);
        Ok(())
    }
}

/// Number of entries left in a directory (0 if it does not exist).
pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
