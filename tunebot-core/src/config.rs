//! config.rs
//!
//! Startup configuration. Secrets and Discord ids come from the environment
//! (a `.env` file is honoured); everything else is passed in by the binary.

use std::path::PathBuf;

use tracing::{debug, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};

use crate::Error;
use crate::coordinator::messages::Locale;

pub const ENV_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const ENV_YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
pub const ENV_GUILD_ID: &str = "GUILD_ID";

/// Non-secret knobs, normally filled from the command line.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub downloads_dir: PathBuf,
    pub yt_dlp_path: PathBuf,
    pub locale: Locale,
    pub register_commands: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            yt_dlp_path: PathBuf::from("yt-dlp"),
            locale: Locale::En,
            register_commands: true,
        }
    }
}

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub youtube_api_key: String,
    pub application_id: Id<ApplicationMarker>,
    pub guild_id: Id<GuildMarker>,
    pub options: RuntimeOptions,
}

// Hand-written so tokens never end up in logs.
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("youtube_api_key", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("options", &self.options)
            .finish()
    }
}

impl BotConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env(options: RuntimeOptions) -> Result<Self, Error> {
        match dotenv::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found; using process environment"),
            Err(e) => warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok(), options)
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, options: RuntimeOptions) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, Error> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(Error::Config(format!("{key} is not set"))),
            }
        };

        let discord_token = required(ENV_BOT_TOKEN)?;
        let youtube_api_key = required(ENV_YOUTUBE_API_KEY)?;
        let application_id = parse_id::<ApplicationMarker>(ENV_CLIENT_ID, &required(ENV_CLIENT_ID)?)?;
        let guild_id = parse_id::<GuildMarker>(ENV_GUILD_ID, &required(ENV_GUILD_ID)?)?;

        Ok(Self {
            discord_token,
            youtube_api_key,
            application_id,
            guild_id,
            options,
        })
    }
}

fn parse_id<T>(key: &str, raw: &str) -> Result<Id<T>, Error> {
    let value: u64 = raw
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a numeric Discord id, got '{raw}'")))?;
    Id::new_checked(value).ok_or_else(|| Error::Config(format!("{key} must be non-zero")))
}
