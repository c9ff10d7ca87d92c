use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use tunebot_core::coordinator::messages::Locale;
use tunebot_core::{BotConfig, RuntimeOptions};

mod context;
use context::BotContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "tunebot")]
#[command(author, version, about = "TuneBot - plays a requested song in your Discord voice channel")]
struct Args {
    /// Working directory for downloaded audio (created on first use)
    #[arg(long, default_value = "downloads")]
    downloads_dir: PathBuf,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Language for messages shown to users: "en" or "ru"
    #[arg(long, default_value = "en")]
    locale: Locale,

    /// Don't overwrite the guild's slash commands at startup
    #[arg(long, default_value = "false")]
    skip_register: bool,
}

impl Args {
    fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            downloads_dir: self.downloads_dir.clone(),
            yt_dlp_path: self.yt_dlp.clone(),
            locale: self.locale,
            register_commands: !self.skip_register,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("tunebot=info".parse().unwrap_or_default())
        .add_directive("tunebot_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(
        "TuneBot starting. downloads_dir={}, yt_dlp={}, locale={}",
        args.downloads_dir.display(),
        args.yt_dlp.display(),
        args.locale
    );

    let config = BotConfig::from_env(args.runtime_options())?;
    let mut ctx = BotContext::new(config).await?;
    ctx.start().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down...");

    ctx.shutdown().await;
    info!("Main finished. Goodbye!");
    Ok(())
}
