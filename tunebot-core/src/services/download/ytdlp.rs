// File: tunebot-core/src/services/download/ytdlp.rs

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use tunebot_common::models::DownloadTarget;
use tunebot_common::traits::MediaDownloader;

use crate::Error;
use crate::coordinator::files::AUDIO_EXTENSION;

/// Drives the `yt-dlp` executable: audio only, transcoded to mp3, first item
/// of a playlist only.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: PathBuf,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one download, in the order they are passed.
    pub fn args(url: &str, target: &DownloadTarget) -> Vec<OsString> {
        vec![
            "--extract-audio".into(),
            "--audio-format".into(),
            AUDIO_EXTENSION.into(),
            "--no-warnings".into(),
            "--no-progress".into(),
            "--playlist-items".into(),
            "1".into(),
            "--output".into(),
            target.output_template().into_os_string(),
            // Keeps a link that starts with '-' from being read as an option.
            "--".into(),
            url.into(),
        ]
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, target: &DownloadTarget) -> Result<PathBuf, Error> {
        let expected = target.expected_path(AUDIO_EXTENSION);
        debug!("Spawning {} for {url}", self.program.display());

        let output = Command::new(&self.program)
            .args(Self::args(url, target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Download(format!("could not start {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Download(format!(
                "yt-dlp exited with {} => {}",
                output.status,
                stderr.trim()
            )));
        }

        if !tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Err(Error::Download(format!(
                "yt-dlp reported success but {} is missing",
                expected.display()
            )));
        }

        info!("yt-dlp finished => {}", expected.display());
        Ok(expected)
    }
}
