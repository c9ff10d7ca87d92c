// File: tunebot-core/src/coordinator/files.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use tunebot_common::models::{DownloadTarget, RequestId};

use crate::Error;

/// Extension of the format the downloader transcodes to.
pub const AUDIO_EXTENSION: &str = "mp3";

/// The process-wide working directory for downloaded audio.
#[derive(Debug, Clone)]
pub struct DownloadDir {
    root: PathBuf,
}

impl DownloadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates the directory if it is missing. Concurrent callers are fine.
    pub async fn ensure_exists(&self) -> Result<(), Error> {
        if tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.root).await?;
        info!("Created downloads directory at {}", self.root.display());
        Ok(())
    }

    pub fn target_for(&self, id: RequestId) -> DownloadTarget {
        DownloadTarget::new(self.root.clone(), format!("song-{id}"))
    }
}

/// Ownership token for one request's audio file.
///
/// `remove` consumes the token, so a file is deleted at most once. A token that
/// is dropped without `remove` still deletes the file, synchronously.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    armed: bool,
}

impl TempAudioFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file. A file that is already gone counts as removed.
    pub async fn remove(mut self) -> Result<(), Error> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {} on drop", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {} on drop: {e}", self.path.display()),
        }
    }
}

/// Best-effort removal of whatever a failed download left behind for `target`.
pub async fn discard_partial(target: &DownloadTarget) {
    let mut entries = match tokio::fs::read_dir(target.dir()).await {
        Ok(entries) => entries,
        Err(_) => return,
    };
    let prefix = format!("{}.", target.stem);
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                warn!("Could not discard partial download {}: {e}", entry.path().display());
            }
        }
    }
}
