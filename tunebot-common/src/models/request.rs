// File: tunebot-common/src/models/request.rs

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique per request. Used for log correlation and to name the downloaded file,
/// so two in-flight requests never share a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The single best match returned by the video search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// Where the downloader should put its output.
///
/// `stem` has no extension; the tool picks the extension from the target
/// audio format, which is why `expected_path` takes it as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub dir: PathBuf,
    pub stem: String,
}

impl DownloadTarget {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// yt-dlp style output template, e.g. `downloads/song-<id>.%(ext)s`.
    pub fn output_template(&self) -> PathBuf {
        self.dir.join(format!("{}.%(ext)s", self.stem))
    }

    pub fn expected_path(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, extension))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Transient per-request record. Lives for exactly one trip through the coordinator.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub id: RequestId,
    /// Raw user text: a direct link or free-text search terms.
    pub query: String,
    /// The link that is actually downloaded. Set after classification/search.
    pub resolved_url: Option<String>,
    /// Title reported by the search service, if the query went through search.
    pub title: Option<String>,
    /// Set once the downloader has produced the file.
    pub local_file_path: Option<PathBuf>,
}

impl PlaybackRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            query: query.into(),
            resolved_url: None,
            title: None,
            local_file_path: None,
        }
    }

    /// Title if we have one, otherwise the link we played.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.resolved_url.as_deref())
            .unwrap_or(&self.query)
    }
}

/// Terminal state reached by a request. Diagnostic only: the requester has
/// already been told about it by the time this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    Completed,
    NotFound,
    SearchFailed,
    DownloadFailed,
    Absent,
    Errored,
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestOutcome::Completed => "completed",
            RequestOutcome::NotFound => "not-found",
            RequestOutcome::SearchFailed => "search-failed",
            RequestOutcome::DownloadFailed => "download-failed",
            RequestOutcome::Absent => "absent",
            RequestOutcome::Errored => "errored",
        };
        write!(f, "{s}")
    }
}
