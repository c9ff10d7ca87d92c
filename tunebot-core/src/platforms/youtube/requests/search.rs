// File: tunebot-core/src/platforms/youtube/requests/search.rs

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use tunebot_common::models::SearchHit;
use tunebot_common::traits::VideoSearch;

use crate::Error;
use crate::platforms::youtube::client::YouTubeClient;

/// Response from `GET /youtube/v3/search` (only the fields we read).
#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: ResourceId,
    pub snippet: Option<Snippet>,
}

/// With `type=video` the `videoId` is always present, but the API models it
/// as optional since channels and playlists use other fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Snippet {
    pub title: String,
}

/// Carries the API key. The key must never appear in a URL, since reqwest
/// errors print theirs.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

impl SearchListResponse {
    /// First item that is actually a video.
    pub fn into_best_hit(self) -> Option<SearchHit> {
        self.items.into_iter().find_map(|item| {
            let video_id = item.id.video_id?;
            let title = item
                .snippet
                .map(|s| s.title)
                .unwrap_or_else(|| video_id.clone());
            Some(SearchHit {
                title,
                url: watch_url(&video_id),
            })
        })
    }
}

impl YouTubeClient {
    /// `search.list` restricted to videos.
    pub async fn search_videos(&self, query: &str, max_results: u32) -> Result<SearchListResponse, Error> {
        let url = format!("{}/search", self.api_base());
        let max_results = max_results.to_string();

        let resp = self
            .http_client()
            .get(&url)
            .header(API_KEY_HEADER, self.api_key())
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| Error::Search(format!("Network error: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            warn!("search_videos => status={} body={}", status, body_text);

            return Err(Error::Search(format!(
                "YouTube API error: HTTP {} => {}",
                status, body_text
            )));
        }

        let parsed: SearchListResponse = resp
            .json()
            .await
            .map_err(|e| Error::Search(format!("Error parsing search.list JSON: {}", e.without_url())))?;

        debug!("search_videos('{query}') => {} item(s)", parsed.items.len());
        Ok(parsed)
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Option<SearchHit>, Error> {
        Ok(self.search_videos(query, max_results).await?.into_best_hit())
    }
}
