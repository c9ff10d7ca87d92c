// File: tunebot-core/src/platforms/youtube/client.rs

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;

use crate::Error;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Thin wrapper for the YouTube Data API (v3), authenticated by API key.
///
/// One instance is built at startup and shared; reqwest pools connections
/// internally so cloning the inner `Arc` is all callers need.
#[derive(Clone)]
pub struct YouTubeClient {
    http: Arc<ReqwestClient>,
    api_key: String,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str) -> Result<Self, Error> {
        Self::with_base(api_key, DEFAULT_API_BASE)
    }

    /// Same as `new`, against a different API root.
    pub fn with_base(api_key: &str, api_base: &str) -> Result<Self, Error> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http: Arc::new(http),
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn http_client(&self) -> Arc<ReqwestClient> {
        self.http.clone()
    }
}
