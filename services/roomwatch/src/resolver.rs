//! Best-effort stream URL resolution

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::io::HttpClient;

/// First HLS playlist URL embedded in the room page markup
static HLS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'\\<>]+\.m3u8[^\s"'\\<>]*"#).expect("valid HLS URL pattern")
});

/// Trait for resolving a playable stream URL for a room.
///
/// Resolution is best-effort: implementations return a descriptive
/// placeholder string on failure and never raise past their boundary, so a
/// fire notification is sent either with a real URL or with the
/// placeholder, never withheld.
#[async_trait]
pub trait StreamResolver: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, identity: &str) -> String;
}

/// Builds the placeholder sent in place of a stream URL
pub fn placeholder(reason: &str) -> String {
    format!("stream URL unavailable ({})", reason)
}

/// Resolves stream URLs by scraping the public room page
pub struct PageStreamResolver {
    page_base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PageStreamResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStreamResolver")
            .field("page_base_url", &self.page_base_url)
            .finish()
    }
}

impl PageStreamResolver {
    pub fn new(page_base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            page_base_url: page_base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl StreamResolver for PageStreamResolver {
    async fn resolve(&self, identity: &str) -> String {
        let url = format!("{}/{}", self.page_base_url, identity);
        tracing::debug!("Resolving stream URL for '{}' from {}", identity, url);

        match self.http.get(&url).await {
            Ok(response) if response.is_success() => {
                match HLS_URL_REGEX.find(&response.body) {
                    Some(m) => {
                        tracing::debug!("Resolved stream URL for '{}'", identity);
                        m.as_str().to_string()
                    }
                    None => {
                        tracing::warn!("No stream URL found in page for '{}'", identity);
                        placeholder("no stream URL in page")
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(
                    "Room page for '{}' returned status {}",
                    identity,
                    response.status
                );
                placeholder(&format!("page returned status {}", response.status))
            }
            Err(e) => {
                tracing::warn!("Failed to fetch room page for '{}': {}", identity, e);
                placeholder(&e.to_string())
            }
        }
    }
}
