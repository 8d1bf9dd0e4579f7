//! Room status API client

use std::sync::Arc;

use serde::Deserialize;

use crate::error::FetchError;
use crate::io::HttpClient;

/// Normalized status record for one room, produced per fetch
#[derive(Debug, Clone)]
pub struct RoomStatus {
    pub identity: String,
    pub display_name: String,
    pub is_live: bool,
}

/// Raw status payload. Only the fields the detector needs are decoded;
/// the upstream body carries many more.
#[derive(Debug, Deserialize)]
struct RoomStatusPayload {
    #[serde(default)]
    is_live: bool,
    name: Option<String>,
    /// Domain error code embedded in an otherwise successful response
    #[serde(rename = "Code")]
    code: Option<u32>,
}

/// Client for the room status endpoint
pub struct RoomApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for RoomApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RoomApiClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Fetch the current status of one room. No retries; the caller decides
    /// what a failed cycle means.
    pub async fn fetch(&self, identity: &str) -> Result<RoomStatus, FetchError> {
        let url = format!("{}/{}", self.base_url, identity);
        tracing::debug!("Fetching status for '{}' at {}", identity, url);

        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(FetchError::Transport(format!(
                "status endpoint returned {}",
                response.status
            )));
        }

        let payload: RoomStatusPayload = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Transport(format!("undecodable status body: {}", e)))?;

        if payload.code == Some(404) {
            return Err(FetchError::NotFound);
        }

        Ok(RoomStatus {
            identity: identity.to_string(),
            display_name: payload.name.unwrap_or_else(|| "Unknown".to_string()),
            is_live: payload.is_live,
        })
    }
}
