//! Discord webhook notifier

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::io::HttpClient;
use crate::notifier::{LiveAlert, Notifier};

/// Sends live alerts to a Discord webhook as two messages: the
/// announcement with the public page link, then the stream URL on its own
/// so it stays copyable.
pub struct DiscordNotifier {
    webhook_url: String,
    username: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("username", &self.username)
            .finish()
    }
}

impl DiscordNotifier {
    pub fn new(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> Self {
        let NotifierConfig::DiscordWebhook {
            webhook_url,
            username,
        } = config;

        tracing::debug!("Created DiscordNotifier with username '{}'", username);

        Self {
            webhook_url: webhook_url.clone(),
            username: username.clone(),
            http,
        }
    }

    async fn post_content(&self, content: &str) -> crate::Result<()> {
        let payload = serde_json::json!({
            "content": content,
            "username": self.username,
        });

        let response = self.http.post_json(&self.webhook_url, &payload).await?;

        if !response.is_success() {
            return Err(crate::WatchError::Notifier(format!(
                "Discord webhook returned status {}: {}",
                response.status, response.body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn type_name(&self) -> &str {
        "discord_webhook"
    }

    async fn notify(&self, alert: &LiveAlert) -> crate::Result<()> {
        let announcement = format!("{} is LIVE!\n{}", alert.display_name, alert.page_url);

        tracing::debug!(
            "Sending Discord announcement for '{}' ({})",
            alert.display_name,
            alert.identity
        );

        self.post_content(&announcement).await?;
        self.post_content(&alert.stream_url).await?;

        tracing::debug!("Discord notification sent successfully");
        Ok(())
    }
}
