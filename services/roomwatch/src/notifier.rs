//! Notifier trait for sending live alerts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A live alert to be delivered
#[derive(Debug, Clone)]
pub struct LiveAlert {
    pub display_name: String,
    pub identity: String,
    pub page_url: String,
    /// Resolved stream URL, or the resolver's placeholder when resolution
    /// failed
    pub stream_url: String,
}

/// Record of a dispatched alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub identity: String,
    pub display_name: String,
    pub notifier_type: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp_epoch_ms: u64,
}

/// Trait for delivering alerts
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "discord_webhook")
    fn type_name(&self) -> &str;

    /// Deliver an alert. Errors are caller-visible but never fatal.
    async fn notify(&self, alert: &LiveAlert) -> crate::Result<()>;
}
