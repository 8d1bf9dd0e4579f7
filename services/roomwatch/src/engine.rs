//! Engine: drives the poll cycle and dispatches alerts

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::config::ApiConfig;
use crate::detector::{evaluate, Decision};
use crate::error::FetchError;
use crate::notifier::{AlertRecord, LiveAlert, Notifier};
use crate::registry::RoomRegistry;
use crate::resolver::StreamResolver;
use crate::room_api::RoomApiClient;
use crate::state::StateHandle;

/// The engine owns the registry and runs the polling loop until cancelled
pub struct Engine {
    registry: RoomRegistry,
    api: RoomApiClient,
    resolver: Arc<dyn StreamResolver>,
    notifiers: Vec<Arc<dyn Notifier>>,
    page_base_url: String,
    poll_interval: Duration,
    evict_after: Option<u32>,
    state: StateHandle,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        registry: RoomRegistry,
        api: RoomApiClient,
        resolver: Arc<dyn StreamResolver>,
        notifiers: Vec<Arc<dyn Notifier>>,
        api_config: &ApiConfig,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            api,
            resolver,
            notifiers,
            page_base_url: api_config.page_base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(api_config.polling_interval_seconds),
            evict_after: api_config.evict_after_consecutive_not_found,
            state,
            cancel,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Run polling cycles until the cancellation token is triggered. The
    /// sleep between cycles is the only suspension point and is cancellable.
    pub async fn run(&mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Polling loop cancelled");
                    break;
                }
            }
        }
    }

    /// One full pass over the registry, in registry order. A room's failure
    /// never aborts the pass for the others.
    pub async fn run_cycle(&mut self) {
        for index in 0..self.registry.len() {
            let identity = self.registry.entry(index).identity.clone();
            if self.registry.entry(index).evicted {
                continue;
            }

            match self.api.fetch(&identity).await {
                Ok(status) => {
                    let now_ms = current_epoch_ms();
                    let entry = self.registry.entry_mut(index);
                    let decision = evaluate(entry.notification_dispatched, status.is_live);
                    entry.apply(&status, decision);
                    let display_name = entry.display_name.clone();

                    tracing::debug!(
                        "Poll '{}': live={} -> {}",
                        identity,
                        status.is_live,
                        decision
                    );

                    self.state
                        .write()
                        .await
                        .update_room(self.registry.entry(index), now_ms);

                    match decision {
                        Decision::Fire => {
                            tracing::info!("{} ({}) is LIVE", display_name, identity);
                            let page_url = format!("{}/{}", self.page_base_url, identity);
                            dispatch_alert(
                                &identity,
                                &display_name,
                                &page_url,
                                &self.resolver,
                                &self.notifiers,
                                &self.state,
                                now_ms,
                            )
                            .await;
                        }
                        Decision::Reset => {
                            tracing::info!("{} ({}) stream ended", display_name, identity);
                        }
                        Decision::Suppress | Decision::Noop => {}
                    }
                }
                Err(FetchError::NotFound) => {
                    // Upstream intermittently returns spurious not-found
                    // codes; state stays untouched and the room is retried
                    // next cycle unless the eviction policy says otherwise.
                    tracing::warn!("Room '{}' reported not found; skipping this cycle", identity);
                    let now_ms = current_epoch_ms();
                    if self.registry.record_not_found(index, self.evict_after) {
                        tracing::warn!(
                            "Evicting room '{}' after {} consecutive not-found responses",
                            identity,
                            self.registry.entry(index).consecutive_not_found
                        );
                        self.state.write().await.mark_evicted(&identity);
                    }
                    self.record_poll_error(&identity, now_ms).await;
                }
                Err(FetchError::Transport(detail)) => {
                    tracing::warn!("Failed to poll room '{}': {}", identity, detail);
                    let now_ms = current_epoch_ms();
                    self.record_poll_error(&identity, now_ms).await;
                }
            }
        }
    }

    async fn record_poll_error(&self, identity: &str, now_ms: u64) {
        let errors = self
            .state
            .write()
            .await
            .record_room_error(identity, now_ms);
        if errors == 5 {
            tracing::warn!("Room '{}' has {} consecutive poll errors", identity, errors);
        }
    }
}

/// Resolve the stream URL and deliver the alert through every notifier.
/// The dedup flag is already committed by the time this runs; delivery
/// failures are recorded but never retried.
pub async fn dispatch_alert(
    identity: &str,
    display_name: &str,
    page_url: &str,
    resolver: &Arc<dyn StreamResolver>,
    notifiers: &[Arc<dyn Notifier>],
    state: &StateHandle,
    now_ms: u64,
) {
    let stream_url = resolver.resolve(identity).await;

    let alert = LiveAlert {
        display_name: display_name.to_string(),
        identity: identity.to_string(),
        page_url: page_url.to_string(),
        stream_url,
    };

    for notifier in notifiers {
        tracing::debug!(
            "Dispatching live alert for '{}' via '{}'",
            identity,
            notifier.type_name()
        );

        let result = notifier.notify(&alert).await;

        if let Err(e) = &result {
            tracing::warn!(
                "Notification via '{}' for '{}' failed: {}",
                notifier.type_name(),
                identity,
                e
            );
        }

        let record = AlertRecord {
            identity: identity.to_string(),
            display_name: display_name.to_string(),
            notifier_type: notifier.type_name().to_string(),
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            timestamp_epoch_ms: now_ms,
        };
        state.write().await.add_alert(record);
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::state::new_state_handle;

    /// A resolver that returns a fixed string
    #[derive(Debug)]
    struct FixedResolver {
        url: String,
    }

    #[async_trait]
    impl StreamResolver for FixedResolver {
        async fn resolve(&self, _identity: &str) -> String {
            self.url.clone()
        }
    }

    /// A test notifier that records received alerts and can fail
    #[derive(Debug)]
    struct RecordingNotifier {
        succeed: bool,
        alerts: Arc<RwLock<Vec<LiveAlert>>>,
    }

    impl RecordingNotifier {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                alerts: Arc::new(RwLock::new(Vec::new())),
            }
        }

        async fn call_count(&self) -> usize {
            self.alerts.read().await.len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn type_name(&self) -> &str {
            "test"
        }

        async fn notify(&self, alert: &LiveAlert) -> crate::Result<()> {
            self.alerts.write().await.push(alert.clone());
            if self.succeed {
                Ok(())
            } else {
                Err(crate::WatchError::Notifier("test failure".to_string()))
            }
        }
    }

    fn resolver(url: &str) -> Arc<dyn StreamResolver> {
        Arc::new(FixedResolver {
            url: url.to_string(),
        })
    }

    #[tokio::test]
    async fn dispatch_delivers_alert_and_records_success() {
        let state = new_state_handle(vec![], 10);
        let notifier = Arc::new(RecordingNotifier::new(true));
        let notifiers: Vec<Arc<dyn Notifier>> = vec![notifier.clone()];

        dispatch_alert(
            "alice_room",
            "Alice",
            "https://page.test/alice_room",
            &resolver("https://cdn.test/a.m3u8"),
            &notifiers,
            &state,
            1000,
        )
        .await;

        assert_eq!(notifier.call_count().await, 1);
        let alerts = notifier.alerts.read().await;
        assert_eq!(alerts[0].display_name, "Alice");
        assert_eq!(alerts[0].page_url, "https://page.test/alice_room");
        assert_eq!(alerts[0].stream_url, "https://cdn.test/a.m3u8");

        let state_lock = state.read().await;
        assert_eq!(state_lock.history.len(), 1);
        assert!(state_lock.history[0].success);
        assert_eq!(state_lock.history[0].identity, "alice_room");
    }

    #[tokio::test]
    async fn dispatch_records_failure_without_retry() {
        let state = new_state_handle(vec![], 10);
        let notifier = Arc::new(RecordingNotifier::new(false));
        let notifiers: Vec<Arc<dyn Notifier>> = vec![notifier.clone()];

        dispatch_alert(
            "alice_room",
            "Alice",
            "https://page.test/alice_room",
            &resolver("https://cdn.test/a.m3u8"),
            &notifiers,
            &state,
            1000,
        )
        .await;

        // exactly one attempt, recorded as failed
        assert_eq!(notifier.call_count().await, 1);
        let state_lock = state.read().await;
        assert_eq!(state_lock.history.len(), 1);
        assert!(!state_lock.history[0].success);
        assert!(state_lock.history[0].error.is_some());
    }

    #[tokio::test]
    async fn dispatch_fans_out_to_all_notifiers() {
        let state = new_state_handle(vec![], 10);
        let first = Arc::new(RecordingNotifier::new(true));
        let second = Arc::new(RecordingNotifier::new(true));
        let notifiers: Vec<Arc<dyn Notifier>> = vec![first.clone(), second.clone()];

        dispatch_alert(
            "alice_room",
            "Alice",
            "https://page.test/alice_room",
            &resolver("https://cdn.test/a.m3u8"),
            &notifiers,
            &state,
            1000,
        )
        .await;

        assert_eq!(first.call_count().await, 1);
        assert_eq!(second.call_count().await, 1);
        assert_eq!(state.read().await.history.len(), 2);
    }

    #[tokio::test]
    async fn dispatch_passes_placeholder_through() {
        let state = new_state_handle(vec![], 10);
        let notifier = Arc::new(RecordingNotifier::new(true));
        let notifiers: Vec<Arc<dyn Notifier>> = vec![notifier.clone()];

        dispatch_alert(
            "alice_room",
            "Alice",
            "https://page.test/alice_room",
            &resolver("stream URL unavailable (no stream URL in page)"),
            &notifiers,
            &state,
            1000,
        )
        .await;

        let alerts = notifier.alerts.read().await;
        assert_eq!(
            alerts[0].stream_url,
            "stream URL unavailable (no stream URL in page)"
        );
    }
}
