//! Roomwatch - live room monitoring and notification service
//!
//! Polls a room status API, detects offline-to-live transitions, and sends
//! at most one notification per live session.

pub mod config;
pub mod dashboard;
pub mod detector;
pub mod discord;
pub mod engine;
pub mod error;
pub mod io;
pub mod notifier;
pub mod registry;
pub mod resolver;
pub mod room_api;
pub mod state;

pub use config::{load_config, Config};
pub use error::{FetchError, Result, WatchError};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::discord::DiscordNotifier;
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::registry::RoomRegistry;
use crate::resolver::{PageStreamResolver, StreamResolver};
use crate::room_api::RoomApiClient;
use crate::state::RoomSnapshot;

/// Run the roomwatch service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let timeout = Duration::from_secs(config.api.timeout_seconds);
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(timeout)?);
    let cancel = CancellationToken::new();

    let api = RoomApiClient::new(&config.api.base_url, Arc::clone(&http));

    // Seed the registry; rooms that fail their initial fetch are dropped here
    let registry = RoomRegistry::initialize(&config.rooms, &config.filters, &api).await?;
    if registry.is_empty() {
        tracing::warn!("No rooms survived initialization; nothing to monitor");
    }

    let resolver: Arc<dyn StreamResolver> = Arc::new(PageStreamResolver::new(
        &config.api.page_base_url,
        Arc::clone(&http),
    ));

    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    for notifier_config in &config.notifiers {
        let notifier: Arc<dyn Notifier> = match notifier_config {
            config::NotifierConfig::DiscordWebhook { .. } => {
                Arc::new(DiscordNotifier::new(notifier_config, Arc::clone(&http)))
            }
        };
        notifiers.push(notifier);
    }

    let snapshots: Vec<RoomSnapshot> = registry.entries().iter().map(RoomSnapshot::seed).collect();
    let state = state::new_state_handle(snapshots, config.dashboard.history_size);

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = Arc::clone(&state);
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    let mut engine = Engine::new(
        registry,
        api,
        resolver,
        notifiers,
        &config.api,
        Arc::clone(&state),
        cancel.clone(),
    );

    tracing::info!("Roomwatch engine started");

    // Run the polling loop (blocks until cancelled)
    engine.run().await;

    tracing::info!("Roomwatch engine stopped");

    Ok(())
}
