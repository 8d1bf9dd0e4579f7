//! Web dashboard with JSON API endpoints

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

use crate::state::StateHandle;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle) -> Router {
    let dashboard_state = DashboardState { state };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let room_rows: String = state
        .rooms
        .iter()
        .map(|r| {
            let (label, color, bg) = if r.evicted {
                ("Evicted", "#721c24", "#f8d7da")
            } else if r.is_live {
                ("Live", "#155724", "#d4edda")
            } else {
                ("Offline", "#383d41", "#e2e3e5")
            };
            let last_poll = if r.last_poll_epoch_ms == 0 {
                "Never".to_string()
            } else {
                format!(
                    r#"<script>document.write(new Date({}).toLocaleTimeString())</script>"#,
                    r.last_poll_epoch_ms
                )
            };
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">
                        <span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>
                    </td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                r.display_name,
                r.identity,
                color,
                bg,
                label,
                if r.notification_dispatched { "Yes" } else { "No" },
                r.consecutive_errors,
                last_poll
            )
        })
        .collect();

    let history_rows: String = state
        .history
        .iter()
        .rev()
        .map(|h| {
            let status = if h.success { "OK" } else { "Failed" };
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                h.display_name, h.notifier_type, status
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Roomwatch Dashboard</title>
    <meta http-equiv="refresh" content="15">
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Roomwatch Dashboard</h1>
    <section>
        <h2>Rooms</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Name</th>
                    <th style="padding: 0.5rem; text-align: left;">Identity</th>
                    <th style="padding: 0.5rem; text-align: left;">State</th>
                    <th style="padding: 0.5rem; text-align: left;">Notified</th>
                    <th style="padding: 0.5rem; text-align: left;">Errors</th>
                    <th style="padding: 0.5rem; text-align: left;">Last Poll</th>
                </tr>
            </thead>
            <tbody>{room_rows}</tbody>
        </table>
    </section>
    <section>
        <h2>Alert History</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Room</th>
                    <th style="padding: 0.5rem; text-align: left;">Notifier</th>
                    <th style="padding: 0.5rem; text-align: left;">Status</th>
                </tr>
            </thead>
            <tbody>{history_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        room_rows = room_rows,
        history_rows = history_rows,
    );

    Html(html)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    axum::Json(state.rooms.clone())
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let history: Vec<_> = state.history.iter().cloned().collect();
    axum::Json(history)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::notifier::AlertRecord;
    use crate::registry::RoomEntry;
    use crate::state::{new_state_handle, RoomSnapshot};

    fn setup_state() -> StateHandle {
        let entry = RoomEntry {
            identity: "alice_room".to_string(),
            display_name: "Alice".to_string(),
            is_live: false,
            notification_dispatched: false,
            consecutive_not_found: 0,
            evicted: false,
        };
        new_state_handle(vec![RoomSnapshot::seed(&entry)], 10)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = build_router(setup_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_returns_json() {
        let app = build_router(setup_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0]["identity"], "alice_room");
        assert_eq!(json[0]["display_name"], "Alice");
        assert_eq!(json[0]["is_live"], false);
    }

    #[tokio::test]
    async fn history_returns_json() {
        let state = setup_state();
        {
            let mut s = state.write().await;
            s.add_alert(AlertRecord {
                identity: "alice_room".to_string(),
                display_name: "Alice".to_string(),
                notifier_type: "discord_webhook".to_string(),
                success: true,
                error: None,
                timestamp_epoch_ms: 1000,
            });
        }
        let app = build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0]["identity"], "alice_room");
        assert!(json[0]["success"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn index_returns_html() {
        let app = build_router(setup_state());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Roomwatch Dashboard"));
        assert!(html.contains("Alice"));
        assert!(html.contains("Alert History"));
    }

    #[tokio::test]
    async fn status_empty_rooms() {
        let state = new_state_handle(vec![], 10);
        let app = build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(json.is_empty());
    }
}
