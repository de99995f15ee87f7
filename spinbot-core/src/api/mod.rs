//! REST and live-subscriber surface over the tracker services.

pub mod error;
pub mod events;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use axum_server::Handle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::eventbus::EventBus;
use crate::services::{CommandService, DonationService};
use crate::Error;

pub use error::ApiError;

/// How long open SSE connections get to finish once shutdown starts.
const GRACEFUL_SHUTDOWN: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub donations: Arc<DonationService>,
    pub commands: Arc<CommandService>,
    pub event_bus: Arc<EventBus>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/donations", get(routes::get_donations))
        .route("/api/donations/update-spin", post(routes::update_donation_spin))
        .route("/api/donations/download", get(routes::download_donations))
        .route("/api/gift-subs", get(routes::get_gift_subs))
        .route("/api/gift-subs/update-spin", post(routes::update_gift_sub_spin))
        .route("/api/spin-commands", get(routes::get_spin_commands))
        .route("/api/config/thresholds", get(routes::get_thresholds))
        .route("/api/config/update-thresholds", post(routes::update_thresholds))
        .route("/api/test-command", post(routes::test_command))
        .route("/api/events", get(events::events_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves until the event bus shuts down.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Error> {
    let mut shutdown_rx = state.event_bus.shutdown_rx.clone();
    let app = router(state);

    let handle = Handle::new();
    let handle_clone = handle.clone();
    tokio::spawn(async move {
        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
        handle_clone.graceful_shutdown(Some(GRACEFUL_SHUTDOWN));
    });

    info!("HTTP server listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| {
            error!("HTTP server error: {}", e);
            Error::Platform(format!("HTTP server error: {e}"))
        })?;

    info!("HTTP server shut down.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::helpers::setup_test_tracker;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_donations_have_zero_stats() {
        let t = setup_test_tracker().await.unwrap();
        let app = router(t.app_state());
        let (status, body) = call(app, "GET", "/api/donations", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["donations"], json!([]));
        assert_eq!(body["stats"]["topDonator"], "None");
        assert_eq!(body["stats"]["totalBits"], 0);
    }

    #[tokio::test]
    async fn update_spin_round_trip() {
        let t = setup_test_tracker().await.unwrap();
        let rec = t.donations.record_cheer("amy", 20, "hi").await.unwrap();
        let app = router(t.app_state());

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/donations/update-spin",
            Some(json!({"timestamp": rec.timestamp, "spinTriggered": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["success"], true);
        assert_eq!(body["donations"][0]["spinTriggered"], true);
        assert_eq!(body["stats"]["totalSpins"], 1);

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/gift-subs/update-spin",
            Some(json!({"timestamp": "missing", "spinTriggered": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_of(&body)["kind"], "not_found");

        let (status, body) = call(
            app,
            "POST",
            "/api/donations/update-spin",
            Some(json!({"timestamp": rec.timestamp})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["kind"], "validation_error");
    }

    #[tokio::test]
    async fn download_is_404_until_first_cheer() {
        let t = setup_test_tracker().await.unwrap();
        let app = router(t.app_state());
        let (status, _) = call(app.clone(), "GET", "/api/donations/download", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        t.donations.record_cheer("amy", 20, "a, \"b\"").await.unwrap();
        let (status, body) = call(app, "GET", "/api/donations/download", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("\"a, \"\"b\"\"\""));
    }

    #[tokio::test]
    async fn thresholds_can_be_read_and_updated() {
        let t = setup_test_tracker().await.unwrap();
        let app = router(t.app_state());

        let (_, body) = call(app.clone(), "GET", "/api/config/thresholds", None).await;
        assert_eq!(json_of(&body), json!({"bitThreshold": 1000, "giftSubThreshold": 3}));

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/config/update-thresholds",
            Some(json!({"giftSubThreshold": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_of(&body),
            json!({"success": true, "bitThreshold": 1000, "giftSubThreshold": 2})
        );

        let (status, _) = call(app, "POST", "/api/config/update-thresholds", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_command_reports_resolution() {
        let t = setup_test_tracker().await.unwrap();
        t.donations.record_gift_subs("Alice", 1, vec!["x".into()]).await.unwrap();
        let app = router(t.app_state());

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/test-command",
            Some(json!({"message": "!spin @alice", "username": "Mod"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["outcome"], "spin_resolved");
        assert_eq!(body["resolution"]["kind"], "gift_sub");

        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/test-command",
            Some(json!({"message": "!spin @nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_of(&body)["kind"], "no_match_found");

        let (_, body) = call(app, "GET", "/api/spin-commands", None).await;
        let body = json_of(&body);
        assert_eq!(body["spinCommandStats"]["totalCommands"], 2);
        assert_eq!(body["spinCommands"][0]["username"], "TestMod");
    }
}
