use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use spinbot_common::models::{Thresholds, ThresholdsUpdate};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::repositories::csv::DONATIONS_FILE;
use crate::services::CommandOutcome;
use crate::services::donation_service::{DonationsView, GiftSubsView, SpinCommandsView};

/// Sender name used by `/api/test-command` when none is given.
const TEST_COMMAND_USER: &str = "TestMod";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpinRequest {
    pub timestamp: String,
    pub spin_triggered: bool,
}

#[derive(Debug, Deserialize)]
pub struct TestCommandRequest {
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
}

pub async fn get_donations(State(state): State<AppState>) -> Result<Json<DonationsView>, ApiError> {
    Ok(Json(state.donations.donations_view().await?))
}

pub async fn update_donation_spin(
    State(state): State<AppState>,
    payload: Result<Json<UpdateSpinRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    state
        .donations
        .set_donation_spin(&req.timestamp, req.spin_triggered)
        .await?;
    let view = state.donations.donations_view().await?;
    Ok(Json(json!({
        "success": true,
        "donations": view.donations,
        "stats": view.stats,
    })))
}

pub async fn download_donations(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.donations.export_donations_csv().await? {
        Some(bytes) => Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", DONATIONS_FILE),
                ),
            ],
            bytes,
        )
            .into_response()),
        None => Ok((StatusCode::NOT_FOUND, "No donations recorded yet").into_response()),
    }
}

pub async fn get_gift_subs(State(state): State<AppState>) -> Result<Json<GiftSubsView>, ApiError> {
    Ok(Json(state.donations.gift_subs_view().await?))
}

pub async fn update_gift_sub_spin(
    State(state): State<AppState>,
    payload: Result<Json<UpdateSpinRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    state
        .donations
        .set_gift_sub_spin(&req.timestamp, req.spin_triggered)
        .await?;
    let view = state.donations.gift_subs_view().await?;
    Ok(Json(json!({
        "success": true,
        "giftSubs": view.gift_subs,
        "giftSubStats": view.gift_sub_stats,
    })))
}

pub async fn get_spin_commands(
    State(state): State<AppState>,
) -> Result<Json<SpinCommandsView>, ApiError> {
    Ok(Json(state.donations.spin_commands_view().await?))
}

pub async fn get_thresholds(State(state): State<AppState>) -> Json<Thresholds> {
    Json(state.donations.thresholds().current().await)
}

pub async fn update_thresholds(
    State(state): State<AppState>,
    payload: Result<Json<ThresholdsUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(update) = payload?;
    let thresholds = state.donations.thresholds().save(update).await?;
    Ok(Json(json!({
        "success": true,
        "bitThreshold": thresholds.bit_threshold,
        "giftSubThreshold": thresholds.gift_sub_threshold,
    })))
}

/// Runs a line through the moderator chat path, as if a moderator typed it.
pub async fn test_command(
    State(state): State<AppState>,
    payload: Result<Json<TestCommandRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let username = req
        .username
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| TEST_COMMAND_USER.to_string());
    info!("Test command from {}: {}", username, req.message);

    let outcome = state
        .commands
        .handle_chat_message(&username, &req.message, true)
        .await?;

    let body = match outcome {
        CommandOutcome::SpinResolved { resolution, .. } => json!({
            "success": true,
            "outcome": "spin_resolved",
            "resolution": resolution,
        }),
        CommandOutcome::SpinFailed { error, .. } => return Err(error.into()),
        CommandOutcome::SpinAudited(audit) => json!({
            "success": true,
            "outcome": "spin_audited",
            "audit": audit,
        }),
        CommandOutcome::ThresholdsUpdated(thresholds) => json!({
            "success": true,
            "outcome": "thresholds_updated",
            "bitThreshold": thresholds.bit_threshold,
            "giftSubThreshold": thresholds.gift_sub_threshold,
        }),
        CommandOutcome::Rejected(reason) => {
            return Err(crate::Error::InvalidCommandFormat(reason).into());
        }
        CommandOutcome::Ignored => json!({
            "success": true,
            "outcome": "ignored",
        }),
    };
    Ok(Json(body))
}
