//! Webhook mode: an HTTP endpoint Telegram posts updates to.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tracing::{debug, error};

use super::dialogue_manager::DialogueManager;
use super::dispatch_update;
use crate::config::WEBHOOK_PATH;

#[derive(Clone)]
struct WebhookState {
    bot: Bot,
    manager: Arc<DialogueManager>,
}

/// `POST /webhook` for updates and `GET /` as a health probe
pub fn router(bot: Bot, manager: Arc<DialogueManager>) -> Router {
    Router::new()
        .route("/", get(health))
        .route(WEBHOOK_PATH, post(receive_update))
        .with_state(WebhookState { bot, manager })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "ai-kitchen-bot" }))
}

fn failure() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error" })),
    )
}

async fn receive_update(
    State(state): State<WebhookState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!(error = %e, body_len = body.len(), "Malformed webhook payload");
            return failure();
        }
    };

    if let UpdateKind::Error(raw) = &update.kind {
        error!(update_id = ?update.id, raw = %raw, "Undecodable update");
        return failure();
    }

    debug!(update_id = ?update.id, "Webhook update received");
    match dispatch_update(state.bot, state.manager, update).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!(error = %e, "Failed to dispatch webhook update");
            failure()
        }
    }
}
