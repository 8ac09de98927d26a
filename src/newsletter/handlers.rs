use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::{
    auth::handlers::is_valid_email,
    email::{self, EmailEvent},
    newsletter::repo::Subscription,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

pub fn newsletter_routes() -> Router<AppState> {
    Router::new()
        .route("/newsletter/subscribe", post(subscribe))
        .route("/newsletter/unsubscribe", post(unsubscribe))
}

#[instrument(skip(state, payload))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<Subscription>, (StatusCode, String)> {
    let email_addr = payload.email.trim().to_lowercase();
    if !is_valid_email(&email_addr) {
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let previous = Subscription::find_by_email(&state.db, &email_addr)
        .await
        .unwrap_or(None);

    let subscription = Subscription::activate(&state.db, &email_addr)
        .await
        .map_err(|e| {
            error!(error = %e, "newsletter subscribe failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    // welcome only on a new or reactivated subscription
    let was_active = previous.map(|p| p.active).unwrap_or(false);
    if !was_active {
        email::notify(&state, &subscription.email, EmailEvent::NewsletterWelcome).await;
    }

    info!(email = %subscription.email, "newsletter subscription active");
    Ok(Json(subscription))
}

#[instrument(skip(state, payload))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let email_addr = payload.email.trim().to_lowercase();

    // 200 even when the address was never subscribed
    match Subscription::deactivate(&state.db, &email_addr).await {
        Ok(_) => {
            info!(email = %email_addr, "newsletter unsubscribed");
            Ok(Json(serde_json::json!({ "unsubscribed": true })))
        }
        Err(e) => {
            error!(error = %e, "newsletter unsubscribe failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
