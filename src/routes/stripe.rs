// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stripe webhook receiver. Events are verified and logged; nothing else.

use crate::error::{AppError, Result};
use crate::services::stripe::{verify_signature, StripeEvent};
use crate::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stripe/webhook", post(handle_event))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Verify the `Stripe-Signature` header over the raw body, then log the event.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        tracing::warn!("Stripe webhook received but STRIPE_WEBHOOK_SECRET is not set");
        return Err(AppError::BadRequest(
            "Stripe webhooks are not configured".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    verify_signature(&body, signature, secret, chrono::Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "Security Alert: Stripe signature verification failed");
        AppError::BadRequest("Webhook signature verification failed".to_string())
    })?;

    let event: StripeEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse Stripe event");
        AppError::BadRequest("Invalid Stripe event payload".to_string())
    })?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        livemode = event.livemode,
        "Stripe event received"
    );

    Ok(Json(WebhookAck { received: true }))
}
