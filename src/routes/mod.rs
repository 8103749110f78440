// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod learning_path;
pub mod materials;
pub mod stripe;
pub mod topics;
pub mod users;

pub use learning_path::LearningPathRequest;
pub use materials::{
    AddMaterialRequest, ProgressMinutes, RatingInput, ReorderRequest, UpdateProgressRequest,
};
pub use topics::{CreateTopicRequest, UpdateTopicRequest};
pub use users::{CreateUserRequest, UpdateProfileRequest};

use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
    })
}

/// True for the configured client origin and local development origins.
fn origin_allowed(origin: &HeaderValue, client_url: &str) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    origin == client_url.trim_end_matches('/') || is_local_origin(origin)
}

/// `http://localhost` or `http://127.0.0.1` on any port, matched on the parsed host.
fn is_local_origin(origin: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(origin) else {
        return false;
    };
    url.scheme() == "http"
        && matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
        && url.origin().ascii_serialization() == origin
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let client_url = state.config.client_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin_allowed(origin, &client_url)
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(stripe::routes());

    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(topics::routes())
        .merge(materials::routes())
        .merge(learning_path::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
