// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StudyList API Server
//!
//! Serves topics, materials, progress and the contribution ledger for
//! Firebase-authenticated users, backed by MongoDB.

use std::sync::Arc;
use studylist::{config::Config, db::UserStore, services::FirebaseVerifier, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting StudyList API");

    let db = UserStore::connect(&config).await?;

    let firebase_verifier = Arc::new(FirebaseVerifier::new(&config)?);

    tracing::info!(
        stripe_api = config.stripe_secret_key.is_some(),
        stripe_webhook = config.stripe_webhook_secret.is_some(),
        "Stripe integration status"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        firebase_verifier,
    });

    let app = studylist::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging, filtered by `RUST_LOG`.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studylist=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
