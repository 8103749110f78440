// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The Firebase project is taken from the base64-encoded service account
//! (`FIREBASE_SERVICE_ACCOUNT_BASE64`) unless `FIREBASE_PROJECT_ID` overrides it.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::env;

/// Connection pool ceiling for the MongoDB driver.
pub const MONGO_MAX_POOL_SIZE: u32 = 10;

/// Database used when neither the URI nor `MONGODB_DATABASE` names one.
pub const DEFAULT_DATABASE: &str = "studylist";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string
    pub mongodb_uri: String,
    /// Explicit database name (falls back to the URI default)
    pub mongodb_database: Option<String>,
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub client_url: String,
    /// Firebase project ID; the expected `aud` of ID tokens
    pub firebase_project_id: String,

    // --- Secrets ---
    /// Stripe API key (payments are logged only)
    pub stripe_secret_key: Option<String>,
    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<String>,
}

impl Config {
    /// Config for tests: in-memory friendly values, no real secrets.
    pub fn test_default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: Some("studylist-test".to_string()),
            port: 8080,
            client_url: "http://localhost:3000".to_string(),
            firebase_project_id: "studylist-test".to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: Some("whsec_test_secret".to_string()),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let firebase_project_id = match env::var("FIREBASE_PROJECT_ID") {
            Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                let encoded = env::var("FIREBASE_SERVICE_ACCOUNT_BASE64")
                    .map_err(|_| ConfigError::Missing("FIREBASE_SERVICE_ACCOUNT_BASE64"))?;
                project_id_from_service_account(&encoded)?
            }
        };

        Ok(Self {
            mongodb_uri: env::var("MONGODB_URI").map_err(|_| ConfigError::Missing("MONGODB_URI"))?,
            mongodb_database: env::var("MONGODB_DATABASE").ok().filter(|v| !v.is_empty()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            firebase_project_id,
            stripe_secret_key: optional_secret("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional_secret("STRIPE_WEBHOOK_SECRET"),
        })
    }
}

fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

/// Extract `project_id` from a base64-encoded Firebase service account JSON.
pub fn project_id_from_service_account(encoded: &str) -> Result<String, ConfigError> {
    let raw = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::Invalid("FIREBASE_SERVICE_ACCOUNT_BASE64", e.to_string()))?;
    let account: ServiceAccount = serde_json::from_slice(&raw)
        .map_err(|e| ConfigError::Invalid("FIREBASE_SERVICE_ACCOUNT_BASE64", e.to_string()))?;
    Ok(account.project_id)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
