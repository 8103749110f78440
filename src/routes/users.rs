// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User document routes: sign-up, fetch, profile edits.

use crate::error::{AppError, Result};
use crate::middleware::{ensure_owner, AuthUser, ValidatedJson};
use crate::models::{ProfileUpdate, User};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{user_id}", get(get_user))
        .route("/api/users/{user_id}/profile", put(update_profile))
}

/// Sign-up body. Missing fields fall back to the token claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Name is too long"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Photo URL is invalid"))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "Bio is too long"))]
    pub bio: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Photo URL is invalid"))]
    pub photo_url: Option<String>,
}

/// Create the caller's user document, or return the existing one.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if let Some(existing) = state.db.get_user(&auth.uid).await? {
        tracing::debug!(uid = %auth.uid, "User already exists");
        return Ok((StatusCode::OK, Json(existing)));
    }

    let user = User::new(
        auth.uid.clone(),
        body.name.or(auth.name),
        body.email.or(auth.email),
        body.photo_url.or(auth.picture),
        Utc::now(),
    );
    state.db.save_user(&user).await?;

    tracing::info!(uid = %auth.uid, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(user))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let update = ProfileUpdate {
        name: body.name,
        bio: body.bio,
        photo_url: body.photo_url,
    };
    let (user, ()) = state
        .db
        .modify(&user_id, |user| {
            user.update_profile(update);
            Ok(())
        })
        .await?;

    tracing::info!(uid = %user_id, "Profile updated");
    Ok(Json(user))
}
