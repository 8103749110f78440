// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Material routes: add, complete/uncomplete, progress, delete and reorder.
//!
//! Each handler is one fetch-modify-write of the user document and responds
//! with the full updated document.

use super::topics::not_blank;
use crate::error::{AppError, Result};
use crate::middleware::{ensure_owner, AuthUser, ValidatedJson};
use crate::models::{MaterialDraft, MaterialType, ProgressUpdate, ReorderEntry, User};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

const MAX_READING_TIME: u32 = 100_000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials",
            post(add_material),
        )
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials/reorder",
            put(reorder_materials),
        )
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials/{material_id}",
            delete(delete_material),
        )
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials/{material_id}/complete",
            put(complete_material),
        )
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials/{material_id}/uncomplete",
            put(uncomplete_material),
        )
        .route(
            "/api/users/{user_id}/topics/{topic_id}/materials/{material_id}/progress",
            put(update_progress),
        )
}

// ─── Request Bodies ──────────────────────────────────────────

/// Ratings arrive as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RatingInput {
    Number(i64),
    Text(String),
}

impl RatingInput {
    /// The rating if it is a whole number from 1 to 5.
    pub fn value(&self) -> Option<u8> {
        let raw = match self {
            RatingInput::Number(n) => *n,
            RatingInput::Text(s) => s.trim().parse().ok()?,
        };
        u8::try_from(raw).ok().filter(|r| (1..=5).contains(r))
    }
}

fn valid_rating(rating: &RatingInput) -> std::result::Result<(), ValidationError> {
    match rating.value() {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("rating").with_message("Rating must be 1-5".into())),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddMaterialRequest {
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    #[validate(
        custom(function = "not_blank"),
        length(max = 500, message = "Title is too long")
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048, message = "Favicon URL is too long"))]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "valid_rating"))]
    pub rating: Option<RatingInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = MAX_READING_TIME, message = "Reading time out of range"))]
    pub reading_time: Option<u32>,
}

impl AddMaterialRequest {
    fn into_draft(self) -> MaterialDraft {
        MaterialDraft {
            material_type: self.material_type,
            title: self.title.trim().to_string(),
            url: self.url.filter(|u| !u.trim().is_empty()),
            favicon: self.favicon.filter(|f| !f.trim().is_empty()),
            rating: self.rating.as_ref().and_then(RatingInput::value),
            order: self.order,
            reading_time: self.reading_time,
        }
    }
}

/// Minutes of progress, as stored on a material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressMinutes {
    pub completed: u32,
}

/// Progress change. `completedUnits` wins over `progress` when both are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProgressRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = MAX_READING_TIME, message = "Reading time out of range"))]
    pub reading_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressMinutes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReorderRequest {
    #[validate(length(max = 10_000, message = "Too many materials"))]
    pub materials: Vec<ReorderEntry>,
}

// ─── Handlers ────────────────────────────────────────────────

async fn add_material(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<AddMaterialRequest>,
) -> Result<(StatusCode, Json<User>)> {
    ensure_owner(&auth, &user_id)?;

    let draft = body.into_draft();
    let material_type = draft.material_type;
    let (user, material_id) = state
        .db
        .modify(&user_id, |user| {
            user.add_material(&topic_id, draft, Utc::now(), today_utc())
        })
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        material_id = %material_id,
        material_type = %material_type,
        "Material added"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

async fn complete_material(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id, material_id)): Path<(String, String, String)>,
) -> Result<Json<User>> {
    set_completed(&state, &auth, &user_id, &topic_id, &material_id, true).await
}

async fn uncomplete_material(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id, material_id)): Path<(String, String, String)>,
) -> Result<Json<User>> {
    set_completed(&state, &auth, &user_id, &topic_id, &material_id, false).await
}

async fn set_completed(
    state: &AppState,
    auth: &AuthUser,
    user_id: &str,
    topic_id: &str,
    material_id: &str,
    completed: bool,
) -> Result<Json<User>> {
    ensure_owner(auth, user_id)?;

    let (user, ()) = state
        .db
        .modify(user_id, |user| {
            user.set_material_completed(topic_id, material_id, completed, today_utc())
        })
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        material_id = %material_id,
        completed,
        "Material completion set"
    );
    Ok(Json(user))
}

async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id, material_id)): Path<(String, String, String)>,
    ValidatedJson(body): ValidatedJson<UpdateProgressRequest>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    if body.reading_time.is_none() && body.completed_units.is_none() && body.progress.is_none() {
        return Err(AppError::BadRequest(
            "Expected readingTime, completedUnits or progress".to_string(),
        ));
    }

    let update = ProgressUpdate {
        reading_time: body.reading_time,
        completed_units: body.completed_units,
        completed_minutes: body.progress.map(|p| p.completed),
    };
    let (user, ()) = state
        .db
        .modify(&user_id, |user| {
            user.update_material_progress(&topic_id, &material_id, update, today_utc())
        })
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        material_id = %material_id,
        "Material progress updated"
    );
    Ok(Json(user))
}

async fn delete_material(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id, material_id)): Path<(String, String, String)>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let (user, removed) = state
        .db
        .modify(&user_id, |user| user.delete_material(&topic_id, &material_id))
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        material_id = %material_id,
        title = %removed.title,
        "Material deleted"
    );
    Ok(Json(user))
}

async fn reorder_materials(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<ReorderRequest>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let (user, applied) = state
        .db
        .modify(&user_id, |user| {
            user.reorder_materials(&topic_id, &body.materials)
        })
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        requested = body.materials.len(),
        applied,
        "Materials reordered"
    );
    Ok(Json(user))
}
