// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learning path diagram storage. Nodes and edges are opaque to the server.

use crate::error::{AppError, Result};
use crate::middleware::{ensure_owner, AuthUser, ValidatedJson};
use crate::models::{LearningPath, User};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_ELEMENTS: u64 = 5_000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/users/{user_id}/topics/{topic_id}/learning-path",
        get(get_learning_path).post(save_learning_path),
    )
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LearningPathRequest {
    #[serde(default)]
    #[validate(length(max = MAX_ELEMENTS, message = "Too many nodes"))]
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<unknown>"))]
    pub nodes: Vec<serde_json::Value>,
    #[serde(default)]
    #[validate(length(max = MAX_ELEMENTS, message = "Too many edges"))]
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<unknown>"))]
    pub edges: Vec<serde_json::Value>,
}

/// Stored path, or an empty one when the topic has none.
async fn get_learning_path(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
) -> Result<Json<LearningPath>> {
    ensure_owner(&auth, &user_id)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    let path = user.topic(&topic_id)?.learning_path.clone().unwrap_or_default();

    Ok(Json(path))
}

async fn save_learning_path(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<LearningPathRequest>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let path = LearningPath {
        nodes: body.nodes,
        edges: body.edges,
    };
    let (nodes, edges) = (path.nodes.len(), path.edges.len());
    let (user, ()) = state
        .db
        .modify(&user_id, |user| user.set_learning_path(&topic_id, path))
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        nodes,
        edges,
        "Learning path saved"
    );
    Ok(Json(user))
}
