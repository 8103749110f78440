// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Topic routes.

use crate::error::Result;
use crate::middleware::{ensure_owner, AuthUser, ValidatedJson};
use crate::models::{Topic, TopicUpdate, User};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/{user_id}/topics", post(create_topic))
        .route(
            "/api/users/{user_id}/topics/{topic_id}",
            put(update_topic).delete(delete_topic),
        )
}

/// Reject strings that are empty after trimming.
pub(crate) fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateTopicRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "Too many tags"))]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 600, message = "Unit length must be 1-600 minutes"))]
    pub unit_minutes: Option<u32>,
}

/// Partial topic update. Send `"deadline": null` to clear the deadline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateTopicRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Name is too long")
    )]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "Too many tags"))]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "binding-generation", ts(optional, type = "string | null"))]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 600, message = "Unit length must be 1-600 minutes"))]
    pub unit_minutes: Option<u32>,
}

async fn create_topic(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateTopicRequest>,
) -> Result<(StatusCode, Json<User>)> {
    ensure_owner(&auth, &user_id)?;

    let topic = Topic::new(
        body.name.trim().to_string(),
        body.tags,
        body.deadline,
        body.unit_minutes,
        Utc::now(),
    );
    let (user, topic_id) = state
        .db
        .modify(&user_id, |user| Ok(user.add_topic(topic, today_utc())))
        .await?;

    tracing::info!(uid = %user_id, topic_id = %topic_id, "Topic created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_topic(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<UpdateTopicRequest>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let update = TopicUpdate {
        name: body.name.map(|name| name.trim().to_string()),
        tags: body.tags,
        deadline: body.deadline,
        unit_minutes: body.unit_minutes,
    };
    let (user, ()) = state
        .db
        .modify(&user_id, |user| user.update_topic(&topic_id, update))
        .await?;

    tracing::info!(uid = %user_id, topic_id = %topic_id, "Topic updated");
    Ok(Json(user))
}

async fn delete_topic(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, topic_id)): Path<(String, String)>,
) -> Result<Json<User>> {
    ensure_owner(&auth, &user_id)?;

    let (user, removed) = state
        .db
        .modify(&user_id, |user| user.delete_topic(&topic_id))
        .await?;

    tracing::info!(
        uid = %user_id,
        topic_id = %topic_id,
        materials = removed.materials.len(),
        "Topic deleted"
    );
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let absent: UpdateTopicRequest = serde_json::from_str(r#"{"name":"Art"}"#).unwrap();
        assert_eq!(absent.deadline, None);

        let cleared: UpdateTopicRequest = serde_json::from_str(r#"{"deadline":null}"#).unwrap();
        assert_eq!(cleared.deadline, Some(None));

        let set: UpdateTopicRequest =
            serde_json::from_str(r#"{"deadline":"2024-09-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(set.deadline, Some(Some(_))));
    }

    #[test]
    fn blank_names_fail_validation() {
        let body: CreateTopicRequest = serde_json::from_str(r#"{"name":"   "}"#).unwrap();
        assert!(body.validate().is_err());

        let body: CreateTopicRequest =
            serde_json::from_str(r#"{"name":"Biology","unitMinutes":0}"#).unwrap();
        assert!(body.validate().is_err());

        let body: CreateTopicRequest =
            serde_json::from_str(r#"{"name":"Biology","tags":["cells"]}"#).unwrap();
        assert!(body.validate().is_ok());
    }
}
