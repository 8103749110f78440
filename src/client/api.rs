// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the StudyList API.
//!
//! Every mutating call returns the full user document, which becomes the
//! client's confirmed state.

use crate::models::{LearningPath, User};
use crate::routes::{
    AddMaterialRequest, CreateTopicRequest, CreateUserRequest, LearningPathRequest,
    ReorderRequest, UpdateProfileRequest, UpdateProgressRequest, UpdateTopicRequest,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Broad classes of API failure, by HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400: the request was rejected as invalid
    Validation,
    /// 401/403: the caller should sign in again
    Auth,
    /// 404
    NotFound,
    /// 5xx
    Server,
    /// The request never got an HTTP response
    Network,
    /// Any other status, or an unreadable success body
    Unexpected,
}

impl ApiErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => ApiErrorKind::Validation,
            401 | 403 => ApiErrorKind::Auth,
            404 => ApiErrorKind::NotFound,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Unexpected,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?} error: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    fn network(err: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            message: err.to_string(),
        }
    }

    /// The caller's credentials were refused.
    pub fn requires_reauth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }
}

/// Server error envelope, as far as the client cares.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    details: Option<String>,
    error: Option<String>,
}

/// Typed StudyList API client bound to one Firebase ID token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    id_token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_token: id_token.into(),
        }
    }

    /// Swap in a refreshed ID token.
    pub fn set_id_token(&mut self, id_token: impl Into<String>) {
        self.id_token = id_token.into();
    }

    fn user_url(&self, uid: &str) -> String {
        format!("{}/api/users/{}", self.base_url, urlencoding::encode(uid))
    }

    fn topic_url(&self, uid: &str, topic_id: &str) -> String {
        format!(
            "{}/topics/{}",
            self.user_url(uid),
            urlencoding::encode(topic_id)
        )
    }

    fn material_url(&self, uid: &str, topic_id: &str, material_id: &str) -> String {
        format!(
            "{}/materials/{}",
            self.topic_url(uid, topic_id),
            urlencoding::encode(material_id)
        )
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn create_user(&self, body: &CreateUserRequest) -> Result<User, ApiError> {
        let url = format!("{}/api/users", self.base_url);
        self.send(Method::POST, &url, Some(body)).await
    }

    pub async fn get_user(&self, uid: &str) -> Result<User, ApiError> {
        self.send(Method::GET, &self.user_url(uid), None::<&()>).await
    }

    pub async fn update_profile(
        &self,
        uid: &str,
        body: &UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        let url = format!("{}/profile", self.user_url(uid));
        self.send(Method::PUT, &url, Some(body)).await
    }

    // ─── Topics ──────────────────────────────────────────────────

    pub async fn create_topic(&self, uid: &str, body: &CreateTopicRequest) -> Result<User, ApiError> {
        let url = format!("{}/topics", self.user_url(uid));
        self.send(Method::POST, &url, Some(body)).await
    }

    pub async fn update_topic(
        &self,
        uid: &str,
        topic_id: &str,
        body: &UpdateTopicRequest,
    ) -> Result<User, ApiError> {
        self.send(Method::PUT, &self.topic_url(uid, topic_id), Some(body))
            .await
    }

    pub async fn delete_topic(&self, uid: &str, topic_id: &str) -> Result<User, ApiError> {
        self.send(Method::DELETE, &self.topic_url(uid, topic_id), None::<&()>)
            .await
    }

    // ─── Materials ───────────────────────────────────────────────

    pub async fn add_material(
        &self,
        uid: &str,
        topic_id: &str,
        body: &AddMaterialRequest,
    ) -> Result<User, ApiError> {
        let url = format!("{}/materials", self.topic_url(uid, topic_id));
        self.send(Method::POST, &url, Some(body)).await
    }

    pub async fn set_completed(
        &self,
        uid: &str,
        topic_id: &str,
        material_id: &str,
        completed: bool,
    ) -> Result<User, ApiError> {
        let action = if completed { "complete" } else { "uncomplete" };
        let url = format!(
            "{}/{}",
            self.material_url(uid, topic_id, material_id),
            action
        );
        self.send(Method::PUT, &url, None::<&()>).await
    }

    pub async fn update_progress(
        &self,
        uid: &str,
        topic_id: &str,
        material_id: &str,
        body: &UpdateProgressRequest,
    ) -> Result<User, ApiError> {
        let url = format!("{}/progress", self.material_url(uid, topic_id, material_id));
        self.send(Method::PUT, &url, Some(body)).await
    }

    pub async fn delete_material(
        &self,
        uid: &str,
        topic_id: &str,
        material_id: &str,
    ) -> Result<User, ApiError> {
        let url = self.material_url(uid, topic_id, material_id);
        self.send(Method::DELETE, &url, None::<&()>).await
    }

    pub async fn reorder_materials(
        &self,
        uid: &str,
        topic_id: &str,
        body: &ReorderRequest,
    ) -> Result<User, ApiError> {
        let url = format!("{}/materials/reorder", self.topic_url(uid, topic_id));
        self.send(Method::PUT, &url, Some(body)).await
    }

    // ─── Learning Path ───────────────────────────────────────────

    pub async fn get_learning_path(
        &self,
        uid: &str,
        topic_id: &str,
    ) -> Result<LearningPath, ApiError> {
        let url = format!("{}/learning-path", self.topic_url(uid, topic_id));
        self.send(Method::GET, &url, None::<&()>).await
    }

    pub async fn save_learning_path(
        &self,
        uid: &str,
        topic_id: &str,
        body: &LearningPathRequest,
    ) -> Result<User, ApiError> {
        let url = format!("{}/learning-path", self.topic_url(uid, topic_id));
        self.send(Method::POST, &url, Some(body)).await
    }

    /// Send a request and decode a JSON success body.
    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.id_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::network)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = error_from_body(status, &body);
            tracing::warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                kind = ?error.kind,
                "StudyList API request failed"
            );
            return Err(error);
        }

        response.json().await.map_err(|e| ApiError {
            kind: ApiErrorKind::Unexpected,
            status: Some(status.as_u16()),
            message: format!("JSON parse error: {}", e),
        })
    }
}

fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.message.or(env.details).or(env.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    ApiError {
        kind: ApiErrorKind::from_status(status),
        status: Some(status.as_u16()),
        message,
    }
}
