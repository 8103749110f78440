// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed client for the StudyList API.
//!
//! [`StudyClient`] owns a [`StudyStore`]. Every action is applied to the
//! store first, then persisted; the server's document is confirmed on
//! success and the store reverts to the last confirmed document on any
//! failure.

pub mod api;
pub mod reorder;
pub mod store;

pub use api::{ApiClient, ApiError, ApiErrorKind};
pub use reorder::{OrderSnapshot, SnapshotCache};
pub use store::{Action, Mutation, StudyStore};

use crate::error::AppError;
use crate::models::{current_streak, User};
use crate::time_utils::today_utc;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server call failed; local changes were reverted.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The action does not apply to the current state.
    #[error("{0}")]
    Rejected(#[from] AppError),

    #[error("topic {0} is not open")]
    TopicNotOpen(String),

    #[error("snapshot cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A signed-in user's session against the API.
pub struct StudyClient {
    api: ApiClient,
    uid: String,
    store: StudyStore,
    snapshots: SnapshotCache,
    open_topics: HashMap<String, OrderSnapshot>,
}

impl StudyClient {
    /// Fetch the user's document and start a session.
    pub async fn load(
        api: ApiClient,
        uid: impl Into<String>,
        snapshots: SnapshotCache,
    ) -> Result<Self, ClientError> {
        let uid = uid.into();
        let user = api.get_user(&uid).await?;
        tracing::debug!(uid = %uid, topics = user.topics.len(), "Loaded user document");

        Ok(Self {
            api,
            uid,
            store: StudyStore::new(user),
            snapshots,
            open_topics: HashMap::new(),
        })
    }

    pub fn user(&self) -> &User {
        self.store.view()
    }

    pub fn store(&self) -> &StudyStore {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Consecutive active days, from the visible ledger.
    pub fn streak(&self) -> u32 {
        current_streak(&self.store.view().contributions, today_utc())
    }

    /// Re-fetch the user document, discarding unconfirmed changes.
    pub async fn refresh(&mut self) -> Result<&User, ClientError> {
        let user = self.api.get_user(&self.uid).await?;
        self.store.confirm(user);
        Ok(self.store.view())
    }

    /// Apply an action optimistically and persist it.
    pub async fn dispatch(&mut self, action: Action) -> Result<&User, ClientError> {
        let Some(mutation) = self.store.apply(action)? else {
            return Ok(self.store.view());
        };

        match self.persist(&mutation).await {
            Ok(user) => {
                self.store.confirm(user);
                Ok(self.store.view())
            }
            Err(e) => {
                tracing::warn!(
                    uid = %self.uid,
                    error = %e,
                    mutation = ?mutation,
                    "Mutation failed; reverting to confirmed state"
                );
                self.store.revert();
                Err(e.into())
            }
        }
    }

    async fn persist(&self, mutation: &Mutation) -> Result<User, ApiError> {
        let uid = &self.uid;
        match mutation {
            Mutation::UpdateProgress {
                topic_id,
                material_id,
                body,
            } => {
                self.api
                    .update_progress(uid, topic_id, material_id, body)
                    .await
            }
            Mutation::SetCompleted {
                topic_id,
                material_id,
                completed,
            } => {
                self.api
                    .set_completed(uid, topic_id, material_id, *completed)
                    .await
            }
            Mutation::Reorder { topic_id, body } => {
                self.api.reorder_materials(uid, topic_id, body).await
            }
            Mutation::DeleteMaterial {
                topic_id,
                material_id,
            } => self.api.delete_material(uid, topic_id, material_id).await,
            Mutation::UpdateTopic { topic_id, body } => {
                self.api.update_topic(uid, topic_id, body).await
            }
        }
    }

    /// Start working on a topic and remember its original order.
    ///
    /// A snapshot left in the cache by an earlier session wins over a fresh
    /// capture.
    pub fn open_topic(&mut self, topic_id: &str) -> Result<&OrderSnapshot, ClientError> {
        let snapshot = match self.snapshots.load(topic_id)? {
            Some(cached) => {
                tracing::debug!(topic_id, "Recovered order snapshot from cache");
                cached
            }
            None => {
                let topic = self.store.confirmed().topic(topic_id)?;
                let snapshot = OrderSnapshot::capture(topic_id, &topic.materials);
                self.snapshots.store(&snapshot)?;
                snapshot
            }
        };

        Ok(&*self
            .open_topics
            .entry(topic_id.to_string())
            .or_insert(snapshot))
    }

    /// Put an open topic back in the order it had when opened.
    pub async fn restore_original_order(&mut self, topic_id: &str) -> Result<&User, ClientError> {
        let snapshot = self
            .open_topics
            .get(topic_id)
            .cloned()
            .ok_or_else(|| ClientError::TopicNotOpen(topic_id.to_string()))?;

        self.dispatch(Action::RestoreOrder { snapshot }).await
    }

    /// Stop working on a topic and forget its snapshot.
    pub fn close_topic(&mut self, topic_id: &str) -> Result<(), ClientError> {
        self.open_topics.remove(topic_id);
        self.snapshots.remove(topic_id)
    }
}
