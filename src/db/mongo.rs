// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User document store.
//!
//! Each user is one MongoDB document holding their topics, materials and
//! contribution ledger. Mutations are fetch-modify-write of the whole
//! document: concurrent writers race and the last write wins.
//!
//! An in-memory backend with the same behavior is available for tests and
//! local development.

use crate::config::{Config, DEFAULT_DATABASE, MONGO_MAX_POOL_SIZE};
use crate::db::collections;
use crate::error::AppError;
use crate::models::User;
use dashmap::DashMap;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use std::sync::Arc;

/// User document store.
#[derive(Clone)]
pub struct UserStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Mongo(Collection<User>),
    Memory(Arc<DashMap<String, User>>),
}

impl UserStore {
    /// Connect to MongoDB and make sure the `firebaseUID` index exists.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let mut options = ClientOptions::parse(&config.mongodb_uri)
            .await
            .map_err(|e| AppError::Database(format!("Invalid MongoDB URI: {}", e)))?;
        options.max_pool_size = Some(MONGO_MAX_POOL_SIZE);
        options.app_name = Some("studylist".to_string());

        let client = Client::with_options(options)
            .map_err(|e| AppError::Database(format!("Failed to create MongoDB client: {}", e)))?;

        let database = match &config.mongodb_database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        let users = database.collection::<User>(collections::USERS);

        let index = IndexModel::builder()
            .keys(doc! { "firebaseUID": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users
            .create_index(index)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        tracing::info!(
            database = database.name(),
            max_pool_size = MONGO_MAX_POOL_SIZE,
            "Connected to MongoDB"
        );

        Ok(Self {
            backend: Backend::Mongo(users),
        })
    }

    /// Create a store that keeps documents in process memory.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by Firebase UID, with stored data normalized.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        let user = match &self.backend {
            Backend::Mongo(users) => users
                .find_one(doc! { "firebaseUID": uid })
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            Backend::Memory(users) => users.get(uid).map(|entry| entry.value().clone()),
        };

        Ok(user.map(|mut user| {
            user.normalize();
            user
        }))
    }

    /// Create or replace a user document.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Mongo(users) => {
                users
                    .replace_one(doc! { "firebaseUID": user.firebase_uid.as_str() }, user)
                    .upsert(true)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(users) => {
                users.insert(user.firebase_uid.clone(), user.clone());
            }
        }
        Ok(())
    }

    /// Load a user, apply `mutate`, and write the result back.
    ///
    /// Nothing is written when `mutate` fails.
    pub async fn modify<T, F>(&self, uid: &str, mutate: F) -> Result<(User, T), AppError>
    where
        F: FnOnce(&mut User) -> Result<T, AppError>,
    {
        let mut user = self
            .get_user(uid)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        let output = mutate(&mut user)?;
        self.save_user(&user).await?;

        Ok((user, output))
    }
}
