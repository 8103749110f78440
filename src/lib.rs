// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StudyList: a personal learning tracker
//!
//! This crate provides the backend API over per-user topic/material
//! documents in MongoDB, plus a typed client that keeps an optimistic local
//! store in sync with the server.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use services::FirebaseVerifier;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: UserStore,
    pub firebase_verifier: Arc<FirebaseVerifier>,
}
