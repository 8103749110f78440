// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub(crate) mod bson_compat;
pub mod contribution;
pub mod material;
pub mod topic;
pub mod user;

pub use contribution::{current_streak, ContributionRecord, Ledger};
pub use material::{CompletionChange, Material, MaterialDraft, MaterialType, Progress};
pub use topic::{LearningPath, ReorderEntry, Topic};
pub use user::{ProfileUpdate, ProgressUpdate, TopicUpdate, User};
