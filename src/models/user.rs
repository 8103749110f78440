// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User document: profile, topics and the contribution ledger.
//!
//! Every mutating API call loads one of these, applies one of the methods
//! below, and saves the whole document back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::bson_compat;
use super::contribution::{ContributionRecord, Ledger};
use super::material::{CompletionChange, Material, MaterialDraft};
use super::topic::{LearningPath, ReorderEntry, Topic};
use crate::error::AppError;

/// User profile and study data stored in MongoDB (one document per user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Firebase UID (unique)
    #[serde(rename = "firebaseUID")]
    pub firebase_uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub contributions: Vec<ContributionRecord>,
    #[serde(default, deserialize_with = "bson_compat::opt_date")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Profile fields a user may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

/// Topic fields a user may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TopicUpdate {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub unit_minutes: Option<u32>,
}

/// A progress change for one material.
///
/// `completed_units` wins over `completed_minutes` when both are present.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub reading_time: Option<u32>,
    pub completed_units: Option<u32>,
    pub completed_minutes: Option<u32>,
}

impl User {
    pub fn new(
        firebase_uid: String,
        name: Option<String>,
        email: Option<String>,
        photo_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            firebase_uid,
            name,
            email,
            bio: None,
            photo_url,
            topics: Vec::new(),
            contributions: Vec::new(),
            created_at: Some(now),
        }
    }

    /// Repair stored data written by older versions.
    pub fn normalize(&mut self) {
        for topic in &mut self.topics {
            topic.normalize();
        }
    }

    pub fn topic(&self, topic_id: &str) -> Result<&Topic, AppError> {
        self.topics
            .iter()
            .find(|t| t.id == topic_id)
            .ok_or_else(AppError::topic_not_found)
    }

    pub fn topic_mut(&mut self, topic_id: &str) -> Result<&mut Topic, AppError> {
        self.topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or_else(AppError::topic_not_found)
    }

    fn ledger(&mut self) -> Ledger<'_> {
        Ledger::new(&mut self.contributions)
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio);
        }
        if let Some(photo_url) = update.photo_url {
            self.photo_url = Some(photo_url);
        }
    }

    /// Add a topic and count it for `today`. Returns the new topic id.
    pub fn add_topic(&mut self, topic: Topic, today: NaiveDate) -> String {
        let id = topic.id.clone();
        self.topics.push(topic);
        self.ledger().record_addition(today);
        id
    }

    pub fn update_topic(&mut self, topic_id: &str, update: TopicUpdate) -> Result<(), AppError> {
        let topic = self.topic_mut(topic_id)?;
        if let Some(name) = update.name {
            topic.name = name;
        }
        if let Some(tags) = update.tags {
            topic.tags = tags;
        }
        if let Some(deadline) = update.deadline {
            topic.deadline = deadline;
        }
        if let Some(unit_minutes) = update.unit_minutes {
            topic.unit_minutes = unit_minutes.max(1);
        }
        Ok(())
    }

    pub fn delete_topic(&mut self, topic_id: &str) -> Result<Topic, AppError> {
        let index = self
            .topics
            .iter()
            .position(|t| t.id == topic_id)
            .ok_or_else(AppError::topic_not_found)?;
        Ok(self.topics.remove(index))
    }

    /// Add a material, count it for `today`, and prune old contribution records.
    /// Returns the new material id.
    pub fn add_material(
        &mut self,
        topic_id: &str,
        draft: MaterialDraft,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<String, AppError> {
        let topic = self.topic_mut(topic_id)?;
        let order = draft.order.unwrap_or_else(|| topic.next_order());
        let material = Material::new(draft, order, now);
        let id = material.id.clone();
        topic.materials.push(material);
        topic.sort_materials();

        let mut ledger = self.ledger();
        ledger.record_addition(today);
        let pruned = ledger.prune(today);
        if pruned > 0 {
            tracing::debug!(uid = %self.firebase_uid, pruned, "Pruned old contribution records");
        }
        Ok(id)
    }

    pub fn set_material_completed(
        &mut self,
        topic_id: &str,
        material_id: &str,
        completed: bool,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        let change = self
            .topic_mut(topic_id)?
            .material_mut(material_id)
            .ok_or_else(AppError::material_not_found)?
            .mark_completed(completed);

        if let Some(change) = change {
            self.ledger().record_completion(change, today);
        }
        Ok(())
    }

    pub fn update_material_progress(
        &mut self,
        topic_id: &str,
        material_id: &str,
        update: ProgressUpdate,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        let topic = self.topic_mut(topic_id)?;
        let unit_minutes = topic.unit_minutes;
        let material = topic
            .material_mut(material_id)
            .ok_or_else(AppError::material_not_found)?;

        let was_completed = material.completed;
        if let Some(reading_time) = update.reading_time {
            material.set_reading_time(reading_time);
        }
        if let Some(units) = update.completed_units {
            material.set_completed_units(units, unit_minutes);
        } else if let Some(minutes) = update.completed_minutes {
            material.set_completed_minutes(minutes);
        }

        // Net flip across the whole update, not per step.
        let change = match (was_completed, material.completed) {
            (false, true) => Some(CompletionChange::Completed),
            (true, false) => Some(CompletionChange::Uncompleted),
            _ => None,
        };
        if let Some(change) = change {
            self.ledger().record_completion(change, today);
        }
        Ok(())
    }

    /// Apply a click on unit cell `index` of a material.
    /// Returns the material's completed units afterwards.
    pub fn click_material_unit(
        &mut self,
        topic_id: &str,
        material_id: &str,
        index: u32,
        today: NaiveDate,
    ) -> Result<u32, AppError> {
        let topic = self.topic_mut(topic_id)?;
        let unit_minutes = topic.unit_minutes;
        let material = topic
            .material_mut(material_id)
            .ok_or_else(AppError::material_not_found)?;

        let change = material.click_unit(index, unit_minutes)?;
        let units = material.completed_units(unit_minutes);

        if let Some(change) = change {
            self.ledger().record_completion(change, today);
        }
        Ok(units)
    }

    pub fn delete_material(
        &mut self,
        topic_id: &str,
        material_id: &str,
    ) -> Result<Material, AppError> {
        self.topic_mut(topic_id)?
            .remove_material(material_id)
            .ok_or_else(AppError::material_not_found)
    }

    /// Apply a batch reorder. Returns how many entries matched.
    pub fn reorder_materials(
        &mut self,
        topic_id: &str,
        entries: &[ReorderEntry],
    ) -> Result<usize, AppError> {
        Ok(self.topic_mut(topic_id)?.apply_reorder(entries))
    }

    pub fn set_learning_path(
        &mut self,
        topic_id: &str,
        learning_path: LearningPath,
    ) -> Result<(), AppError> {
        self.topic_mut(topic_id)?.learning_path = Some(learning_path);
        Ok(())
    }
}
