// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learning material model and the unit/progress rules.
//!
//! Progress is stored in minutes (`progress.completed` out of `progress.total`,
//! where `total == reading_time`). Units are a view over those minutes for a
//! given `unit_minutes`; they are never persisted.

use super::bson_compat;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reading time assumed when a material does not declare one.
pub const DEFAULT_READING_TIME: u32 = 10;

/// Minutes per unit when a topic does not configure it.
pub const DEFAULT_UNIT_MINUTES: u32 = 20;

pub(crate) fn default_reading_time() -> u32 {
    DEFAULT_READING_TIME
}

/// Kind of material. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MaterialType {
    Webpage,
    Video,
    Podcast,
    Book,
}

impl MaterialType {
    pub const ALL: [MaterialType; 4] = [
        MaterialType::Webpage,
        MaterialType::Video,
        MaterialType::Podcast,
        MaterialType::Book,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Webpage => "webpage",
            MaterialType::Video => "video",
            MaterialType::Podcast => "podcast",
            MaterialType::Book => "book",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minutes completed out of the material's total reading time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    #[serde(default, deserialize_with = "bson_compat::whole")]
    pub completed: u32,
    #[serde(default, deserialize_with = "bson_compat::whole")]
    pub total: u32,
}

/// A flip of a material's `completed` flag, fed to the contribution ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    Completed,
    Uncompleted,
}

/// A learning material attached to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Material {
    #[serde(rename = "_id", deserialize_with = "bson_compat::id")]
    pub id: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    /// Legacy 1-5 rating, not used by progress
    #[serde(default, deserialize_with = "bson_compat::opt_whole")]
    pub rating: Option<u8>,
    #[serde(deserialize_with = "bson_compat::date")]
    pub date_added: DateTime<Utc>,
    /// Position in the topic list; lower sorts first
    #[serde(default, deserialize_with = "bson_compat::whole")]
    pub order: i64,
    /// Total minutes needed to finish
    #[serde(
        default = "default_reading_time",
        deserialize_with = "bson_compat::whole"
    )]
    pub reading_time: u32,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub completed: bool,
    /// Unit count written by older clients; folded into `progress` on load
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "bson_compat::opt_whole"
    )]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub completed_units: Option<u32>,
}

/// Fields supplied when adding a material.
#[derive(Debug, Clone)]
pub struct MaterialDraft {
    pub material_type: MaterialType,
    pub title: String,
    pub url: Option<String>,
    pub favicon: Option<String>,
    pub rating: Option<u8>,
    pub order: Option<i64>,
    pub reading_time: Option<u32>,
}

/// Number of units needed to cover `reading_time` minutes.
pub fn total_units(reading_time: u32, unit_minutes: u32) -> u32 {
    reading_time.div_ceil(unit_minutes.max(1))
}

impl Material {
    /// Build a fresh material with zeroed progress.
    pub fn new(draft: MaterialDraft, order: i64, now: DateTime<Utc>) -> Self {
        let reading_time = draft
            .reading_time
            .unwrap_or(DEFAULT_READING_TIME)
            .max(1);

        Self {
            id: ObjectId::new().to_hex(),
            material_type: draft.material_type,
            title: draft.title,
            url: draft.url,
            favicon: draft.favicon,
            rating: draft.rating,
            date_added: now,
            order,
            reading_time,
            progress: Progress {
                completed: 0,
                total: reading_time,
            },
            completed: false,
            completed_units: None,
        }
    }

    /// Bring a stored material in line with the current invariants.
    ///
    /// `progress.total` tracks `reading_time`, legacy unit counts become
    /// minutes, and a legacy `completed` flag wins over stale minutes.
    pub fn normalize(&mut self, unit_minutes: u32) {
        self.reading_time = self.reading_time.max(1);
        if let Some(units) = self.completed_units.take() {
            if self.progress == Progress::default() {
                self.progress.completed = units
                    .saturating_mul(unit_minutes.max(1))
                    .min(self.reading_time);
            }
        }
        self.progress.total = self.reading_time;
        if self.completed {
            self.progress.completed = self.progress.total;
        } else {
            self.progress.completed = self.progress.completed.min(self.progress.total);
            self.completed = self.is_finished();
        }
    }

    fn is_finished(&self) -> bool {
        self.progress.total > 0 && self.progress.completed >= self.progress.total
    }

    pub fn total_units(&self, unit_minutes: u32) -> u32 {
        total_units(self.reading_time, unit_minutes)
    }

    /// Units currently done, derived from minutes.
    pub fn completed_units(&self, unit_minutes: u32) -> u32 {
        let total = self.total_units(unit_minutes);
        if self.is_finished() {
            return total;
        }
        (self.progress.completed / unit_minutes.max(1)).min(total)
    }

    /// Set progress to `units` whole units (clamped to the unit count).
    pub fn set_completed_units(&mut self, units: u32, unit_minutes: u32) -> Option<CompletionChange> {
        let units = units.min(self.total_units(unit_minutes));
        let minutes = units
            .saturating_mul(unit_minutes.max(1))
            .min(self.reading_time);
        self.set_completed_minutes(minutes)
    }

    /// Set progress in minutes (clamped to the reading time).
    pub fn set_completed_minutes(&mut self, minutes: u32) -> Option<CompletionChange> {
        self.progress.completed = minutes.min(self.progress.total);
        self.sync_completed()
    }

    /// Change the reading time, keeping completed minutes where possible.
    pub fn set_reading_time(&mut self, minutes: u32) -> Option<CompletionChange> {
        self.reading_time = minutes.max(1);
        self.progress.total = self.reading_time;
        self.progress.completed = self.progress.completed.min(self.progress.total);
        self.sync_completed()
    }

    /// Complete or reset the whole material.
    pub fn mark_completed(&mut self, completed: bool) -> Option<CompletionChange> {
        self.progress.completed = if completed { self.progress.total } else { 0 };
        self.sync_completed()
    }

    /// Apply a click on unit cell `index` (0-based).
    ///
    /// Clicking a done cell rewinds to it; clicking the last cell finishes the
    /// material; any other cell fills up to and including itself.
    pub fn click_unit(
        &mut self,
        index: u32,
        unit_minutes: u32,
    ) -> Result<Option<CompletionChange>, AppError> {
        let total = self.total_units(unit_minutes);
        if index >= total {
            return Err(AppError::BadRequest(format!(
                "Unit {} is out of range for {} units",
                index, total
            )));
        }

        let done = self.completed_units(unit_minutes);
        let units = if index < done {
            index
        } else if index == total - 1 {
            total
        } else {
            index + 1
        };

        Ok(self.set_completed_units(units, unit_minutes))
    }

    fn sync_completed(&mut self) -> Option<CompletionChange> {
        let finished = self.is_finished();
        let was = std::mem::replace(&mut self.completed, finished);
        match (was, finished) {
            (false, true) => Some(CompletionChange::Completed),
            (true, false) => Some(CompletionChange::Uncompleted),
            _ => None,
        }
    }
}
