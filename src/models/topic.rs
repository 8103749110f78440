// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Topic model: a named collection of materials with its own unit size.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::bson_compat;
use super::material::{Material, MaterialType, DEFAULT_UNIT_MINUTES};

fn default_unit_minutes() -> u32 {
    DEFAULT_UNIT_MINUTES
}

/// Opaque learning-path diagram, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LearningPath {
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
    #[serde(default)]
    pub edges: Vec<serde_json::Value>,
}

/// Per-type buckets from the older topic layout.
///
/// Bucket entries may omit `type`; the bucket supplies it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyCategories {
    #[serde(default, deserialize_with = "webpage_bucket")]
    pub webpage: Vec<Material>,
    #[serde(default, deserialize_with = "video_bucket")]
    pub video: Vec<Material>,
    #[serde(default, deserialize_with = "podcast_bucket")]
    pub podcast: Vec<Material>,
    #[serde(default, deserialize_with = "book_bucket")]
    pub book: Vec<Material>,
}

fn bucket<'de, D: Deserializer<'de>>(
    deserializer: D,
    material_type: MaterialType,
) -> Result<Vec<Material>, D::Error> {
    Vec::<Document>::deserialize(deserializer)?
        .into_iter()
        .map(|mut entry| {
            if !entry.contains_key("type") {
                entry.insert("type", material_type.as_str());
            }
            bson::from_document(entry).map_err(D::Error::custom)
        })
        .collect()
}

fn webpage_bucket<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Material>, D::Error> {
    bucket(d, MaterialType::Webpage)
}

fn video_bucket<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Material>, D::Error> {
    bucket(d, MaterialType::Video)
}

fn podcast_bucket<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Material>, D::Error> {
    bucket(d, MaterialType::Podcast)
}

fn book_bucket<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Material>, D::Error> {
    bucket(d, MaterialType::Book)
}

/// One entry of a batch reorder request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReorderEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub order: i64,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
}

/// A study topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Topic {
    #[serde(rename = "_id", deserialize_with = "bson_compat::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "bson_compat::opt_date")]
    pub deadline: Option<DateTime<Utc>>,
    /// Minutes per progress unit for every material in this topic
    #[serde(
        default = "default_unit_minutes",
        deserialize_with = "bson_compat::whole"
    )]
    pub unit_minutes: u32,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub learning_path: Option<LearningPath>,
    #[serde(default, deserialize_with = "bson_compat::opt_date")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub categories: Option<LegacyCategories>,
}

impl Topic {
    pub fn new(
        name: String,
        tags: Vec<String>,
        deadline: Option<DateTime<Utc>>,
        unit_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ObjectId::new().to_hex(),
            name,
            tags,
            deadline,
            unit_minutes: unit_minutes.unwrap_or(DEFAULT_UNIT_MINUTES).max(1),
            materials: Vec::new(),
            learning_path: None,
            created_at: Some(now),
            categories: None,
        }
    }

    /// Fold legacy buckets into `materials` and repair material invariants.
    pub fn normalize(&mut self) {
        self.unit_minutes = self.unit_minutes.max(1);

        if let Some(categories) = self.categories.take() {
            let buckets = [
                (MaterialType::Webpage, categories.webpage),
                (MaterialType::Video, categories.video),
                (MaterialType::Podcast, categories.podcast),
                (MaterialType::Book, categories.book),
            ];
            for (material_type, bucket) in buckets {
                for mut material in bucket {
                    material.material_type = material_type;
                    if !self.materials.iter().any(|m| m.id == material.id) {
                        self.materials.push(material);
                    }
                }
            }
            self.sort_materials();
        }

        let unit_minutes = self.unit_minutes;
        for material in &mut self.materials {
            material.normalize(unit_minutes);
        }
    }

    /// Stable sort by `order`; equal orders keep their array position.
    pub fn sort_materials(&mut self) {
        self.materials.sort_by_key(|m| m.order);
    }

    /// Order for a material appended at the end of the list.
    pub fn next_order(&self) -> i64 {
        self.materials
            .iter()
            .map(|m| m.order)
            .max()
            .map_or(0, |max| max + 1)
    }

    pub fn material(&self, material_id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == material_id)
    }

    pub fn material_mut(&mut self, material_id: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.id == material_id)
    }

    /// Remove a material by id. Other materials keep their `order`.
    pub fn remove_material(&mut self, material_id: &str) -> Option<Material> {
        let index = self.materials.iter().position(|m| m.id == material_id)?;
        Some(self.materials.remove(index))
    }

    /// Write new orders from a batch request, then re-sort.
    ///
    /// Entries whose id is unknown, or whose declared type does not match the
    /// stored material, are skipped. Returns the number of entries applied.
    pub fn apply_reorder(&mut self, entries: &[ReorderEntry]) -> usize {
        let mut applied = 0;
        for entry in entries {
            match self
                .materials
                .iter_mut()
                .find(|m| m.id == entry.id && m.material_type == entry.material_type)
            {
                Some(material) => {
                    material.order = entry.order;
                    applied += 1;
                }
                None => {
                    tracing::debug!(
                        topic_id = %self.id,
                        material_id = %entry.id,
                        material_type = %entry.material_type,
                        "Skipping reorder entry with no matching material"
                    );
                }
            }
        }
        self.sort_materials();
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::material::MaterialDraft;

    fn topic_with(titles: &[(&str, MaterialType)]) -> Topic {
        let now = Utc::now();
        let mut topic = Topic::new("Biology".to_string(), vec![], None, None, now);
        for (title, material_type) in titles {
            let order = topic.next_order();
            topic.materials.push(Material::new(
                MaterialDraft {
                    material_type: *material_type,
                    title: title.to_string(),
                    url: None,
                    favicon: None,
                    rating: None,
                    order: None,
                    reading_time: None,
                },
                order,
                now,
            ));
        }
        topic
    }

    fn titles(topic: &Topic) -> Vec<&str> {
        topic.materials.iter().map(|m| m.title.as_str()).collect()
    }

    fn entry(topic: &Topic, title: &str, order: i64) -> ReorderEntry {
        let m = topic.materials.iter().find(|m| m.title == title).unwrap();
        ReorderEntry {
            id: m.id.clone(),
            order,
            material_type: m.material_type,
        }
    }

    #[test]
    fn test_move_first_to_last() {
        let mut topic = topic_with(&[
            ("A", MaterialType::Book),
            ("B", MaterialType::Video),
            ("C", MaterialType::Webpage),
        ]);
        let entries = vec![entry(&topic, "B", 0), entry(&topic, "C", 1), entry(&topic, "A", 2)];

        assert_eq!(topic.apply_reorder(&entries), 3);

        assert_eq!(titles(&topic), vec!["B", "C", "A"]);
        let orders: Vec<i64> = topic.materials.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_is_idempotent() {
        let mut topic = topic_with(&[
            ("A", MaterialType::Book),
            ("B", MaterialType::Book),
            ("C", MaterialType::Book),
        ]);
        let entries = vec![entry(&topic, "C", 0), entry(&topic, "A", 1), entry(&topic, "B", 2)];

        topic.apply_reorder(&entries);
        let first = topic.clone();
        topic.apply_reorder(&entries);

        assert_eq!(topic, first);
    }

    #[test]
    fn test_unknown_or_mistyped_entries_are_ignored() {
        let mut topic = topic_with(&[("A", MaterialType::Book), ("B", MaterialType::Video)]);
        let mut wrong_type = entry(&topic, "A", 5);
        wrong_type.material_type = MaterialType::Podcast;
        let unknown = ReorderEntry {
            id: ObjectId::new().to_hex(),
            order: -1,
            material_type: MaterialType::Book,
        };

        let applied = topic.apply_reorder(&[wrong_type, unknown]);

        assert_eq!(applied, 0);
        assert_eq!(titles(&topic), vec!["A", "B"]);
        assert_eq!(topic.materials[0].order, 0);
    }

    #[test]
    fn test_duplicate_orders_keep_array_position() {
        let mut topic = topic_with(&[
            ("A", MaterialType::Book),
            ("B", MaterialType::Book),
            ("C", MaterialType::Book),
        ]);
        let entries = vec![entry(&topic, "C", 0), entry(&topic, "B", 0), entry(&topic, "A", 0)];

        topic.apply_reorder(&entries);

        assert_eq!(titles(&topic), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_remove_material_keeps_other_orders() {
        let mut topic = topic_with(&[
            ("A", MaterialType::Book),
            ("B", MaterialType::Video),
            ("C", MaterialType::Webpage),
        ]);
        let b_id = topic.materials[1].id.clone();

        let removed = topic.remove_material(&b_id).unwrap();

        assert_eq!(removed.title, "B");
        let orders: Vec<(&str, i64)> = topic
            .materials
            .iter()
            .map(|m| (m.title.as_str(), m.order))
            .collect();
        assert_eq!(orders, vec![("A", 0), ("C", 2)]);
        assert!(topic.remove_material(&b_id).is_none());
        assert_eq!(topic.next_order(), 3);
    }

    #[test]
    fn test_normalize_folds_legacy_categories() {
        let json = r#"{
            "_id": "65f0c0ffee00000000000001",
            "name": "Chemistry",
            "categories": {
                "webpage": [
                    {"_id": "65f0c0ffee00000000000011", "title": "Wiki",
                     "dateAdded": "2024-05-01T10:00:00Z", "order": 2}
                ],
                "book": [
                    {"_id": "65f0c0ffee00000000000012", "type": "book", "title": "Atkins",
                     "dateAdded": "2024-05-01T10:00:00Z", "order": 0, "completed": true}
                ],
                "video": [],
                "podcast": []
            }
        }"#;
        let mut topic: Topic = serde_json::from_str(json).unwrap();

        topic.normalize();

        assert_eq!(topic.unit_minutes, DEFAULT_UNIT_MINUTES);
        assert_eq!(titles(&topic), vec!["Atkins", "Wiki"]);
        assert_eq!(topic.materials[1].material_type, MaterialType::Webpage);
        assert!(topic.materials[0].completed);
        assert_eq!(topic.materials[0].progress.completed, 10);
        assert!(topic.categories.is_none());
        let value = serde_json::to_value(&topic).unwrap();
        assert!(value.get("categories").is_none());
        assert_eq!(value["materials"].as_array().unwrap().len(), 2);
    }
}
