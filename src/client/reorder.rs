// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client side of the reorder protocol.
//!
//! The visible list is the topic's materials sorted by `order` (ties keep
//! array position). A drag moves one item, then every item is renumbered
//! `order = position`. The snapshot taken when a topic is opened can be
//! resubmitted to restore the original order, and is mirrored to disk so it
//! survives a crash.

use super::ClientError;
use crate::models::{Material, ReorderEntry};
use crate::routes::ReorderRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Materials in display order.
pub fn ordered(materials: &[Material]) -> Vec<Material> {
    let mut list = materials.to_vec();
    list.sort_by_key(|m| m.order);
    list
}

/// A material with its 1-based display position.
#[derive(Debug, Clone, Copy)]
pub struct Indexed<'a> {
    pub index: usize,
    pub material: &'a Material,
}

/// Pair each material with its display index (`position + 1`).
pub fn indexed(list: &[Material]) -> impl Iterator<Item = Indexed<'_>> {
    list.iter().enumerate().map(|(position, material)| Indexed {
        index: position + 1,
        material,
    })
}

/// Move the item at `from` to `to` and renumber every order.
///
/// Returns `false`, leaving `list` untouched, when there is nothing to do: no
/// destination, `from == to`, or an index out of range.
pub fn move_item(list: &mut Vec<Material>, from: usize, to: Option<usize>) -> bool {
    let Some(to) = to else {
        return false;
    };
    if from == to || from >= list.len() || to >= list.len() {
        return false;
    }

    let item = list.remove(from);
    list.insert(to, item);
    renumber(list);
    true
}

/// Give every item `order = position`.
pub fn renumber(list: &mut [Material]) {
    for (position, material) in list.iter_mut().enumerate() {
        material.order = position as i64;
    }
}

/// Batch body carrying the current order of `list`.
pub fn reorder_request(list: &[Material]) -> ReorderRequest {
    ReorderRequest {
        materials: list
            .iter()
            .map(|m| ReorderEntry {
                id: m.id.clone(),
                order: m.order,
                material_type: m.material_type,
            })
            .collect(),
    }
}

/// Original display positions of a topic's materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub topic_id: String,
    /// Material id to original 0-based position
    pub positions: HashMap<String, usize>,
}

impl OrderSnapshot {
    pub fn capture(topic_id: &str, materials: &[Material]) -> Self {
        let positions = ordered(materials)
            .into_iter()
            .enumerate()
            .map(|(position, m)| (m.id, position))
            .collect();
        Self {
            topic_id: topic_id.to_string(),
            positions,
        }
    }

    /// Rearrange `list` into snapshot order and renumber it.
    ///
    /// Materials added after the snapshot keep their relative order and go
    /// after the snapshotted ones.
    pub fn restore(&self, list: &mut [Material]) {
        list.sort_by_key(|m| match self.positions.get(&m.id) {
            Some(&position) => (0, position),
            None => (1, 0),
        });
        renumber(list);
    }
}

/// File-backed store of order snapshots, one JSON file per topic.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Percent-encoded so that distinct ids never share a file.
    fn path_for(&self, topic_id: &str) -> PathBuf {
        self.dir
            .join(format!("order-{}.json", urlencoding::encode(topic_id)))
    }

    pub fn load(&self, topic_id: &str) -> Result<Option<OrderSnapshot>, ClientError> {
        let raw = match fs::read(self.path_for(topic_id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<OrderSnapshot>(&raw) {
            Ok(snapshot) if snapshot.topic_id == topic_id => Ok(Some(snapshot)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(topic_id, error = %e, "Discarding unreadable order snapshot");
                Ok(None)
            }
        }
    }

    pub fn store(&self, snapshot: &OrderSnapshot) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.path_for(&snapshot.topic_id),
            serde_json::to_vec(snapshot)?,
        )?;
        Ok(())
    }

    pub fn remove(&self, topic_id: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.path_for(topic_id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaterialDraft, MaterialType};
    use chrono::Utc;

    fn list(titles: &[&str]) -> Vec<Material> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                Material::new(
                    MaterialDraft {
                        material_type: MaterialType::Webpage,
                        title: title.to_string(),
                        url: None,
                        favicon: None,
                        rating: None,
                        order: None,
                        reading_time: None,
                    },
                    i as i64,
                    Utc::now(),
                )
            })
            .collect()
    }

    fn titles(list: &[Material]) -> Vec<&str> {
        list.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn move_first_to_last_renumbers() {
        let mut items = list(&["A", "B", "C"]);

        assert!(move_item(&mut items, 0, Some(2)));

        assert_eq!(titles(&items), vec!["B", "C", "A"]);
        let orders: Vec<i64> = items.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let display: Vec<usize> = indexed(&items).map(|i| i.index).collect();
        assert_eq!(display, vec![1, 2, 3]);
    }

    #[test]
    fn invalid_drops_are_noops() {
        let mut items = list(&["A", "B", "C"]);
        items[2].order = 7;
        let before = items.clone();

        assert!(!move_item(&mut items, 0, None));
        assert!(!move_item(&mut items, 1, Some(1)));
        assert!(!move_item(&mut items, 0, Some(3)));
        assert!(!move_item(&mut items, 5, Some(0)));

        assert_eq!(items, before);
    }

    #[test]
    fn ordered_breaks_ties_by_position() {
        let mut items = list(&["A", "B", "C"]);
        for m in &mut items {
            m.order = 1;
        }
        items[2].order = 0;

        assert_eq!(titles(&ordered(&items)), vec!["C", "A", "B"]);
    }

    #[test]
    fn snapshot_restores_original_order() {
        let items = list(&["A", "B", "C"]);
        let snapshot = OrderSnapshot::capture("t1", &items);

        let mut moved = items.clone();
        move_item(&mut moved, 2, Some(0));
        let mut extra = list(&["D"]);
        extra[0].order = -5;
        moved.insert(0, extra.remove(0));

        snapshot.restore(&mut moved);

        assert_eq!(titles(&moved), vec!["A", "B", "C", "D"]);
        let request = reorder_request(&moved);
        assert_eq!(request.materials.len(), 4);
        assert_eq!(request.materials[3].order, 3);
    }

    #[test]
    fn cache_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().join("snapshots"));
        let snapshot = OrderSnapshot::capture("65f0c0ffee00000000000001", &list(&["A", "B"]));

        assert_eq!(cache.load(&snapshot.topic_id).unwrap(), None);
        cache.store(&snapshot).unwrap();
        assert_eq!(cache.load(&snapshot.topic_id).unwrap(), Some(snapshot.clone()));

        cache.remove(&snapshot.topic_id).unwrap();
        cache.remove(&snapshot.topic_id).unwrap();
        assert_eq!(cache.load(&snapshot.topic_id).unwrap(), None);
    }

    #[test]
    fn corrupt_cache_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        std::fs::write(dir.path().join("order-t9.json"), b"{not json").unwrap();

        assert_eq!(cache.load("t9").unwrap(), None);
    }

    #[test]
    fn distinct_topic_ids_use_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        let slashed = OrderSnapshot::capture("a/b", &list(&["A", "B"]));
        let plain = OrderSnapshot::capture("ab", &list(&["C"]));
        let dots = OrderSnapshot::capture("..", &list(&["D"]));

        cache.store(&slashed).unwrap();
        cache.store(&plain).unwrap();
        cache.store(&dots).unwrap();

        assert_eq!(cache.load("a/b").unwrap(), Some(slashed));
        assert_eq!(cache.load("ab").unwrap(), Some(plain));
        assert_eq!(cache.load("..").unwrap(), Some(dots));
        assert_eq!(cache.load("").unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
