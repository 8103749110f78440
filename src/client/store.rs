// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single source of truth for the client.
//!
//! `confirmed` is the last user document the server returned; `view` is what
//! the UI shows. [`StudyStore::apply`] updates `view` optimistically and says
//! which server call makes it durable. The caller then either confirms the
//! server's response or reverts to `confirmed`.

use super::reorder::{self, OrderSnapshot};
use super::ClientError;
use crate::models::{TopicUpdate, User};
use crate::routes::{ReorderRequest, UpdateProgressRequest, UpdateTopicRequest};
use crate::time_utils::today_utc;

/// A user gesture.
#[derive(Debug, Clone)]
pub enum Action {
    /// Click on unit cell `index` (0-based)
    ClickUnit {
        topic_id: String,
        material_id: String,
        index: u32,
    },
    /// Drag from display position `from`; `to` is `None` when dropped outside
    MoveMaterial {
        topic_id: String,
        from: usize,
        to: Option<usize>,
    },
    RestoreOrder {
        snapshot: OrderSnapshot,
    },
    SetCompleted {
        topic_id: String,
        material_id: String,
        completed: bool,
    },
    DeleteMaterial {
        topic_id: String,
        material_id: String,
    },
    SetUnitMinutes {
        topic_id: String,
        unit_minutes: u32,
    },
}

/// The server call that persists an applied action.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpdateProgress {
        topic_id: String,
        material_id: String,
        body: UpdateProgressRequest,
    },
    SetCompleted {
        topic_id: String,
        material_id: String,
        completed: bool,
    },
    Reorder {
        topic_id: String,
        body: ReorderRequest,
    },
    DeleteMaterial {
        topic_id: String,
        material_id: String,
    },
    UpdateTopic {
        topic_id: String,
        body: UpdateTopicRequest,
    },
}

#[derive(Debug, Clone)]
pub struct StudyStore {
    confirmed: User,
    view: User,
}

impl StudyStore {
    pub fn new(user: User) -> Self {
        Self {
            confirmed: user.clone(),
            view: user,
        }
    }

    /// What the UI shows, including unconfirmed changes.
    pub fn view(&self) -> &User {
        &self.view
    }

    /// Last server-confirmed document.
    pub fn confirmed(&self) -> &User {
        &self.confirmed
    }

    pub fn has_pending_changes(&self) -> bool {
        self.view != self.confirmed
    }

    /// Apply `action` to the view.
    ///
    /// Returns `None` for gestures that change nothing. On error the view is
    /// left as it was.
    pub fn apply(&mut self, action: Action) -> Result<Option<Mutation>, ClientError> {
        let mut next = self.view.clone();
        let mutation = apply_to(&mut next, action)?;
        if mutation.is_some() {
            self.view = next;
        }
        Ok(mutation)
    }

    /// Accept the server's document as the new truth.
    pub fn confirm(&mut self, user: User) {
        self.confirmed = user.clone();
        self.view = user;
    }

    /// Drop every unconfirmed change.
    pub fn revert(&mut self) {
        self.view = self.confirmed.clone();
    }
}

fn apply_to(user: &mut User, action: Action) -> Result<Option<Mutation>, ClientError> {
    let today = today_utc();

    let mutation = match action {
        Action::ClickUnit {
            topic_id,
            material_id,
            index,
        } => {
            let units = user.click_material_unit(&topic_id, &material_id, index, today)?;
            Mutation::UpdateProgress {
                topic_id,
                material_id,
                body: UpdateProgressRequest {
                    completed_units: Some(units),
                    ..Default::default()
                },
            }
        }
        Action::MoveMaterial { topic_id, from, to } => {
            let topic = user.topic_mut(&topic_id)?;
            let mut list = reorder::ordered(&topic.materials);
            if !reorder::move_item(&mut list, from, to) {
                return Ok(None);
            }
            let body = reorder::reorder_request(&list);
            topic.materials = list;
            Mutation::Reorder { topic_id, body }
        }
        Action::RestoreOrder { snapshot } => {
            let topic = user.topic_mut(&snapshot.topic_id)?;
            let mut list = reorder::ordered(&topic.materials);
            snapshot.restore(&mut list);
            let body = reorder::reorder_request(&list);
            topic.materials = list;
            Mutation::Reorder {
                topic_id: snapshot.topic_id,
                body,
            }
        }
        Action::SetCompleted {
            topic_id,
            material_id,
            completed,
        } => {
            user.set_material_completed(&topic_id, &material_id, completed, today)?;
            Mutation::SetCompleted {
                topic_id,
                material_id,
                completed,
            }
        }
        Action::DeleteMaterial {
            topic_id,
            material_id,
        } => {
            user.delete_material(&topic_id, &material_id)?;
            Mutation::DeleteMaterial {
                topic_id,
                material_id,
            }
        }
        Action::SetUnitMinutes {
            topic_id,
            unit_minutes,
        } => {
            user.update_topic(
                &topic_id,
                TopicUpdate {
                    unit_minutes: Some(unit_minutes),
                    ..Default::default()
                },
            )?;
            Mutation::UpdateTopic {
                topic_id,
                body: UpdateTopicRequest {
                    unit_minutes: Some(unit_minutes),
                    ..Default::default()
                },
            }
        }
    };

    Ok(Some(mutation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaterialDraft, MaterialType, Topic};
    use chrono::Utc;

    struct Fixture {
        store: StudyStore,
        topic_id: String,
        ids: Vec<String>,
    }

    fn fixture() -> Fixture {
        let today = today_utc();
        let mut user = User::new("uid-1".to_string(), None, None, None, Utc::now());
        let topic_id = user.add_topic(
            Topic::new("Biology".to_string(), vec![], None, None, Utc::now()),
            today,
        );
        let ids = ["A", "B", "C"]
            .iter()
            .map(|title| {
                user.add_material(
                    &topic_id,
                    MaterialDraft {
                        material_type: MaterialType::Book,
                        title: title.to_string(),
                        url: None,
                        favicon: None,
                        rating: None,
                        order: None,
                        reading_time: Some(45),
                    },
                    Utc::now(),
                    today,
                )
                .unwrap()
            })
            .collect();
        Fixture {
            store: StudyStore::new(user),
            topic_id,
            ids,
        }
    }

    fn titles(store: &StudyStore, topic_id: &str) -> Vec<String> {
        store
            .view()
            .topic(topic_id)
            .unwrap()
            .materials
            .iter()
            .map(|m| m.title.clone())
            .collect()
    }

    #[test]
    fn click_is_optimistic_and_revertible() {
        let Fixture {
            mut store,
            topic_id,
            ids,
        } = fixture();

        let mutation = store
            .apply(Action::ClickUnit {
                topic_id: topic_id.clone(),
                material_id: ids[0].clone(),
                index: 2,
            })
            .unwrap()
            .unwrap();

        assert!(matches!(
            mutation,
            Mutation::UpdateProgress { ref body, .. } if body.completed_units == Some(3)
        ));
        let material = store.view().topic(&topic_id).unwrap().material(&ids[0]).unwrap();
        assert!(material.completed);
        assert!(store.has_pending_changes());

        store.revert();

        let material = store.view().topic(&topic_id).unwrap().material(&ids[0]).unwrap();
        assert!(!material.completed);
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn move_produces_full_batch() {
        let Fixture {
            mut store,
            topic_id,
            ..
        } = fixture();

        let mutation = store
            .apply(Action::MoveMaterial {
                topic_id: topic_id.clone(),
                from: 0,
                to: Some(2),
            })
            .unwrap();

        assert_eq!(titles(&store, &topic_id), vec!["B", "C", "A"]);
        match mutation {
            Some(Mutation::Reorder { body, .. }) => {
                let orders: Vec<i64> = body.materials.iter().map(|e| e.order).collect();
                assert_eq!(orders, vec![0, 1, 2]);
            }
            other => panic!("unexpected mutation: {:?}", other),
        }
    }

    #[test]
    fn drop_outside_is_noop() {
        let Fixture {
            mut store,
            topic_id,
            ..
        } = fixture();

        let mutation = store
            .apply(Action::MoveMaterial {
                topic_id: topic_id.clone(),
                from: 1,
                to: None,
            })
            .unwrap();

        assert!(mutation.is_none());
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn failed_action_leaves_view_untouched() {
        let Fixture {
            mut store,
            topic_id,
            ids,
        } = fixture();

        let result = store.apply(Action::ClickUnit {
            topic_id,
            material_id: ids[1].clone(),
            index: 99,
        });

        assert!(matches!(result, Err(ClientError::Rejected(_))));
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn unit_minutes_change_keeps_completion() {
        let Fixture {
            mut store,
            topic_id,
            ids,
        } = fixture();
        store
            .apply(Action::SetCompleted {
                topic_id: topic_id.clone(),
                material_id: ids[2].clone(),
                completed: true,
            })
            .unwrap();

        store
            .apply(Action::SetUnitMinutes {
                topic_id: topic_id.clone(),
                unit_minutes: 10,
            })
            .unwrap();

        let topic = store.view().topic(&topic_id).unwrap();
        let material = topic.material(&ids[2]).unwrap();
        assert!(material.completed);
        assert_eq!(material.completed_units(topic.unit_minutes), 5);
    }

    #[test]
    fn confirm_replaces_both_states() {
        let Fixture {
            mut store,
            topic_id,
            ids,
        } = fixture();
        store
            .apply(Action::DeleteMaterial {
                topic_id: topic_id.clone(),
                material_id: ids[0].clone(),
            })
            .unwrap();

        let server_copy = store.view().clone();
        store.confirm(server_copy);
        store.revert();

        assert_eq!(titles(&store, &topic_id), vec!["B", "C"]);
    }
}
