// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity state store: the session's map of entity id to draft.
//!
//! Pure in-memory bookkeeping. Every write notifies subscribers with
//! [`SessionEvent::DraftChanged`]; a subscriber that falls behind loses the
//! oldest notifications instead of blocking writers.

use std::collections::HashMap;
use tb_core::{EntityDraft, EntityId, SessionEvent};
use tokio::sync::broadcast;

pub struct DraftStore {
    drafts: HashMap<EntityId, EntityDraft>,
    events: broadcast::Sender<SessionEvent>,
}

impl DraftStore {
    pub fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        Self { drafts: HashMap::new(), events }
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityDraft> {
        self.drafts.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.drafts.contains_key(id)
    }

    /// Replace the draft for `id` wholesale.
    pub fn put(&mut self, id: EntityId, mut draft: EntityDraft) {
        draft.entity_id = id.clone();
        self.drafts.insert(id.clone(), draft);
        self.notify(id);
    }

    /// Mutate the draft for `id` in place, creating an empty one first if
    /// none exists.
    pub fn update<T>(&mut self, id: &EntityId, f: impl FnOnce(&mut EntityDraft) -> T) -> T {
        let draft = self.drafts.entry(id.clone()).or_insert_with(|| EntityDraft::new(id.clone()));
        let out = f(draft);
        self.notify(id.clone());
        out
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.drafts.keys()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Announce a change made outside `put`/`update` (the live buffer).
    pub(crate) fn notify(&self, entity: EntityId) {
        // No subscribers is fine
        let _ = self.events.send(SessionEvent::DraftChanged { entity });
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
