// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity editable draft state.

use crate::id::EntityId;
use crate::job::JobResult;
use serde::{Deserialize, Serialize};

/// Whether previously saved content has been pulled from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hydration {
    /// No load result applied yet
    #[default]
    Pending,
    /// Saved content was loaded
    Loaded,
    /// The backend has nothing saved for this entity
    Missing,
}

crate::simple_display! {
    Hydration {
        Pending => "pending",
        Loaded => "loaded",
        Missing => "missing",
    }
}

/// Editable session state for one entity.
///
/// `is_dirty` always equals `content != persisted`; every writer goes
/// through the methods below to keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    pub entity_id: EntityId,
    pub content: String,
    /// Last content obtained from the backend (load, save, or generation)
    pub persisted: String,
    pub last_result: Option<JobResult>,
    pub log_text: String,
    pub is_dirty: bool,
    /// Bumped on every content change; tags hydration requests
    pub revision: u64,
    pub hydration: Hydration,
    pub updated_at_ms: u64,
}

impl EntityDraft {
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            content: String::new(),
            persisted: String::new(),
            last_result: None,
            log_text: String::new(),
            is_dirty: false,
            revision: 0,
            hydration: Hydration::Pending,
            updated_at_ms: 0,
        }
    }

    /// User edit. Returns true if the content actually changed.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }
        self.content = content;
        self.revision += 1;
        self.refresh_dirty();
        true
    }

    /// Content came from the backend: it is both current and persisted.
    pub fn replace_persisted(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content != self.content {
            self.revision += 1;
        }
        self.persisted = content.clone();
        self.content = content;
        self.refresh_dirty();
    }

    /// A save of `saved` succeeded. Edits made while the save was in flight
    /// keep the draft dirty.
    pub fn mark_saved(&mut self, saved: impl Into<String>) {
        self.persisted = saved.into();
        self.refresh_dirty();
    }

    /// Untouched since creation and never hydrated.
    pub fn is_pristine(&self) -> bool {
        self.hydration == Hydration::Pending && self.revision == 0
    }

    pub fn set_log(&mut self, log: impl Into<String>) {
        self.log_text = log.into();
    }

    fn refresh_dirty(&mut self) {
        self.is_dirty = self.content != self.persisted;
    }
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
