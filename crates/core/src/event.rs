// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifications delivered to session subscribers.

use crate::id::EntityId;
use crate::job::{JobId, JobStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The entity's draft was written (store or live buffer)
    DraftChanged { entity: EntityId },
    /// The selected entity changed
    Selected { entity: EntityId },
    /// A job reached a terminal state
    JobFinished { entity: EntityId, job: JobId, status: JobStatus },
    /// A user-facing message (request failures, timeouts)
    Notice { entity: EntityId, message: String },
}

impl SessionEvent {
    pub fn entity(&self) -> &EntityId {
        match self {
            SessionEvent::DraftChanged { entity }
            | SessionEvent::Selected { entity }
            | SessionEvent::JobFinished { entity, .. }
            | SessionEvent::Notice { entity, .. } => entity,
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::DraftChanged { entity } => write!(f, "draft:changed {entity}"),
            SessionEvent::Selected { entity } => write!(f, "entity:selected {entity}"),
            SessionEvent::JobFinished { entity, job, status } => {
                write!(f, "job:{status} {entity} ({job})")
            }
            SessionEvent::Notice { entity, message } => write!(f, "notice {entity}: {message}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
