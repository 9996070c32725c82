// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{EntityDraft, EntityId, JobStatusReport};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for session operation sequences.
pub mod strategies {
    use crate::EntityId;
    use proptest::prelude::*;

    /// One user-level operation against a session.
    #[derive(Debug, Clone)]
    pub enum SessionOp {
        Select(EntityId),
        Edit(String),
    }

    /// A small fixed pool so sequences revisit entities.
    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        prop_oneof![
            Just(EntityId::new("a.cpp")),
            Just(EntityId::new("b.cpp")),
            Just(EntityId::new("tests/login.robot")),
        ]
    }

    pub fn arb_session_op() -> impl Strategy<Value = SessionOp> {
        prop_oneof![
            arb_entity_id().prop_map(SessionOp::Select),
            "[a-z]{0,6}".prop_map(SessionOp::Edit),
        ]
    }
}

// ── Factory functions ───────────────────────────────────────────────────

/// Draft whose content was loaded from the backend.
pub fn loaded_draft(entity: &str, content: &str) -> EntityDraft {
    let mut draft = EntityDraft::new(EntityId::new(entity));
    draft.replace_persisted(content);
    draft.hydration = crate::Hydration::Loaded;
    draft
}

/// `running` reports followed by one completed generation report.
pub fn generation_script(running_polls: usize, content: &str) -> Vec<JobStatusReport> {
    let mut script = vec![JobStatusReport::running(); running_polls];
    script.push(JobStatusReport::completed().with_content(content));
    script
}
