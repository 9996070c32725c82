// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active selection: which entity is open, and its live editing buffer.
//!
//! The selected entity's draft lives in the live buffer rather than the
//! store. Switching commits the buffer back to the store before anything
//! is loaded for the incoming entity. All writers route through
//! [`Selection::with_draft`], which targets the buffer when the entity is
//! selected and the store otherwise, so a later commit never overwrites a
//! background write with stale state.
//!
//! Hydration requests are tagged with `(entity, ticket, revision)`. A result
//! is applied only if the entity is still selected, the ticket is the latest
//! issued for it, and the draft's content revision has not moved since the
//! request went out.

use crate::store::DraftStore;
use std::collections::HashMap;
use tb_adapters::RemoteError;
use tb_core::{EntityDraft, EntityId, Hydration};
use tokio_util::sync::CancellationToken;

/// Identifies one hydration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationTag {
    pub entity: EntityId,
    pub ticket: u64,
    /// Content revision of the draft when the request was issued
    pub revision: u64,
}

/// Result of [`Selection::select`]
#[derive(Debug)]
pub enum SelectOutcome {
    /// Already selected
    Unchanged,
    /// Loaded from the store; nothing to fetch
    Loaded,
    /// Start this hydration; abandon it when the token is cancelled
    Hydrate(HydrationTag, CancellationToken),
}

/// What happened to a hydration result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Saved content replaced the empty draft
    Applied,
    /// Nothing saved on the backend; the draft stays empty
    Missing,
    /// The backend call failed; the draft stays empty and pending
    Failed(RemoteError),
    /// Stale: a newer request, a deselection, or an edit got there first
    Discarded(&'static str),
}

struct InFlight {
    ticket: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
pub struct Selection {
    live: Option<EntityDraft>,
    next_ticket: u64,
    in_flight: HashMap<EntityId, InFlight>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&EntityId> {
        self.live.as_ref().map(|draft| &draft.entity_id)
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.current() == Some(id)
    }

    /// Switch the selection to `id`.
    ///
    /// Hydration tokens are children of `parent`, so cancelling the session
    /// abandons every fetch.
    pub fn select(
        &mut self,
        store: &mut DraftStore,
        id: EntityId,
        parent: &CancellationToken,
    ) -> SelectOutcome {
        if self.is_selected(&id) {
            return SelectOutcome::Unchanged;
        }

        // Commit the outgoing buffer exactly as it is before switching
        self.commit(store);

        let draft = match store.get(&id) {
            Some(draft) => draft.clone(),
            None => {
                let draft = EntityDraft::new(id.clone());
                store.put(id.clone(), draft.clone());
                draft
            }
        };
        let needs_hydration = draft.is_pristine();
        let revision = draft.revision;
        self.live = Some(draft);

        if !needs_hydration {
            return SelectOutcome::Loaded;
        }

        self.next_ticket += 1;
        let cancel = parent.child_token();
        if let Some(previous) = self
            .in_flight
            .insert(id.clone(), InFlight { ticket: self.next_ticket, cancel: cancel.clone() })
        {
            previous.cancel.cancel();
        }
        SelectOutcome::Hydrate(HydrationTag { entity: id, ticket: self.next_ticket, revision }, cancel)
    }

    /// Write the live buffer back to the store and clear the selection.
    /// The outgoing entity's hydration, if any, is cancelled.
    pub fn commit(&mut self, store: &mut DraftStore) -> Option<EntityId> {
        let outgoing = self.live.take()?;
        let id = outgoing.entity_id.clone();
        if let Some(in_flight) = self.in_flight.remove(&id) {
            tracing::debug!(entity = %id, ticket = in_flight.ticket, "abandoning hydration");
            in_flight.cancel.cancel();
        }
        store.put(id.clone(), outgoing);
        Some(id)
    }

    /// Apply `f` to the entity's draft, wherever it currently lives.
    pub fn with_draft<T>(
        &mut self,
        store: &mut DraftStore,
        id: &EntityId,
        f: impl FnOnce(&mut EntityDraft) -> T,
    ) -> T {
        match self.live.as_mut() {
            Some(live) if live.entity_id == *id => {
                let out = f(live);
                store.notify(id.clone());
                out
            }
            _ => store.update(id, f),
        }
    }

    /// Current state of the entity's draft, live buffer first.
    pub fn snapshot(&self, store: &DraftStore, id: &EntityId) -> Option<EntityDraft> {
        match &self.live {
            Some(live) if live.entity_id == *id => Some(live.clone()),
            _ => store.get(id).cloned(),
        }
    }

    /// Apply or discard a hydration result according to its tag.
    pub fn apply_hydration(
        &mut self,
        store: &mut DraftStore,
        tag: &HydrationTag,
        result: Result<String, RemoteError>,
    ) -> HydrationOutcome {
        match self.in_flight.get(&tag.entity) {
            Some(in_flight) if in_flight.ticket == tag.ticket => {
                self.in_flight.remove(&tag.entity);
            }
            _ => return HydrationOutcome::Discarded("superseded"),
        }

        let Some(live) = self.live.as_mut().filter(|live| live.entity_id == tag.entity) else {
            return HydrationOutcome::Discarded("not selected");
        };
        if live.revision != tag.revision {
            return HydrationOutcome::Discarded("edited");
        }

        let outcome = match result {
            Ok(content) => {
                live.replace_persisted(content);
                live.hydration = Hydration::Loaded;
                HydrationOutcome::Applied
            }
            Err(RemoteError::NotFound(_)) => {
                live.hydration = Hydration::Missing;
                HydrationOutcome::Missing
            }
            Err(err) => {
                live.set_log(format!("Could not load saved draft: {err}"));
                HydrationOutcome::Failed(err)
            }
        };
        store.notify(tag.entity.clone());
        outcome
    }

    /// Forget a cancelled hydration if it is still the latest one.
    pub fn abandon_hydration(&mut self, tag: &HydrationTag) {
        if self.in_flight.get(&tag.entity).is_some_and(|f| f.ticket == tag.ticket) {
            self.in_flight.remove(&tag.entity);
        }
    }

    pub fn hydrating(&self, id: &EntityId) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn cancel_hydrations(&mut self) {
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
