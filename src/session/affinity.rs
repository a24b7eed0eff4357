//! Session affinity for tier stickiness
//!
//! Maps a session identifier to the tier and model chosen on its first routed
//! request so later turns reuse that choice. The tier is sticky for the life
//! of the session; only the model is rewritten when the pinned model has to be
//! skipped for health reasons.
//!
//! Every session has its own lock. The router holds it across a whole routing
//! decision, so reads and pins for one session are linearizable while
//! unrelated sessions proceed in parallel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::tiers::Tier;

/// A session's tier/model binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionAffinity {
    /// Tier fixed on the session's first request
    pub tier: Tier,
    /// Model currently pinned for the session
    pub model: String,
    /// When the session was first pinned
    pub pinned_at: DateTime<Utc>,
    /// When the session was last routed
    pub last_used_at: DateTime<Utc>,
}

impl SessionAffinity {
    fn new(tier: Tier, model: &str) -> Self {
        let now = Utc::now();
        Self {
            tier,
            model: model.to_string(),
            pinned_at: now,
            last_used_at: now,
        }
    }
}

/// Per-session slot; `None` until the session is first pinned
pub type SessionSlot = Arc<Mutex<Option<SessionAffinity>>>;

/// Pin a slot to a tier and model
pub(crate) fn pin_slot(
    slot: &mut Option<SessionAffinity>,
    tier: Tier,
    model: &str,
) -> SessionAffinity {
    let affinity = SessionAffinity::new(tier, model);
    *slot = Some(affinity.clone());
    affinity
}

/// Replace the pinned model in a slot; an empty slot gets a fresh pin with `tier`
pub(crate) fn repin_slot(
    slot: &mut Option<SessionAffinity>,
    tier: Tier,
    model: &str,
) -> SessionAffinity {
    match slot.as_mut() {
        Some(affinity) => {
            affinity.model = model.to_string();
            affinity.last_used_at = Utc::now();
            affinity.clone()
        }
        None => pin_slot(slot, tier, model),
    }
}

/// Refresh a pinned slot's activity time
pub(crate) fn touch_slot(slot: &mut Option<SessionAffinity>) {
    if let Some(affinity) = slot.as_mut() {
        affinity.last_used_at = Utc::now();
    }
}

/// In-memory session affinity store
#[derive(Default)]
pub struct SessionAffinityStore {
    slots: DashMap<String, SessionSlot>,
}

impl SessionAffinityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for a session, created empty if missing
    ///
    /// Lock the returned slot to read and update the session atomically.
    pub fn slot(&self, session_id: &str) -> SessionSlot {
        if let Some(slot) = self.slots.get(session_id) {
            return slot.clone();
        }
        self.slots
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Current binding for a session
    pub fn get(&self, session_id: &str) -> Option<SessionAffinity> {
        let slot = self.slots.get(session_id)?.clone();
        let affinity = slot.lock().clone();
        if affinity.is_some() {
            debug!(session_id = %session_id, "Session affinity hit");
        }
        affinity
    }

    /// Pin a session to a tier and model
    #[instrument(skip(self), fields(session_id = %session_id, tier = %tier, model = %model))]
    pub fn pin(&self, session_id: &str, tier: Tier, model: &str) -> SessionAffinity {
        let slot = self.slot(session_id);
        let affinity = pin_slot(&mut slot.lock(), tier, model);
        debug!("Session pinned");
        affinity
    }

    /// Move a session to a new model, keeping its tier
    ///
    /// An unknown session is not an error: it is pinned fresh with `tier`.
    #[instrument(skip(self), fields(session_id = %session_id, model = %model))]
    pub fn repin(&self, session_id: &str, model: &str, tier: Tier) -> SessionAffinity {
        let slot = self.slot(session_id);
        let affinity = repin_slot(&mut slot.lock(), tier, model);
        debug!("Session repinned");
        affinity
    }

    /// Drop a session's binding
    pub fn remove(&self, session_id: &str) -> Option<SessionAffinity> {
        self.slots
            .remove(session_id)
            .and_then(|(_, slot)| {
                let affinity = slot.lock().clone();
                affinity
            })
    }

    /// Drop a session's slot if nothing was pinned and no route holds it
    pub(crate) fn discard_unpinned(&self, session_id: &str) {
        self.slots.remove_if(session_id, |_, slot| {
            Arc::strong_count(slot) == 1
                && slot.try_lock().is_some_and(|guard| guard.is_none())
        });
    }

    /// Number of slots, pinned or not
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of pinned sessions
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().lock().is_some())
            .count()
    }

    /// Whether no session is pinned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions idle for longer than `max_idle`
    ///
    /// Sessions an in-flight route has fetched or locked are kept.
    /// Returns the number of evicted sessions.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
        else {
            return 0;
        };
        let before = self.slots.len();

        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Some(guard) => match &*guard {
                    Some(affinity) => affinity.last_used_at >= cutoff,
                    None => false,
                },
                None => true,
            }
        });

        let evicted = before.saturating_sub(self.slots.len());
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }
}
