//! Session Tracker
//!
//! Holds the Open flag per player. The flag is cleared by `take_open` before
//! the caller does any persistence work, so a repeated close event for the
//! same session finds the player Idle and does nothing.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use vault_model::OwnerId;

use crate::state::SessionState;

/// Bookkeeping for one open vault container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSession {
    pub owner_id: OwnerId,
    pub opened_at: DateTime<Utc>,
}

/// Cloneable handle; clones share the same session table
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    open: Arc<RwLock<HashMap<OwnerId, OpenSession>>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle → Open. Opening again while open restarts the session.
    pub fn mark_open(&self, owner_id: OwnerId) -> OpenSession {
        let session = OpenSession {
            owner_id,
            opened_at: Utc::now(),
        };
        let previous = {
            let mut open = self.open.write();
            let previous = state_of(&open, &owner_id);
            open.insert(owner_id, session);
            previous
        };

        tracing::debug!(
            owner_id = %owner_id,
            previous = %previous,
            "Vault session opened"
        );
        session
    }

    pub fn state(&self, owner_id: &OwnerId) -> SessionState {
        state_of(&self.open.read(), owner_id)
    }

    pub fn is_open(&self, owner_id: &OwnerId) -> bool {
        self.state(owner_id) == SessionState::Open
    }

    /// Open → Idle, atomically. Returns the session only for the first close.
    pub fn take_open(&self, owner_id: &OwnerId) -> Option<OpenSession> {
        let session = {
            let mut open = self.open.write();
            if !state_of(&open, owner_id).captures_on_close() {
                return None;
            }
            open.remove(owner_id)
        };

        if let Some(session) = &session {
            let open_for = Utc::now() - session.opened_at;
            tracing::debug!(
                owner_id = %owner_id,
                open_ms = open_for.num_milliseconds(),
                "Vault session closed"
            );
        }
        session
    }

    /// Drop a session without saving, e.g. when the player disconnects
    pub fn forget(&self, owner_id: &OwnerId) -> bool {
        self.open.write().remove(owner_id).is_some()
    }

    pub fn open_count(&self) -> usize {
        self.open.read().len()
    }
}

fn state_of(open: &HashMap<OwnerId, OpenSession>, owner_id: &OwnerId) -> SessionState {
    if open.contains_key(owner_id) {
        SessionState::Open
    } else {
        SessionState::Idle
    }
}
