use chrono::{DateTime, Duration, Local};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{self, Session, SessionId, SessionState, Turn};

struct Entry {
    /// Creation order, used to keep listings deterministic
    seq: u64,
    session: Session,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Entry>,
    next_seq: u64,
}

/// In-memory store for conversational sessions and their turn history.
///
/// Records are keyed by the canonical session key, so the provisional
/// (`abc-`) and confirmed (`abc`) spellings of an id address the same
/// session. Unknown ids are never an error: lookups come back empty and
/// mutations are silent no-ops, since turn recording races with cleanup.
///
/// Mutations take the write lock; lookups share the read lock.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session and return its provisional id.
    ///
    /// Ids are never reused, even after a sweep: that rests on UUIDv4, the
    /// map check below only guards against live collisions.
    pub fn create(&self, user_id: Option<&str>) -> SessionId {
        let mut inner = self.inner.write();

        let mut key = Uuid::new_v4().simple().to_string();
        while inner.sessions.contains_key(&key) {
            key = Uuid::new_v4().simple().to_string();
        }

        let id = SessionId::provisional(key.clone());
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.sessions.insert(
            key,
            Entry {
                seq,
                session: Session::new(id.clone(), user_id.map(str::to_string)),
            },
        );

        debug!(session = %id, user = ?user_id, "session created");
        id
    }

    /// Look up a session by either spelling of its id
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let inner = self.inner.read();
        inner
            .sessions
            .get(types::confirm(session_id))
            .map(|entry| entry.session.clone())
    }

    /// See [`types::is_provisional`]
    pub fn is_provisional(session_id: &str) -> bool {
        types::is_provisional(session_id)
    }

    /// See [`types::confirm`]. Does not touch stored records.
    pub fn confirm(session_id: &str) -> &str {
        types::confirm(session_id)
    }

    /// Mark the stored record as acknowledged by the gateway.
    /// Returns the confirmed id, or `None` when the session is unknown.
    pub fn mark_confirmed(&self, session_id: &str) -> Option<SessionId> {
        let mut inner = self.inner.write();
        let entry = inner.sessions.get_mut(types::confirm(session_id))?;
        if entry.session.session_id.is_provisional() {
            entry.session.session_id = entry.session.session_id.confirmed();
            debug!(session = %entry.session.session_id, "session confirmed");
        }
        Some(entry.session.session_id.clone())
    }

    /// Append a turn to the session's history. No-op for unknown sessions.
    pub fn record_turn(&self, session_id: &str, query_text: &str, query_id: &str, answer_id: &str) {
        let mut inner = self.inner.write();
        match inner.sessions.get_mut(types::confirm(session_id)) {
            Some(entry) => {
                entry.session.turns.push(Turn {
                    query_text: query_text.to_string(),
                    query_id: query_id.to_string(),
                    answer_id: answer_id.to_string(),
                    timestamp: Local::now(),
                });
                debug!(
                    session = %session_id,
                    turns = entry.session.turns.len(),
                    "turn recorded"
                );
            }
            None => debug!(session = %session_id, "turn dropped for unknown session"),
        }
    }

    /// Complete a session. No-op when unknown or already completed.
    pub fn end(&self, session_id: &str) {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.sessions.get_mut(types::confirm(session_id)) {
            if entry.session.state == SessionState::InProgress {
                entry.session.end_time = Some(Local::now());
                entry.session.state = SessionState::Completed;
                debug!(session = %session_id, "session ended");
            }
        }
    }

    /// Active sessions in creation order, optionally for one user only
    pub fn list(&self, user_id: Option<&str>) -> Vec<Session> {
        let inner = self.inner.read();
        let mut entries: Vec<&Entry> = inner
            .sessions
            .values()
            .filter(|entry| entry.session.is_active())
            .filter(|entry| match user_id {
                Some(user) => entry.session.user_id.as_deref() == Some(user),
                None => true,
            })
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.session.clone()).collect()
    }

    /// The session's turn log, empty when the session is unknown
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let inner = self.inner.read();
        inner
            .sessions
            .get(types::confirm(session_id))
            .map(|entry| entry.session.turns.clone())
            .unwrap_or_default()
    }

    /// Remove every session at least `max_age` old, whatever its state.
    /// Returns how many were removed. An age reaching past the representable
    /// range removes nothing.
    pub fn sweep(&self, max_age: Duration) -> usize {
        match Local::now().checked_sub_signed(max_age) {
            Some(cutoff) => self.sweep_before(cutoff),
            None => {
                debug!(?max_age, "sweep cutoff out of range, nothing removed");
                0
            }
        }
    }

    /// Remove every session started at or before `cutoff`
    pub fn sweep_before(&self, cutoff: DateTime<Local>) -> usize {
        let mut inner = self.inner.write();
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, entry| entry.session.start_time > cutoff);
        let removed = before - inner.sessions.len();
        if removed > 0 {
            info!(removed, remaining = inner.sessions.len(), "swept old sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
