use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::PROVISIONAL_MARKER;

/// Whether the search service has acknowledged a session yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    /// Created locally, not yet confirmed by the gateway
    Provisional,
    /// Acknowledged by the gateway; the canonical id is used from here on
    Confirmed,
}

/// A session identifier with its confirmation state made explicit.
///
/// On the wire a provisional id is the canonical key followed by a trailing
/// `-`. Internally the key never carries the marker, so both spellings of the
/// same session resolve to one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    key: String,
    kind: SessionKind,
}

impl SessionId {
    /// A fresh provisional id around the given key
    pub fn provisional(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: SessionKind::Provisional,
        }
    }

    /// Parse the external string form
    pub fn parse(raw: &str) -> Self {
        if is_provisional(raw) {
            Self {
                key: confirm(raw).to_string(),
                kind: SessionKind::Provisional,
            }
        } else {
            Self {
                key: raw.to_string(),
                kind: SessionKind::Confirmed,
            }
        }
    }

    /// The canonical key, without the provisional marker
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn is_provisional(&self) -> bool {
        self.kind == SessionKind::Provisional
    }

    /// The same session, confirmed
    pub fn confirmed(&self) -> Self {
        Self {
            key: self.key.clone(),
            kind: SessionKind::Confirmed,
        }
    }

    /// The string callers pass to the gateway
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SessionKind::Provisional => write!(f, "{}{}", self.key, PROVISIONAL_MARKER),
            SessionKind::Confirmed => f.write_str(&self.key),
        }
    }
}

impl Serialize for SessionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// True iff the id carries the trailing provisional marker.
/// Pure string check; the session does not need to exist.
pub fn is_provisional(session_id: &str) -> bool {
    session_id.ends_with(PROVISIONAL_MARKER)
}

/// Strip the provisional marker. Idempotent.
pub fn confirm(session_id: &str) -> &str {
    session_id.trim_end_matches(PROVISIONAL_MARKER)
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("IN_PROGRESS"),
            Self::Completed => f.write_str("COMPLETED"),
        }
    }
}

/// One query/answer exchange recorded against a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub query_text: String,
    pub query_id: String,
    pub answer_id: String,
    pub timestamp: DateTime<Local>,
}

/// A conversational session and its turn log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: Option<String>,
    pub state: SessionState,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub turns: Vec<Turn>,
}

impl Session {
    pub(crate) fn new(session_id: SessionId, user_id: Option<String>) -> Self {
        Self {
            session_id,
            user_id,
            state: SessionState::InProgress,
            start_time: Local::now(),
            end_time: None,
            turns: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::InProgress
    }

    /// Get a summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} turn(s) | started {}{}",
            self.session_id,
            self.state,
            self.turns.len(),
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.user_id
                .as_deref()
                .map(|u| format!(" | user {}", u))
                .unwrap_or_default()
        )
    }
}
