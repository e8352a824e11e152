/// Session management module - Gateway

mod store;
mod types;

pub use store::SessionStore;
pub use types::{confirm, is_provisional, Session, SessionId, SessionKind, SessionState, Turn};
