/// Runtime module - Gateway

mod chat;
mod client;
mod report;

pub use chat::{ChatInput, ChatSession};
pub use client::{SearchClient, SowReport};
pub use report::{format_answer, format_history, format_results, format_sessions, format_sow_report};
