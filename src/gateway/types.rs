use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_LANGUAGE_CODE, DEFAULT_PAGE_SIZE, DEFAULT_TIME_ZONE};

/// A single document returned by the search service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// Snippets joined with a space
    pub content: String,
    pub link: Option<String>,
    pub score: Option<f64>,
    /// Everything the service reported about the document
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Knobs for a search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub page_size: usize,
    pub query_expansion: bool,
    pub spell_correction: bool,
    pub language_code: String,
    pub time_zone: String,
    pub user_pseudo_id: Option<String>,
    /// Wire form of the session id, provisional or confirmed
    pub session: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            query_expansion: true,
            spell_correction: true,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            user_pseudo_id: None,
            session: None,
        }
    }
}

/// Request for a generated answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    /// Query id from a previous search, if any
    pub query_id: Option<String>,
    pub session: Option<String>,
    pub enable_related_questions: bool,
}

impl AnswerRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_id: None,
            session: None,
            enable_related_questions: true,
        }
    }
}

/// Generated answer plus whatever the service returned with it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer_text: String,
    pub related_questions: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub session_id: Option<String>,
    pub query_id: Option<String>,
    pub answer_id: Option<String>,
}
