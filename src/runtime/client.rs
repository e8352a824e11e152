use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    analysis::{classify, SowAnalysis},
    app::{Config, SearchConfig},
    gateway::{AnswerRequest, AnswerResponse, RestGateway, SearchGateway, SearchOptions, SearchResult},
    session::{self, Session, SessionStore, Turn},
    utils::Result,
};

/// Outcome of a SOW analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SowReport {
    pub query: String,
    pub analysis: SowAnalysis,
    pub raw_results: Vec<SearchResult>,
}

/// High-level client: search gateway plus local session bookkeeping
pub struct SearchClient {
    gateway: Arc<dyn SearchGateway>,
    sessions: Arc<SessionStore>,
    defaults: SearchConfig,
}

impl SearchClient {
    /// Create a client around any gateway
    pub fn new(gateway: Arc<dyn SearchGateway>, defaults: SearchConfig) -> Self {
        Self::with_sessions(gateway, Arc::new(SessionStore::new()), defaults)
    }

    /// Create a client sharing an existing session store
    pub fn with_sessions(
        gateway: Arc<dyn SearchGateway>,
        sessions: Arc<SessionStore>,
        defaults: SearchConfig,
    ) -> Self {
        Self {
            gateway,
            sessions,
            defaults,
        }
    }

    /// Create a client talking to the REST API described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = RestGateway::new(&config.gateway)?;
        Ok(Self::new(Arc::new(gateway), config.search.clone()))
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Request options seeded from the configured defaults
    pub fn options(&self) -> SearchOptions {
        self.defaults.options()
    }

    /// Plain search
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.gateway.search(query, options).await
    }

    /// Generate an answer
    pub async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse> {
        self.gateway.answer(request).await
    }

    /// Search, then generate an answer, returning both together
    pub async fn search_with_answer(
        &self,
        query: &str,
        options: &SearchOptions,
        enable_related_questions: bool,
    ) -> Result<AnswerResponse> {
        let results = self.gateway.search(query, options).await?;

        let request = AnswerRequest {
            query: query.to_string(),
            query_id: None,
            session: options.session.clone(),
            enable_related_questions,
        };
        let mut answer = self.gateway.answer(&request).await?;
        answer.search_results = results;
        Ok(answer)
    }

    /// Search with answer inside a conversational session.
    ///
    /// Without a session id (or with `start_new`) a fresh provisional session
    /// is created. A provisional id coming back from the caller is confirmed
    /// before use. The turn is recorded when the service reports a query id.
    pub async fn conversational_search(
        &self,
        query: &str,
        session_id: Option<&str>,
        user_pseudo_id: Option<&str>,
        start_new: bool,
    ) -> Result<AnswerResponse> {
        let session_id = match session_id {
            Some(id) if !start_new => {
                if session::is_provisional(id) {
                    self.sessions
                        .mark_confirmed(id)
                        .map(|confirmed| confirmed.to_wire())
                        .unwrap_or_else(|| session::confirm(id).to_string())
                } else {
                    id.to_string()
                }
            }
            _ => self.sessions.create(user_pseudo_id).to_wire(),
        };

        let mut options = self.options();
        options.user_pseudo_id = user_pseudo_id.map(str::to_string);
        options.session = Some(session_id.clone());

        let mut answer = self.search_with_answer(query, &options, true).await?;

        if let Some(query_id) = &answer.query_id {
            let answer_id = answer
                .answer_id
                .clone()
                .unwrap_or_else(|| format!("answer_{}", query_id));
            self.sessions
                .record_turn(&session_id, query, query_id, &answer_id);
        } else {
            debug!(session = %session_id, "no query id returned, turn not recorded");
        }

        answer.session_id = Some(session_id);
        Ok(answer)
    }

    pub fn session_info(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)
    }

    pub fn list_sessions(&self, user_pseudo_id: Option<&str>) -> Vec<Session> {
        self.sessions.list(user_pseudo_id)
    }

    pub fn session_history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions.history(session_id)
    }

    pub fn end_session(&self, session_id: &str) {
        self.sessions.end(session_id)
    }

    /// Drop sessions older than `max_age_hours`.
    /// Negative or out-of-range ages keep everything.
    pub fn cleanup_sessions(&self, max_age_hours: i64) -> usize {
        if max_age_hours < 0 {
            warn!(max_age_hours, "negative session max age, skipping cleanup");
            return 0;
        }
        match Duration::try_hours(max_age_hours) {
            Some(max_age) => self.sessions.sweep(max_age),
            None => {
                debug!(max_age_hours, "session max age out of range, skipping cleanup");
                0
            }
        }
    }

    /// Search for SOW documents and group them by identifier
    pub async fn analyze_sows(&self, query: &str, page_size: usize) -> Result<SowReport> {
        let options = SearchOptions {
            page_size,
            query_expansion: true,
            spell_correction: true,
            ..self.options()
        };

        let raw_results = self.gateway.search(query, &options).await?;
        let analysis = classify(&raw_results);
        info!(
            query,
            documents = analysis.total,
            groups = analysis.group_count(),
            "SOW analysis complete"
        );

        Ok(SowReport {
            query: query.to_string(),
            analysis,
            raw_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockSearchGateway;
    use crate::utils::SearchError;
    use pretty_assertions::assert_eq;

    fn client(mock: MockSearchGateway) -> SearchClient {
        SearchClient::new(Arc::new(mock), SearchConfig::default())
    }

    fn answered(query_id: Option<&str>) -> AnswerResponse {
        AnswerResponse {
            answer_text: "Three SOWs are active.".to_string(),
            related_questions: vec!["Which one ends first?".to_string()],
            query_id: query_id.map(str::to_string),
            ..AnswerResponse::default()
        }
    }

    #[tokio::test]
    async fn test_search_with_answer_attaches_results() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search()
            .times(1)
            .returning(|_, _| Ok(vec![SearchResult::new("SOW#1", "body")]));
        mock.expect_answer()
            .withf(|request| request.query_id.is_none() && request.enable_related_questions)
            .times(1)
            .returning(|_| Ok(answered(None)));

        let client = client(mock);
        let answer = client
            .search_with_answer("how many SOWs?", &client.options(), true)
            .await
            .unwrap();

        assert_eq!(answer.answer_text, "Three SOWs are active.");
        assert_eq!(answer.search_results.len(), 1);
        assert_eq!(answer.search_results[0].title, "SOW#1");
    }

    #[tokio::test]
    async fn test_conversational_search_creates_session_and_records_turn() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search()
            .withf(|_, options| {
                options.user_pseudo_id.as_deref() == Some("user-1")
                    && options.session.as_deref().is_some_and(session::is_provisional)
            })
            .returning(|_, _| Ok(vec![]));
        mock.expect_answer()
            .withf(|request| request.session.is_some())
            .returning(|_| Ok(answered(Some("q-1"))));

        let client = client(mock);
        let answer = client
            .conversational_search("first question", None, Some("user-1"), false)
            .await
            .unwrap();

        let session_id = answer.session_id.clone().unwrap();
        assert!(session::is_provisional(&session_id));

        let history = client.session_history(&session_id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query_text, "first question");
        assert_eq!(history[0].query_id, "q-1");
        assert_eq!(history[0].answer_id, "answer_q-1");
        assert_eq!(client.list_sessions(Some("user-1")).len(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_confirms_provisional_session() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search().returning(|_, _| Ok(vec![]));
        let mut seq = 0;
        mock.expect_answer().returning(move |_| {
            seq += 1;
            let mut answer = answered(Some(&format!("q-{}", seq)));
            answer.answer_id = Some(format!("a-{}", seq));
            Ok(answer)
        });

        let client = client(mock);
        let first = client
            .conversational_search("first", None, None, false)
            .await
            .unwrap();
        let provisional = first.session_id.unwrap();

        let second = client
            .conversational_search("second", Some(&provisional), None, false)
            .await
            .unwrap();
        let confirmed = second.session_id.unwrap();

        assert_eq!(confirmed, session::confirm(&provisional));
        assert!(!client.session_info(&confirmed).unwrap().session_id.is_provisional());

        let history = client.session_history(&confirmed);
        let queries: Vec<&str> = history.iter().map(|t| t.query_text.as_str()).collect();
        assert_eq!(queries, vec!["first", "second"]);
        assert_eq!(history[1].answer_id, "a-2");
    }

    #[tokio::test]
    async fn test_start_new_ignores_existing_session() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search().returning(|_, _| Ok(vec![]));
        mock.expect_answer().returning(|_| Ok(answered(None)));

        let client = client(mock);
        let existing = client.sessions().create(None).to_wire();
        let answer = client
            .conversational_search("again", Some(&existing), None, true)
            .await
            .unwrap();

        assert_ne!(answer.session_id.as_deref(), Some(existing.as_str()));
        assert_eq!(client.sessions().len(), 2);
        // no query id, nothing recorded
        assert!(client
            .session_history(answer.session_id.as_deref().unwrap())
            .is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_surfaced() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search()
            .returning(|_, _| Err(SearchError::gateway_status(403, "permission denied")));
        mock.expect_answer().never();

        let client = client(mock);
        let err = client
            .conversational_search("q", None, None, false)
            .await
            .unwrap_err();

        assert!(err.is_gateway());
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_analyze_sows() {
        let mut mock = MockSearchGateway::new();
        mock.expect_search()
            .withf(|query, options| {
                query.contains("SOW") && options.page_size == 50 && options.query_expansion
            })
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    SearchResult::new("CHR_SOW#1 Intro", "a"),
                    SearchResult::new("SOW#1 Appendix", "b"),
                    SearchResult::new("Random Doc", "c"),
                    SearchResult::new("SOW#2", "d"),
                ])
            });

        let report = client(mock).analyze_sows("SOW", 50).await.unwrap();

        assert_eq!(report.query, "SOW");
        assert_eq!(report.raw_results.len(), 4);
        assert_eq!(report.analysis.total, 4);
        assert_eq!(report.analysis.group_count(), 2);
        assert_eq!(report.analysis.groups["SOW#1"].documents.len(), 2);
        assert_eq!(report.analysis.unclassified[0].title, "Random Doc");
    }

    #[test]
    fn test_cleanup_sessions() {
        let client = client(MockSearchGateway::new());
        client.sessions().create(None);
        client.sessions().create(Some("u"));

        assert_eq!(client.cleanup_sessions(24), 0);
        assert_eq!(client.cleanup_sessions(0), 2);
        assert!(client.list_sessions(None).is_empty());
    }

    #[test]
    fn test_cleanup_sessions_with_extreme_ages_keeps_everything() {
        let client = client(MockSearchGateway::new());
        let id = client.sessions().create(None).to_wire();
        client.sessions().record_turn(&id, "q", "q1", "a1");

        assert_eq!(client.cleanup_sessions(i64::MAX / 1000), 0);
        assert_eq!(client.cleanup_sessions(i64::MAX), 0);
        assert_eq!(client.cleanup_sessions(-1), 0);
        assert_eq!(client.session_history(&id).len(), 1);
    }
}
