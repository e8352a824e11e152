use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::auth::TokenSource;
use super::traits::SearchGateway;
use super::types::{AnswerRequest, AnswerResponse, SearchOptions, SearchResult};
use crate::app::GatewayConfig;
use crate::constants::{DEFAULT_COLLECTION, DEFAULT_SERVING_CONFIG, HTTP_CONNECT_TIMEOUT_SECS};
use crate::utils::{Result, SearchError};

/// Search gateway speaking the Discovery Engine REST API
pub struct RestGateway {
    client: Client,
    base_url: String,
    engine_path: String,
    token: TokenSource,
    description: String,
}

impl RestGateway {
    /// Create a gateway from configuration
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            return Err(SearchError::ConfigError("gateway.project_id must not be empty".to_string()));
        }
        if config.engine_id.trim().is_empty() {
            return Err(SearchError::ConfigError("gateway.engine_id must not be empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::gateway(format!("failed to build HTTP client: {}", e)))?;

        let base_url = format!(
            "{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.api_version
        );
        let engine_path = format!(
            "projects/{}/locations/{}/collections/{}/engines/{}",
            config.project_id.trim(),
            config.location,
            DEFAULT_COLLECTION,
            config.engine_id.trim()
        );

        Ok(Self {
            client,
            description: format!("{} ({})", engine_path, config.api_version),
            base_url,
            engine_path,
            token: TokenSource::detect(config.access_token.as_deref()),
        })
    }

    /// Resource path of the engine, e.g. `projects/p/locations/global/...`
    pub fn engine_path(&self) -> &str {
        &self.engine_path
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.token
    }

    fn serving_url(&self, method: &str) -> String {
        format!(
            "{}/{}/servingConfigs/{}:{}",
            self.base_url, self.engine_path, DEFAULT_SERVING_CONFIG, method
        )
    }

    /// Full session resource name for a bare session id
    fn session_resource(&self, session: &str) -> String {
        if session.contains('/') {
            session.to_string()
        } else {
            format!("{}/sessions/{}", self.engine_path, session)
        }
    }

    async fn post<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let url = self.serving_url(method);
        let token = self.token.token().await?;

        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), method, "search service rejected request");
            return Err(SearchError::gateway_status(
                status.as_u16(),
                format!("REST API {} failed: {} - {}", method, status, error_text.trim()),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            SearchError::gateway_status(
                status.as_u16(),
                format!("failed to decode {} response: {}", method, e),
            )
        })
    }

    fn search_body(&self, query: &str, options: &SearchOptions) -> Value {
        let mut user_info = json!({ "timeZone": options.time_zone });
        if let Some(user) = &options.user_pseudo_id {
            user_info["userPseudoId"] = json!(user);
        }

        let mut body = json!({
            "query": query,
            "pageSize": options.page_size,
            "languageCode": options.language_code,
            "userInfo": user_info,
        });
        if options.query_expansion {
            body["queryExpansionSpec"] = json!({ "condition": "AUTO" });
        }
        if options.spell_correction {
            body["spellCorrectionSpec"] = json!({ "mode": "AUTO" });
        }
        if let Some(session) = &options.session {
            body["session"] = json!(self.session_resource(session));
        }
        body
    }

    fn answer_body(&self, request: &AnswerRequest) -> Value {
        let mut query = json!({ "text": request.query });
        if let Some(query_id) = &request.query_id {
            query["queryId"] = json!(query_id);
        }

        let mut body = json!({
            "query": query,
            "relatedQuestionsSpec": { "enable": request.enable_related_questions },
            "answerGenerationSpec": {
                "ignoreAdversarialQuery": true,
                "ignoreNonAnswerSeekingQuery": false,
                "ignoreLowRelevantContent": false,
            },
        });
        if let Some(session) = &request.session {
            body["session"] = json!(self.session_resource(session));
        }
        body
    }
}

#[async_trait]
impl SearchGateway for RestGateway {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let body = self.search_body(query, options);
        let response: SearchResponseBody = self.post("search", &body).await?;
        let results = parse_search_results(response.results);
        debug!(query, count = results.len(), "search completed");
        Ok(results)
    }

    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse> {
        let body = self.answer_body(request);
        let response: AnswerResponseBody = self.post("answer", &body).await?;
        let mut answer = parse_answer(response);

        if answer.session_id.is_none() {
            answer.session_id = request.session.clone();
        }
        if answer.query_id.is_none() {
            answer.query_id = request.query_id.clone();
        }
        Ok(answer)
    }

    fn name(&self) -> &str {
        &self.description
    }
}

// Response structures for the Discovery Engine REST API

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponseBody {
    #[serde(default)]
    results: Vec<ResultItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultItem {
    #[serde(default)]
    document: DocumentBody,
    #[serde(default)]
    rank_signals: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody {
    #[serde(default)]
    derived_struct_data: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerResponseBody {
    #[serde(default)]
    answer: Value,
    #[serde(default)]
    related_questions: Vec<Value>,
    #[serde(default)]
    search_results: Vec<ResultItem>,
    session: Option<SessionBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    name: Option<String>,
    #[serde(default)]
    turns: Vec<TurnBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnBody {
    query: Option<QueryBody>,
    answer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    query_id: Option<String>,
}

fn parse_search_results(items: Vec<ResultItem>) -> Vec<SearchResult> {
    items.into_iter().map(parse_result_item).collect()
}

fn parse_result_item(item: ResultItem) -> SearchResult {
    let data = item.document.derived_struct_data;

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let link = data.get("link").and_then(Value::as_str).map(str::to_string);

    let snippets: Vec<&str> = data
        .get("snippets")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|s| s.get("snippet").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let content = snippets.join(" ");

    // defaultRank arrives as a number or a numeric string
    let score = item.rank_signals.get("defaultRank").and_then(|rank| match rank {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });

    SearchResult {
        title,
        content,
        link,
        score,
        metadata: data,
    }
}

fn parse_answer(body: AnswerResponseBody) -> AnswerResponse {
    let answer_text = match &body.answer {
        Value::String(text) => text.clone(),
        Value::Object(obj) => obj
            .get("answerText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    // Newer responses nest related questions as plain strings under `answer`
    let mut related_questions: Vec<String> = body
        .answer
        .get("relatedQuestions")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(question_text).collect())
        .unwrap_or_default();
    related_questions.extend(body.related_questions.iter().filter_map(question_text));

    let last_turn = body.session.as_ref().and_then(|s| s.turns.last());
    let query_id = last_turn
        .and_then(|t| t.query.as_ref())
        .and_then(|q| q.query_id.clone());
    let answer_id = body
        .answer
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| last_turn.and_then(|t| t.answer.clone()));
    let session_id = body
        .session
        .as_ref()
        .and_then(|s| s.name.as_deref())
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    AnswerResponse {
        answer_text,
        related_questions,
        search_results: parse_search_results(body.search_results),
        session_id,
        query_id,
        answer_id,
    }
}

fn question_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
