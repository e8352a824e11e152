use async_trait::async_trait;

use super::types::{AnswerRequest, AnswerResponse, SearchOptions, SearchResult};
use crate::utils::Result;

/// Core trait for the remote search service.
///
/// Every failure (auth, transport, non-success status) comes back as
/// [`SearchError::Gateway`](crate::utils::SearchError::Gateway); callers never
/// see service-specific error codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Run a search query and return the ranked results
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>>;

    /// Generate an answer for a query
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse>;

    /// Short human-readable description of the backend
    fn name(&self) -> &str;
}
