// Gateway module for the remote search service - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod auth;
mod rest;
mod traits;
mod types;

// Public re-exports - the ONLY way to access search service functionality
pub use auth::TokenSource;
pub use rest::RestGateway;
pub use traits::SearchGateway;
#[cfg(test)]
pub use traits::MockSearchGateway;
pub use types::{AnswerRequest, AnswerResponse, SearchOptions, SearchResult};
