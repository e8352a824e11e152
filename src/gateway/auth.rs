use tokio::process::Command;
use tracing::debug;

use crate::constants::ACCESS_TOKEN_ENV;
use crate::utils::{Result, SearchError};

/// Where bearer tokens for the search service come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// A token fixed in configuration
    Static(String),
    /// `VERTEX_ACCESS_TOKEN`, read on every request
    Env,
    /// `gcloud auth print-access-token`
    Gcloud,
}

impl TokenSource {
    /// Pick a source: configured token, then the env var, then gcloud
    pub fn detect(configured: Option<&str>) -> Self {
        match configured.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Self::Static(token.to_string()),
            None if std::env::var(ACCESS_TOKEN_ENV).is_ok() => Self::Env,
            None => Self::Gcloud,
        }
    }

    /// Fetch a token. Any failure is a gateway error.
    pub async fn token(&self) -> Result<String> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Env => std::env::var(ACCESS_TOKEN_ENV)
                .map(|t| t.trim().to_string())
                .map_err(|e| SearchError::gateway(format!("{}: {}", ACCESS_TOKEN_ENV, e))),
            Self::Gcloud => gcloud_token().await,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Static(_) => "configured access token",
            Self::Env => ACCESS_TOKEN_ENV,
            Self::Gcloud => "gcloud auth print-access-token",
        }
    }
}

async fn gcloud_token() -> Result<String> {
    debug!("requesting access token from gcloud");
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| SearchError::gateway(format!("Failed to get access token: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SearchError::gateway(format!(
            "Failed to get access token: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(SearchError::gateway("gcloud returned an empty access token"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_token_wins() {
        assert_eq!(
            TokenSource::detect(Some("  abc  ")),
            TokenSource::Static("abc".to_string())
        );
    }

    #[test]
    fn test_blank_configured_token_is_ignored() {
        assert_ne!(TokenSource::detect(Some("   ")), TokenSource::Static(String::new()));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = TokenSource::Static("tok".to_string());
        assert_eq!(source.token().await.unwrap(), "tok");
    }
}
