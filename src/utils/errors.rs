use thiserror::Error;

/// Main error type for vertex-search
#[derive(Error, Debug)]
pub enum SearchError {
    /// Anything that went wrong talking to the search service: auth, transport,
    /// non-success status or an undecodable body.
    #[error("Gateway error: {message}")]
    Gateway {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            status: None,
            message: message.into(),
        }
    }

    pub fn gateway_status(status: u16, message: impl Into<String>) -> Self {
        Self::Gateway {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status reported by the service, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Gateway {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
