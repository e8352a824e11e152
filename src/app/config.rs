use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_ENGINE_ID, DEFAULT_LANGUAGE_CODE,
    DEFAULT_LOCATION, DEFAULT_PAGE_SIZE, DEFAULT_PROJECT_ID, DEFAULT_SESSION_MAX_AGE_HOURS,
    DEFAULT_SOW_PAGE_SIZE, DEFAULT_SOW_QUERY, DEFAULT_TIME_ZONE, HTTP_REQUEST_TIMEOUT_SECS,
};
use crate::gateway::SearchOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search service location and credentials
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Defaults for search requests
    #[serde(default)]
    pub search: SearchConfig,

    /// Session bookkeeping
    #[serde(default)]
    pub sessions: SessionConfig,

    /// SOW analysis
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Google Cloud project ID
    pub project_id: String,
    /// Vertex AI Search engine ID
    pub engine_id: String,
    /// Engine location
    pub location: String,
    /// Discovery Engine API version
    pub api_version: String,
    /// API endpoint
    pub endpoint: String,
    /// Bearer token; falls back to VERTEX_ACCESS_TOKEN, then gcloud
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            engine_id: DEFAULT_ENGINE_ID.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Search request defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub page_size: usize,
    pub query_expansion: bool,
    pub spell_correction: bool,
    pub language_code: String,
    pub time_zone: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            query_expansion: true,
            spell_correction: true,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
        }
    }
}

impl SearchConfig {
    /// Request options seeded from these defaults
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            page_size: self.page_size,
            query_expansion: self.query_expansion,
            spell_correction: self.spell_correction,
            language_code: self.language_code.clone(),
            time_zone: self.time_zone.clone(),
            user_pseudo_id: None,
            session: None,
        }
    }
}

/// Session bookkeeping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions older than this are swept
    pub max_age_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_hours: DEFAULT_SESSION_MAX_AGE_HOURS,
        }
    }
}

/// SOW analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Query used to collect SOW documents
    pub query: String,
    /// Results fetched for the analysis
    pub page_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_SOW_QUERY.to_string(),
            page_size: DEFAULT_SOW_PAGE_SIZE,
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".vertex-search/config.toml");

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    with_env(figment)
        .extract()
        .context("Failed to load configuration")
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path));

    with_env(figment)
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn with_env(figment: Figment) -> Figment {
    figment
        // PROJECT_ID / ENGINE_ID, as used by the gcloud tooling
        .merge(
            Env::raw()
                .only(&["project_id", "engine_id"])
                .map(|key| format!("gateway.{}", key).into()),
        )
        // VERTEX_SEARCH_GATEWAY__LOCATION=us, VERTEX_SEARCH_SEARCH__PAGE_SIZE=25, ...
        .merge(Env::prefixed("VERTEX_SEARCH_").split("__"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "vertex-search") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("vertex-search");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist.
/// Returns the path when a file was written.
pub fn init_config() -> Result<Option<PathBuf>> {
    let config_file = get_config_dir()?.join("config.toml");

    if config_file.exists() {
        return Ok(None);
    }

    save_config(&Config::default(), Some(config_file.clone()))?;
    Ok(Some(config_file))
}
