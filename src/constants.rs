/// Constants module to avoid magic numbers in the codebase

// Gateway Configuration
pub const DEFAULT_ENDPOINT: &str = "https://discoveryengine.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1alpha";
pub const DEFAULT_LOCATION: &str = "global";
pub const DEFAULT_PROJECT_ID: &str = "transparent-agent-dev";
pub const DEFAULT_ENGINE_ID: &str = "chr_project_agent_app_v2";
pub const DEFAULT_COLLECTION: &str = "default_collection";
pub const DEFAULT_SERVING_CONFIG: &str = "default_search";
pub const ACCESS_TOKEN_ENV: &str = "VERTEX_ACCESS_TOKEN";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

// Search Defaults
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
pub const DEFAULT_TIME_ZONE: &str = "America/Denver";

// Sessions
pub const PROVISIONAL_MARKER: char = '-';
pub const DEFAULT_SESSION_MAX_AGE_HOURS: i64 = 24;

// SOW Analysis
pub const DEFAULT_SOW_QUERY: &str = "SOW";
pub const DEFAULT_SOW_PAGE_SIZE: usize = 50;
pub const PREVIEW_MAX_CHARS: usize = 200;
pub const PREVIEW_ELLIPSIS: &str = "...";
