use serde::Deserialize;

/// Default API root for Action Network's OSDI endpoint
pub const DEFAULT_BASE_URL: &str = "https://actionnetwork.org/api/v2";

/// Main configuration structure for OSDI-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Bearer token sent as `OSDI-API-Token` (environment only)
    #[serde(skip)]
    pub token: String,

    /// Form whose submissions are harvested (environment only)
    #[serde(skip)]
    pub form_id: String,

    /// Upper bound for a whole request, in seconds
    pub request_timeout_secs: u64,

    /// Upper bound for establishing a connection, in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            form_id: String::new(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// URL of the first submissions page for the configured form
    pub fn submissions_url(&self) -> String {
        format!(
            "{}/forms/{}/submissions/",
            self.base_url.trim_end_matches('/'),
            self.form_id
        )
    }
}

/// Worker pool sizes for the two crawl phases
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Concurrent workers draining the pagination queue
    pub page_workers: usize,

    /// Concurrent workers fetching person details
    pub detail_workers: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_workers: 5,
            detail_workers: 5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON dataset written at the end of the run
    pub data_path: String,

    /// Path to the append-only diagnostic log
    pub debug_log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: "data.json".to_string(),
            debug_log_path: "debug.log".to_string(),
        }
    }
}
