use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Remote service description: where to POST and with which static parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Licensing service identifier sent with the topic listing request
    #[serde(rename = "service-id")]
    pub service_id: i64,

    /// Base URL every endpoint path is appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the topic listing endpoint
    #[serde(rename = "topic-path")]
    pub topic_path: String,

    /// Path of the procedure listing endpoint
    #[serde(rename = "procedure-path")]
    pub procedure_path: String,

    /// Path of the branch listing endpoint
    #[serde(rename = "branch-path")]
    pub branch_path: String,

    /// Statically enumerated regions, written as `[id, "name"]` pairs
    pub regions: Vec<RegionEntry>,
}

impl ServiceConfig {
    pub fn topics_url(&self) -> String {
        format!("{}{}", self.base_url, self.topic_path)
    }

    pub fn procedures_url(&self) -> String {
        format!("{}{}", self.base_url, self.procedure_path)
    }

    pub fn branches_url(&self) -> String {
        format!("{}{}", self.base_url, self.branch_path)
    }
}

/// One configured region
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(i64, String)")]
pub struct RegionEntry {
    pub id: i64,
    pub name: String,
}

impl From<(i64, String)> for RegionEntry {
    fn from((id, name): (i64, String)) -> Self {
        Self { id, name }
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Verify TLS certificates (disabled unless explicitly turned on)
    #[serde(rename = "verify-tls", default)]
    pub verify_tls: bool,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(
        rename = "connect-timeout-secs",
        default = "default_connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            verify_tls: false,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Crawl orchestration behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight during a refresh pass
    #[serde(
        rename = "max-concurrent-fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: usize,

    /// What a refresh pass does when one of its units fails
    #[serde(rename = "failure-policy", default)]
    pub failure_policy: FailurePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Failure handling for a refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Any failed unit fails the whole pass; nothing from the pass is kept
    #[default]
    Abort,

    /// Failed units are reported and left unpopulated; the rest is kept
    Isolate,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("licensing-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_concurrent_fetches() -> usize {
    4
}
