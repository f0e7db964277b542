//! Licensing-Crawler: a hierarchical crawler for licensing topics
//!
//! This crate fetches the topic list of a licensing service, then each topic's
//! procedures and, per statically configured region, each topic's branches,
//! assembling everything into an in-memory tree.

pub mod client;
pub mod config;
pub mod crawler;
pub mod tree;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to fetch topics: {source}")]
    Topics { source: FetchError },

    #[error("Failed to fetch procedures for topic {topic_id}: {source}")]
    Procedures { topic_id: i64, source: FetchError },

    #[error("Failed to fetch branches for topic {topic_id} in region {region_id}: {source}")]
    Branches {
        topic_id: i64,
        region_id: i64,
        source: FetchError,
    },

    #[error("Regions were already generated for topic {topic_id}")]
    RegionsAlreadyGenerated { topic_id: i64 },
}

/// Errors raised while turning a POST reply into tree entities
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No response from {url}")]
    NoResponse { url: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::RestClient;
pub use config::Config;
pub use crawler::{CrawlRun, RefreshReport};
pub use tree::{Appointment, Branch, Procedure, Region, Topic};
