//! Configuration module for the licensing crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use licensing_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Topics endpoint: {}", config.service.topics_url());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, CrawlerConfig, FailurePolicy, RegionEntry, ServiceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
