use crate::config::types::{ClientConfig, Config, CrawlerConfig, RegionEntry, ServiceConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_service_config(&config.service)?;
    validate_regions(&config.service.regions)?;
    validate_client_config(&config.client)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates the remote service description
fn validate_service_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    for (name, path) in [
        ("topic_path", &config.topic_path),
        ("procedure_path", &config.procedure_path),
        ("branch_path", &config.branch_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates the static region list
fn validate_regions(regions: &[RegionEntry]) -> Result<(), ConfigError> {
    if regions.is_empty() {
        return Err(ConfigError::Validation(
            "regions must list at least one [id, name] pair".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for region in regions {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Region {} has an empty name",
                region.id
            )));
        }

        if !seen.insert(region.id) {
            return Err(ConfigError::Validation(format!(
                "Region id {} is listed more than once",
                region.id
            )));
        }
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl orchestration configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    Ok(())
}
