use crate::config::types::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for either worker pool
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.token.is_empty() {
        return Err(ConfigError::Validation("token cannot be empty".to_string()));
    }

    validate_form_id(&config.form_id)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates worker pool sizes
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("page_workers", config.page_workers),
        ("detail_workers", config.detail_workers),
    ] {
        if value < 1 || value > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_WORKERS, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_path.is_empty() {
        return Err(ConfigError::Validation(
            "data_path cannot be empty".to_string(),
        ));
    }

    if config.debug_log_path.is_empty() {
        return Err(ConfigError::Validation(
            "debug_log_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// The form id is spliced into a URL path, so it must be a single plain segment
fn validate_form_id(form_id: &str) -> Result<(), ConfigError> {
    if form_id.is_empty() {
        return Err(ConfigError::Validation(
            "form_id cannot be empty".to_string(),
        ));
    }

    if !form_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "form_id must contain only ASCII letters, digits, '-' or '_', got '{}'",
            form_id
        )));
    }

    Ok(())
}
