use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable holding the API token
pub const API_KEY_VAR: &str = "API_KEY";

/// Environment variable holding the form identifier
pub const FORM_ID_VAR: &str = "FORM_ID";

/// Loads the full configuration from an optional TOML file and the process environment
///
/// # Arguments
///
/// * `path` - Optional path to a TOML file with tunables
///
/// # Returns
///
/// * `Ok(Config)` - Configuration with credentials, validated
/// * `Err(ConfigError)` - Missing credentials, unreadable file or invalid values
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use osdi_harvest::config::load_config;
///
/// let config = load_config(Some(Path::new("harvest.toml"))).unwrap();
/// println!("Page workers: {}", config.crawler.page_workers);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`], with credentials resolved through `lookup`
pub fn load_config_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = load_settings(path)?;
    apply_credentials(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Reads tunables from a TOML file, or returns defaults when no file is given
///
/// Credentials are never read from the file.
pub fn load_settings(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(Config::default()),
    }
}

/// Fills the token and form identifier from `lookup`
///
/// Empty values count as missing.
pub fn apply_credentials<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &'static str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(name))
    };

    config.api.token = required(API_KEY_VAR)?;
    config.api.form_id = required(FORM_ID_VAR)?;
    Ok(())
}
