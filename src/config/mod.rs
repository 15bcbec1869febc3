//! Configuration module for OSDI-Harvest
//!
//! Credentials are read from the environment (`API_KEY`, `FORM_ID`). Tunables
//! such as worker counts, timeouts and output paths come from an optional TOML
//! file and fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use osdi_harvest::config::load_config;
//!
//! let config = load_config(None).unwrap();
//! println!("Harvesting form {}", config.api.form_id);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlerConfig, OutputConfig, DEFAULT_BASE_URL};

// Re-export parser functions
pub use parser::{
    apply_credentials, load_config, load_config_with_env, load_settings, API_KEY_VAR, FORM_ID_VAR,
};
pub use validation::validate;
