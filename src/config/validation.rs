use crate::config::types::{Config, ExtractConfig, FetchConfig, SearchConfig, StoreConfig, TokenizerConfig};
use crate::ConfigError;
use std::path::Path;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_tokenizer_config(&config.tokenizer)?;
    validate_search_config(&config.search)?;
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "store path cannot be empty".to_string(),
        ));
    }

    if config.path.is_file() {
        return Err(ConfigError::Validation(format!(
            "store path '{}' must be a directory",
            config.path.display()
        )));
    }

    if config.lock_timeout_millis > 600_000 {
        return Err(ConfigError::Validation(format!(
            "lock-timeout-millis must be at most 600000, got {}",
            config.lock_timeout_millis
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 600, got {}",
            config.timeout_secs
        )));
    }

    validate_header_value("user-agent", &config.user_agent)?;
    validate_header_value("accept-language", &config.accept_language)?;

    Ok(())
}

/// Header values must be non-empty visible ASCII (spaces allowed)
fn validate_header_value(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }

    if !value.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return Err(ConfigError::Validation(format!(
            "{} must contain only visible ASCII characters, got '{}'",
            name, value
        )));
    }

    Ok(())
}

fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.image_request_timeout_millis == 0 {
        return Err(ConfigError::Validation(
            "image-request-timeout-millis must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates tokenizer resources: configured files must exist
fn validate_tokenizer_config(config: &TokenizerConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("user-dict", config.user_dict.as_deref()),
        ("stop-words", config.stop_words.as_deref()),
    ] {
        if let Some(path) = path {
            require_file(name, path)?;
        }
    }
    Ok(())
}

fn require_file(name: &str, path: &Path) -> Result<(), ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::MissingResource(format!(
            "{} file '{}' does not exist",
            name,
            path.display()
        )));
    }
    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.limit < 1 || config.limit > 1000 {
        return Err(ConfigError::Validation(format!(
            "search limit must be between 1 and 1000, got {}",
            config.limit
        )));
    }

    if config.snippet_chars < 20 {
        return Err(ConfigError::Validation(format!(
            "snippet-chars must be >= 20, got {}",
            config.snippet_chars
        )));
    }

    Ok(())
}
