use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Name of the per-user configuration directory
pub const CONFIG_DIR_NAME: &str = ".readengine";

/// Returns the default configuration file location, `~/.readengine/config.toml`
pub fn default_config_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Loads and parses a configuration file from the given path
///
/// Relative paths inside the file are resolved against the directory that
/// contains it. The result is validated before it is returned, so callers
/// never see a configuration pointing at missing resources.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use readengine::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Store: {}", config.store.path.display());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, base_dir(path))
}

/// Loads the configuration file, or falls back to defaults when it does not exist
///
/// The defaults are rooted at the directory the file would live in.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        "No configuration at {}, using defaults",
        path.display()
    );
    let mut config = Config::default();
    config.resolve_paths(base_dir(path));
    validate(&config)?;
    Ok(config)
}

/// Parses configuration text, resolving relative paths against `base`
pub fn parse_config(content: &str, base: &Path) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;
    config.resolve_paths(base);
    validate(&config)?;
    Ok(config)
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}
