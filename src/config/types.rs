use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like User-Agent sent with every fetch unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/54.0.2840.71 Safari/537.36";

/// Default Accept-Language header value
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.8";

/// Main configuration structure for ReadEngine
///
/// Every section is optional in the TOML file; missing sections fall back
/// to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub tokenizer: TokenizerConfig,
    pub search: SearchConfig,
}

/// Location of the durable store and the derived index
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `data.db` and `index.db`
    pub path: PathBuf,

    /// How long a write waits for another process holding the database
    /// lock (a rebuild, typically) before giving up, in milliseconds
    #[serde(rename = "lock-timeout-millis")]
    pub lock_timeout_millis: u64,
}

impl StoreConfig {
    /// Path to the authoritative document database
    pub fn data_path(&self) -> PathBuf {
        self.path.join("data.db")
    }

    /// Path to the derived search index database
    pub fn index_path(&self) -> PathBuf {
        self.path.join("index.db")
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_millis)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("store"),
            lock_timeout_millis: 5000,
        }
    }
}

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound for a whole request, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

/// Content extraction switches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Strip all markup from the extracted description
    #[serde(rename = "description-as-plain-text")]
    pub description_as_plain_text: bool,

    /// Prune elements without text or meaningful children before scoring
    #[serde(rename = "remove-empty-nodes")]
    pub remove_empty_nodes: bool,

    /// Timeout for each embedded image check (milliseconds)
    #[serde(rename = "image-request-timeout-millis")]
    pub image_request_timeout_millis: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            description_as_plain_text: true,
            remove_empty_nodes: true,
            image_request_timeout_millis: 3000,
        }
    }
}

/// Tokenizer resources
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Optional user dictionary, one word per line
    #[serde(rename = "user-dict")]
    pub user_dict: Option<PathBuf>,

    /// Optional stop word list, one word per line
    #[serde(rename = "stop-words")]
    pub stop_words: Option<PathBuf>,
}

/// Search output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of hits returned by a query
    pub limit: usize,

    /// Length of highlighted snippets (characters)
    #[serde(rename = "snippet-chars")]
    pub snippet_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            snippet_chars: 160,
        }
    }
}

impl Config {
    /// Resolves every relative path in the configuration against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        self.store.path = resolve(base, &self.store.path);
        if let Some(dict) = self.tokenizer.user_dict.as_mut() {
            *dict = resolve(base, dict);
        }
        if let Some(stop) = self.tokenizer.stop_words.as_mut() {
            *stop = resolve(base, stop);
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
