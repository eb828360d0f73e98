use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};

/// Configuration for a batch fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of concurrently executing fetches. Also caps the
    /// number of browser sessions launched for a batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Try a plain HTTP fetch before involving a browser session.
    #[serde(default = "default_light_first")]
    pub light_first: bool,

    /// Timeout for the lightweight HTTP pass, in seconds.
    #[serde(default = "default_light_timeout")]
    pub light_timeout_secs: u64,

    /// Upper bound on browser navigation, in seconds.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Upper bound on a started download reaching a stable file, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Where downloaded files land. Defaults to a per-batch temp directory.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub download_dir: Option<PathBuf>,

    /// Browser executable override. Auto-detected when unset.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub browser_path: Option<PathBuf>,

    /// Session viewport width in pixels.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Session viewport height in pixels.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// User-agent string presented by every session.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional headers sent with every request.
    #[serde(default = "default_extra_headers")]
    pub extra_headers: HashMap<String, String>,

    /// File extensions whose sub-resource requests are aborted.
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,

    /// Host regex patterns whose sub-resource requests are aborted.
    #[serde(default = "default_blocked_host_patterns")]
    pub blocked_host_patterns: Vec<String>,

    /// Capacity of the document parse cache.
    #[serde(default = "default_parse_cache_size")]
    pub parse_cache_size: usize,

    /// Worker count for parallel document element formatting.
    #[serde(default = "default_parse_workers")]
    pub parse_workers: usize,

    /// Process documents with more elements than this in chunks.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parse_chunk_size: Option<usize>,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_light_first() -> bool {
    true
}

fn default_light_timeout() -> u64 {
    10
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_download_timeout() -> u64 {
    120
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.2849.80"
        .to_string()
}

fn default_extra_headers() -> HashMap<String, String> {
    HashMap::from([(
        "Sec-CH-UA".to_string(),
        r#""Not_A Brand";v="8", "Chromium";v="120", "Microsoft Edge";v="120""#.to_string(),
    )])
}

fn default_blocked_extensions() -> Vec<String> {
    [
        "gif", "svg", "css", "woff", "woff2", "ttf", "eot", "jpg", "jpeg", "png", "webp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_host_patterns() -> Vec<String> {
    vec![r"(google-analytics|googletagmanager|doubleclick|facebook|analytics)\.".to_string()]
}

fn default_parse_cache_size() -> usize {
    128
}

fn default_parse_workers() -> usize {
    4
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            light_first: default_light_first(),
            light_timeout_secs: default_light_timeout(),
            navigation_timeout_secs: default_navigation_timeout(),
            download_timeout_secs: default_download_timeout(),
            download_dir: None,
            browser_path: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            user_agent: default_user_agent(),
            extra_headers: default_extra_headers(),
            blocked_extensions: default_blocked_extensions(),
            blocked_host_patterns: default_blocked_host_patterns(),
            parse_cache_size: default_parse_cache_size(),
            parse_workers: default_parse_workers(),
            parse_chunk_size: None,
        }
    }
}

impl FetchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| FetchError::io(path.as_ref(), e))?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FetchError::InvalidInput(e.to_string()))
    }

    /// Contract checks that must fail before any session is launched.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(FetchError::InvalidInput(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.parse_cache_size == 0 {
            return Err(FetchError::InvalidInput(
                "parse_cache_size must be at least 1".into(),
            ));
        }
        if self.parse_workers == 0 {
            return Err(FetchError::InvalidInput(
                "parse_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Derive the per-session launch settings for a batch whose downloads
    /// land in `download_dir`.
    pub fn session_config(&self, download_dir: PathBuf) -> SessionConfig {
        SessionConfig {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            user_agent: self.user_agent.clone(),
            extra_headers: self.extra_headers.clone(),
            download_dir,
            browser_path: self.browser_path.clone(),
        }
    }
}

/// Launch settings for one browsing session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub extra_headers: HashMap<String, String>,
    pub download_dir: PathBuf,
    pub browser_path: Option<PathBuf>,
}
