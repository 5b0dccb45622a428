//! Client configuration: defaults, `studio.toml` and environment

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Port probed on the page host during discovery
pub const DEFAULT_DISCOVERY_PORT: u16 = 8000;

/// Name of the optional configuration file in the working directory
pub const STUDIO_TOML: &str = "studio.toml";

/// Attempt limit and backoff for operations that retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempts including the first one
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Configuration for [`crate::ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Static default backend address
    pub api_url: String,
    /// Host the user reached the studio through, probed first during discovery
    pub page_host: Option<String>,
    pub discovery_port: u16,
    /// Timeout for each discovery request
    pub discovery_timeout: Duration,
    /// Turn endpoint discovery off and always use `api_url`
    pub discovery_enabled: bool,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_host: None,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            discovery_timeout: Duration::from_secs(3),
            discovery_enabled: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `.env` and the process environment
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PUBLIC_API_URL`, `PAGE_HOST` and `CV_DISCOVERY_PORT`
    ///
    /// Loads `.env` first if present. Empty values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        let _ = dotenvy::dotenv();

        if let Some(api_url) = non_empty_env("PUBLIC_API_URL") {
            self.api_url = api_url;
        }
        if let Some(page_host) = non_empty_env("PAGE_HOST") {
            self.page_host = Some(page_host);
        }
        if let Some(port) = non_empty_env("CV_DISCOVERY_PORT") {
            match port.parse() {
                Ok(port) => self.discovery_port = port,
                Err(e) => warn!("Ignoring CV_DISCOVERY_PORT={:?}: {}", port, e),
            }
        }
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_page_host(mut self, page_host: impl Into<String>) -> Self {
        self.page_host = Some(page_host.into());
        self
    }

    pub fn with_discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = port;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_discovery(mut self, enabled: bool) -> Self {
        self.discovery_enabled = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `api_url` without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        const MAX_RETRIES: u32 = 10;

        let url = url::Url::parse(&self.api_url)
            .map_err(|e| format!("Invalid api_url {:?}: {}", self.api_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "api_url must use http or https, got {:?}",
                url.scheme()
            ));
        }

        if self.discovery_timeout.is_zero() {
            return Err("Discovery timeout must be greater than 0".to_string());
        }

        if self.retry.max_retries > MAX_RETRIES {
            return Err(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES, self.retry.max_retries
            ));
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Contents of `studio.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudioToml {
    pub api_url: Option<String>,
    pub page_host: Option<String>,
    pub discovery_port: Option<u16>,
    pub discovery_timeout_secs: Option<u64>,
    pub discovery: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

impl StudioToml {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the empty configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("{:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

        info!("Loaded {:?}", path);
        Ok(config)
    }

    /// Try to load `studio.toml` from the current directory
    pub fn try_load() -> Self {
        match Self::from_file(STUDIO_TOML) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load {}: {}", STUDIO_TOML, e);
                Self::default()
            }
        }
    }

    /// Overlay the keys present in the file onto `config`
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(page_host) = &self.page_host {
            config.page_host = Some(page_host.clone());
        }
        if let Some(port) = self.discovery_port {
            config.discovery_port = port;
        }
        if let Some(secs) = self.discovery_timeout_secs {
            config.discovery_timeout = Duration::from_secs(secs);
        }
        if let Some(enabled) = self.discovery {
            config.discovery_enabled = enabled;
        }
        if let Some(max_retries) = self.max_retries {
            config.retry.max_retries = max_retries;
        }
        if let Some(ms) = self.retry_base_delay_ms {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        config
    }
}
