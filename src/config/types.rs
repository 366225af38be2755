use serde::Deserialize;
use std::time::Duration;

/// Browser identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/43.0.2357.134 Safari/537.36";

/// Main configuration structure for Review-Ripple
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub throttle: ThrottleConfig,
    pub output: OutputConfig,
    pub search: SearchConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin that relative page URLs are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.in".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Request pacing and ban recovery
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause before every request (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Growth factor applied to the ban cooldown on consecutive bans
    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: f64,

    /// Cooldown after the first ban (milliseconds)
    #[serde(rename = "ban-cooldown-ms")]
    pub ban_cooldown_ms: u64,

    /// Upper bound for any cooldown (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// How many times a banned request is retried before giving up
    #[serde(rename = "max-ban-retries")]
    pub max_ban_retries: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            backoff_multiplier: 2.0,
            ban_cooldown_ms: 30_000,
            max_delay_ms: 300_000,
            max_ban_retries: 3,
        }
    }
}

impl ThrottleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn ban_cooldown(&self) -> Duration {
        Duration::from_millis(self.ban_cooldown_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding one `<product_id>.json` file per product
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "comments".to_string(),
        }
    }
}

/// Search mode configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Keyword searched when neither a keyword nor an input file is given
    #[serde(rename = "default-keyword")]
    pub default_keyword: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_keyword: "mobile phone".to_string(),
        }
    }
}
