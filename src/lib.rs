//! Review-Ripple: a polite product review harvester
//!
//! This crate fetches product reviews from an e-commerce site, either for a
//! list of product identifiers or for the results of a keyword search, and
//! stores them as one JSON file per product.

pub mod config;
pub mod crawler;
pub mod output;
pub mod product;
pub mod review;
pub mod storage;

use thiserror::Error;

/// Main error type for Review-Ripple operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Bot detected by the remote site at {url}, please wait a while")]
    Banned { url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Page parse error: {0}")]
    Parse(#[from] crawler::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScraperError {
    /// Whether this error is the anti-bot challenge condition
    pub fn is_banned(&self) -> bool {
        matches!(self, ScraperError::Banned { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Review-Ripple operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use product::{extract_product_id, ProductId};
pub use review::Review;
pub use storage::{JsonFileStore, ReviewStore};
