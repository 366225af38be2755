//! Configuration module for Review-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional; every value has a default.
//!
//! # Example
//!
//! ```no_run
//! use review_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("review-ripple.toml")).unwrap();
//! println!("Pause between requests: {}ms", config.throttle.delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, SearchConfig, SiteConfig, ThrottleConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
