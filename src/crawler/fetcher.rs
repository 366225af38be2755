//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent
//! - Resolving page paths against the site origin
//! - Pacing every request through the [`Throttle`]
//! - Detecting anti-bot challenge pages and cooling down before retrying

use crate::config::SiteConfig;
use crate::crawler::throttle::{Throttle, ThrottlePolicy};
use crate::{Result, ScraperError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Substring whose presence in a response body means the site challenged us
pub const BAN_MARKER: &str = "captcha";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The target site configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SiteConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Whether a response body is an anti-bot challenge page
pub fn is_ban_page(body: &str) -> bool {
    body.contains(BAN_MARKER)
}

/// Fetches pages from the target site one at a time
pub struct Fetcher {
    client: Client,
    base_url: Url,
    throttle: Throttle,
}

impl Fetcher {
    /// Creates a fetcher for the configured site
    pub fn new(config: &SiteConfig, policy: ThrottlePolicy) -> Result<Self> {
        let client = build_http_client(config)?;
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            client,
            base_url,
            throttle: Throttle::new(policy),
        })
    }

    /// Number of requests issued so far, retries included
    pub fn requests_made(&self) -> u64 {
        self.throttle.requests()
    }

    /// Resolves a page reference against the site origin
    ///
    /// Absolute http(s) URLs are used as-is, anything else is joined onto the
    /// base URL.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
                Ok(absolute)
            }
            _ => Ok(self.base_url.join(url)?),
        }
    }

    /// Fetches a page and returns its body
    ///
    /// # Request Flow
    ///
    /// 1. Wait the throttle delay
    /// 2. Send a GET request
    /// 3. Anything but HTTP 200 → `UnexpectedStatus`, no retry
    /// 4. Body containing the ban marker → cool down and retry, or `Banned`
    ///    once the policy's retries are spent
    pub async fn fetch_page(&mut self, url: &str) -> Result<String> {
        let url = self.resolve(url)?;

        loop {
            self.throttle.pause().await;

            match self.fetch_once(&url).await {
                Ok(body) => {
                    self.throttle.record_success();
                    return Ok(body);
                }
                Err(e) if e.is_banned() => match self.throttle.record_ban() {
                    Some(cooldown) => {
                        tracing::warn!(
                            "Bot detected at {}, cooling down for {:?} before retrying",
                            url,
                            cooldown
                        );
                        self.throttle.cool_down(cooldown).await;
                    }
                    None => {
                        tracing::error!("Still detected as a bot at {}, giving up", url);
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ScraperError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScraperError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| ScraperError::Http {
            url: url.to_string(),
            source,
        })?;

        if is_ban_page(&body) {
            return Err(ScraperError::Banned {
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}
