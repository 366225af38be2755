//! Request pacing and ban cooldowns
//!
//! This module handles:
//! - The fixed pause taken before every request
//! - Cooldowns after the remote site serves an anti-bot challenge
//! - Growing those cooldowns on consecutive challenges, up to a cap

use crate::config::ThrottleConfig;
use std::time::Duration;
use tokio::time::sleep;

/// Pacing rules for talking to the remote site
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottlePolicy {
    /// Pause before every request
    pub delay: Duration,

    /// Factor applied to the cooldown for each further consecutive ban
    pub backoff_multiplier: f64,

    /// Cooldown after the first ban
    pub ban_cooldown: Duration,

    /// Upper bound for a single cooldown
    pub max_delay: Duration,

    /// Retries allowed for a banned request
    pub max_ban_retries: u32,
}

impl ThrottlePolicy {
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self {
            delay: config.delay(),
            backoff_multiplier: config.backoff_multiplier,
            ban_cooldown: config.ban_cooldown(),
            max_delay: config.max_delay(),
            max_ban_retries: config.max_ban_retries,
        }
    }

    /// A policy that never waits and never retries a ban
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            ban_cooldown: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_ban_retries: 0,
        }
    }

    /// Cooldown before retry number `attempt` (0-based) of a banned request
    ///
    /// `ban_cooldown * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn cooldown_for(&self, attempt: u32) -> Duration {
        if self.ban_cooldown.is_zero() {
            return Duration::ZERO;
        }

        let factor = self.backoff_multiplier.powi(attempt.min(64) as i32);
        let secs = self.ban_cooldown.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

/// Tracks pacing state across requests
#[derive(Debug)]
pub struct Throttle {
    policy: ThrottlePolicy,
    consecutive_bans: u32,
    requests: u64,
}

impl Throttle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            consecutive_bans: 0,
            requests: 0,
        }
    }

    /// Number of requests paced so far
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Waits the fixed pre-request delay
    pub async fn pause(&mut self) {
        self.requests += 1;
        if self.policy.delay.is_zero() {
            return;
        }
        tracing::debug!(
            "Sleeping {:?} before request #{} (site throttling)",
            self.policy.delay,
            self.requests
        );
        sleep(self.policy.delay).await;
    }

    /// Clears the ban streak after a good response
    pub fn record_success(&mut self) {
        self.consecutive_bans = 0;
    }

    /// Registers a ban and returns the cooldown to take before retrying
    ///
    /// Returns `None` once the retries allowed by the policy are used up.
    pub fn record_ban(&mut self) -> Option<Duration> {
        let attempt = self.consecutive_bans;
        self.consecutive_bans += 1;
        if attempt >= self.policy.max_ban_retries {
            return None;
        }
        Some(self.policy.cooldown_for(attempt))
    }

    /// Sleeps through a ban cooldown
    pub async fn cool_down(&self, cooldown: Duration) {
        if !cooldown.is_zero() {
            sleep(cooldown).await;
        }
    }
}
