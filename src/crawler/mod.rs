//! Crawler module for review page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with ban detection and cooldowns
//! - Request pacing
//! - Review and search page parsing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod throttle;

pub use coordinator::{review_page_url, search_url, Coordinator};
pub use fetcher::{build_http_client, is_ban_page, Fetcher, BAN_MARKER};
pub use parser::{
    page_count, parse_review_page, parse_search_results, parse_total_reviews, ParseError,
    ReviewList, ReviewPage, REVIEWS_PER_PAGE,
};
pub use throttle::{Throttle, ThrottlePolicy};

use crate::output::CrawlStats;
use crate::storage::ReviewStore;
use crate::Result;
use std::path::PathBuf;

/// Which products a run works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    /// Products listed one per line in a file
    Batch(PathBuf),

    /// Products returned by a keyword search
    Search(String),
}

impl CrawlMode {
    /// Picks the mode from the command line options
    ///
    /// An input file takes precedence over a keyword; with neither, the
    /// default keyword is searched.
    pub fn select(search: Option<String>, input: Option<PathBuf>, default_keyword: &str) -> Self {
        match (input, search) {
            (Some(path), Some(keyword)) => {
                tracing::warn!(
                    "Both an input file and a search keyword were given, ignoring keyword {:?}",
                    keyword
                );
                CrawlMode::Batch(path)
            }
            (Some(path), None) => CrawlMode::Batch(path),
            (None, Some(keyword)) => CrawlMode::Search(keyword),
            (None, None) => CrawlMode::Search(default_keyword.to_string()),
        }
    }
}

/// Runs a complete crawl
///
/// # Arguments
///
/// * `coordinator` - The coordinator holding the fetcher and the store
/// * `mode` - Batch or search mode
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Counters for the run
/// * `Err(ScraperError)` - The run was aborted
pub async fn crawl<S: ReviewStore>(
    coordinator: &mut Coordinator<S>,
    mode: &CrawlMode,
) -> Result<CrawlStats> {
    let stats = match mode {
        CrawlMode::Batch(path) => coordinator.run_batch(path).await?,
        CrawlMode::Search(keyword) => coordinator.run_search(keyword).await?,
    };
    stats.log();
    Ok(stats)
}
