//! Output module for run reporting
//!
//! This module handles:
//! - Counting per-product outcomes during a run
//! - Summarizing the contents of the review store

pub mod stats;

pub use stats::{summarize_store, CrawlStats, ProductOutcome, StoreSummary};
