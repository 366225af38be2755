//! Crawl statistics
//!
//! Counters collected while a run walks its products, plus a summary of what
//! the review store holds afterwards.

use crate::storage::{ReviewStore, StorageResult};

/// What happened to one product during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOutcome {
    /// Reviews were fetched and a new collection written
    Saved { reviews: usize },

    /// A collection already existed; nothing was fetched or written
    AlreadyFetched,

    /// The product has no retrievable reviews
    NoReviews,
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Products the run looked at
    pub products_seen: usize,

    /// Products whose collection was written by this run
    pub products_saved: usize,

    /// Products skipped because they were fetched before
    pub products_skipped: usize,

    /// Products without any review
    pub products_without_reviews: usize,

    /// Input lines that were not valid product identifiers
    pub invalid_ids: usize,

    /// Reviews written by this run
    pub reviews_saved: usize,
}

impl CrawlStats {
    pub fn record(&mut self, outcome: ProductOutcome) {
        self.products_seen += 1;
        match outcome {
            ProductOutcome::Saved { reviews } => {
                self.products_saved += 1;
                self.reviews_saved += reviews;
            }
            ProductOutcome::AlreadyFetched => self.products_skipped += 1,
            ProductOutcome::NoReviews => self.products_without_reviews += 1,
        }
    }

    pub fn record_invalid_id(&mut self) {
        self.invalid_ids += 1;
    }

    /// Logs the counters at info level
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} products seen, {} saved ({} reviews), {} already fetched, {} without reviews, {} invalid ids",
            self.products_seen,
            self.products_saved,
            self.reviews_saved,
            self.products_skipped,
            self.products_without_reviews,
            self.invalid_ids
        );
    }
}

/// Totals over everything in a review store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub products: usize,
    pub reviews: usize,
}

/// Counts the products and reviews held by a store
pub fn summarize_store(store: &dyn ReviewStore) -> StorageResult<StoreSummary> {
    let mut summary = StoreSummary::default();
    for product_id in store.list()? {
        if let Some(reviews) = store.load(&product_id)? {
            summary.products += 1;
            summary.reviews += reviews.len();
        }
    }
    Ok(summary)
}
