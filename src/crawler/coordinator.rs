//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loops that tie the fetcher, the page parser
//! and the review store together:
//! - Walking the review pages of a single product
//! - Batch mode: products listed in an input file
//! - Search mode: products found by a keyword search
//!
//! Every product is persisted on its own as soon as its pages are walked, and
//! products that already have a collection on disk are never fetched again.

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{page_count, parse_review_page, parse_search_results, ReviewList};
use crate::crawler::throttle::ThrottlePolicy;
use crate::output::{CrawlStats, ProductOutcome};
use crate::product::ProductId;
use crate::review::Review;
use crate::storage::ReviewStore;
use crate::Result;
use std::path::Path;

/// Review page URL for a product, relative to the site origin
pub fn review_page_url(product_id: &ProductId, page_number: u32) -> String {
    format!(
        "/product-reviews/{}/ref=cm_cr_arp_d_paging_btm_1?ie=UTF8&reviewerType=all_reviews\
         &showViewpoints=1&sortBy=recent&pageNumber={}",
        product_id, page_number
    )
}

/// Search result URL for a keyword, relative to the site origin
pub fn search_url(keyword: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    format!(
        "/s/ref=nb_sb_noss_2?url=search-alias%3Daps&field-keywords={}&rh=i%3Aaps%2Ck%3A{}",
        encoded, encoded
    )
}

/// Main crawler coordinator structure
pub struct Coordinator<S: ReviewStore> {
    fetcher: Fetcher,
    store: S,
    stats: CrawlStats,
}

impl<S: ReviewStore> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Where review collections are kept
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScraperError)` - Failed to build the HTTP client
    pub fn new(config: &Config, store: S) -> Result<Self> {
        let policy = ThrottlePolicy::from_config(&config.throttle);
        let fetcher = Fetcher::new(&config.site, policy)?;
        Ok(Self::with_fetcher(fetcher, store))
    }

    pub fn with_fetcher(fetcher: Fetcher, store: S) -> Self {
        Self {
            fetcher,
            store,
            stats: CrawlStats::default(),
        }
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetches every review of a product, walking its review pages in order
    ///
    /// Pagination ends when the page count derived from the total review
    /// count is exhausted, when a page has no review list, or when a page's
    /// review list is empty. A product without a review count marker has no
    /// retrievable reviews.
    #[tracing::instrument(name = "product", level = "info", skip_all, fields(id = %product_id))]
    pub async fn crawl_product(&mut self, product_id: &ProductId) -> Result<Vec<Review>> {
        let mut reviews = Vec::new();

        let body = self
            .fetcher
            .fetch_page(&review_page_url(product_id, 1))
            .await?;
        let first_page = parse_review_page(&body, product_id)?;

        let Some(total_reviews) = first_page.total_reviews else {
            tracing::info!("No review count on the first page, nothing to fetch");
            return Ok(reviews);
        };

        let pages = page_count(total_reviews);
        tracing::debug!("{} reviews announced over {} pages", total_reviews, pages);

        let mut first_list = Some(first_page.list);
        for page_number in 1..=pages {
            let list = match first_list.take() {
                Some(list) => list,
                None => {
                    let body = self
                        .fetcher
                        .fetch_page(&review_page_url(product_id, page_number))
                        .await?;
                    parse_review_page(&body, product_id)?.list
                }
            };

            let entries = match list {
                ReviewList::Missing => {
                    tracing::info!("No reviews for this item (page {})", page_number);
                    break;
                }
                ReviewList::Entries(entries) if entries.is_empty() => {
                    tracing::info!("No more reviews to unstack (page {})", page_number);
                    break;
                }
                ReviewList::Entries(entries) => entries,
            };

            for review in &entries {
                tracing::debug!(
                    title = %review.title,
                    rating = %review.rating,
                    date = %review.review_date,
                    "{}",
                    review.body
                );
            }
            reviews.extend(entries);
        }

        Ok(reviews)
    }

    /// Fetches and persists one product unless it was fetched before
    pub async fn harvest_product(&mut self, product_id: &ProductId) -> Result<ProductOutcome> {
        if self.store.exists(product_id) {
            tracing::info!("Product id [{}] was already fetched. Skipping.", product_id);
            return Ok(self.finish(ProductOutcome::AlreadyFetched));
        }

        let reviews = self.crawl_product(product_id).await?;
        tracing::info!("Fetched {} reviews for {}", reviews.len(), product_id);

        if reviews.is_empty() {
            return Ok(self.finish(ProductOutcome::NoReviews));
        }

        let outcome = if self.store.persist(&reviews)? {
            ProductOutcome::Saved {
                reviews: reviews.len(),
            }
        } else {
            ProductOutcome::AlreadyFetched
        };
        Ok(self.finish(outcome))
    }

    fn finish(&mut self, outcome: ProductOutcome) -> ProductOutcome {
        self.stats.record(outcome);
        outcome
    }

    /// Batch mode: harvests every product listed in a newline-separated file
    ///
    /// Blank lines are ignored; lines that are not product identifiers are
    /// logged and counted, then skipped.
    pub async fn run_batch(&mut self, input: &Path) -> Result<CrawlStats> {
        let content = tokio::fs::read_to_string(input).await?;

        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        tracing::info!("{} product ids were found.", lines.len());

        for line in lines {
            let product_id = match ProductId::parse(line) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Skipping input line: {}", e);
                    self.stats.record_invalid_id();
                    continue;
                }
            };

            self.harvest_product(&product_id).await?;
            tracing::info!("{} reviews saved so far.", self.stats.reviews_saved);
        }

        Ok(self.stats.clone())
    }

    /// Runs a keyword search and returns the products it lists
    pub async fn search_product_ids(&mut self, keyword: &str) -> Result<Vec<ProductId>> {
        tracing::info!("SEARCH = {}", keyword);
        let body = self.fetcher.fetch_page(&search_url(keyword)).await?;
        let ids = parse_search_results(&body)?;
        tracing::info!("Found {} items.", ids.len());
        Ok(ids)
    }

    /// Search mode: harvests every product a keyword search lists
    pub async fn run_search(&mut self, keyword: &str) -> Result<CrawlStats> {
        for product_id in self.search_product_ids(keyword).await? {
            self.harvest_product(&product_id).await?;
        }
        Ok(self.stats.clone())
    }
}
