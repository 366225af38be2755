//! HTML parser for review and search result pages
//!
//! This module handles parsing HTML content to extract:
//! - The total review count of a product
//! - Review entries from one page of a product's reviews
//! - Product identifiers from a keyword search result page

use crate::product::{extract_product_id, ProductId};
use crate::review::{parse_rating, Review};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;

/// Reviews shown on one review page
pub const REVIEWS_PER_PAGE: u32 = 10;

const TOTAL_COUNT_SELECTOR: &str = r#"[data-hook="total-review-count"]"#;
const REVIEW_LIST_SELECTOR: &str = "#cm_cr-review_list";
const REVIEW_SELECTOR: &str = r#"div[data-hook="review"]"#;
const RATING_SELECTOR: &str = r#"[data-hook="review-star-rating"]"#;
const TITLE_SELECTOR: &str = r#"[data-hook="review-title"]"#;
const BODY_SELECTOR: &str = r#"[data-hook="review-body"]"#;
const DATE_SELECTOR: &str = r#"[data-hook="review-date"]"#;
const SEARCH_RESULT_SELECTOR: &str = "div[data-index]";
const LINK_SELECTOR: &str = "a[href]";

/// Errors raised while extracting data from a page
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unrecognized rating format (class {class_attr:?}, text {text:?})")]
    Rating { class_attr: String, text: String },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),
}

/// The review list container of a page
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewList {
    /// The page has no review list container
    Missing,

    /// The reviews found in the container, possibly none
    Entries(Vec<Review>),
}

/// Everything extracted from one review page
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPage {
    /// Total review count announced by the page, if it has the marker
    pub total_reviews: Option<u32>,

    /// The review list
    pub list: ReviewList,
}

/// Number of review pages for a given total review count
///
/// # Example
///
/// ```
/// use review_ripple::crawler::page_count;
///
/// assert_eq!(page_count(0), 0);
/// assert_eq!(page_count(10), 1);
/// assert_eq!(page_count(23), 3);
/// ```
pub fn page_count(total_reviews: u32) -> u32 {
    total_reviews.div_ceil(REVIEWS_PER_PAGE)
}

/// Reads the review count out of the count marker's text
///
/// All digits are concatenated (`"1,234 global reviews"` → 1234). Text
/// without digits counts as 1.
pub fn parse_total_reviews(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 1;
    }
    digits.parse().unwrap_or(u32::MAX)
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn child_text(parent: &ElementRef, selector: &Selector) -> String {
    parent
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}

/// Parses one page of a product's reviews
///
/// # Arguments
///
/// * `html` - The page content
/// * `product_id` - The product whose reviews the page lists
///
/// # Returns
///
/// * `Ok(ReviewPage)` - The count marker (if any) and the review list
/// * `Err(ParseError)` - A selector failed to compile
pub fn parse_review_page(html: &str, product_id: &ProductId) -> Result<ReviewPage, ParseError> {
    let document = Html::parse_document(html);

    let total_reviews = document
        .select(&selector(TOTAL_COUNT_SELECTOR)?)
        .next()
        .map(|e| parse_total_reviews(&element_text(&e)));

    let list = match document.select(&selector(REVIEW_LIST_SELECTOR)?).next() {
        Some(container) => ReviewList::Entries(extract_reviews(&container, product_id)?),
        None => ReviewList::Missing,
    };

    Ok(ReviewPage {
        total_reviews,
        list,
    })
}

fn extract_reviews(
    container: &ElementRef,
    product_id: &ProductId,
) -> Result<Vec<Review>, ParseError> {
    let review_selector = selector(REVIEW_SELECTOR)?;
    let rating_selector = selector(RATING_SELECTOR)?;
    let title_selector = selector(TITLE_SELECTOR)?;
    let body_selector = selector(BODY_SELECTOR)?;
    let date_selector = selector(DATE_SELECTOR)?;

    let reviews = container
        .select(&review_selector)
        .map(|entry| {
            let rating = match entry.select(&rating_selector).next() {
                Some(star) => {
                    let class_attr = star.value().attr("class").unwrap_or("");
                    parse_rating(class_attr, &element_text(&star)).unwrap_or_else(|e| {
                        tracing::warn!("{}: {}", product_id, e);
                        String::new()
                    })
                }
                None => {
                    tracing::warn!("{}: review without a star rating", product_id);
                    String::new()
                }
            };

            Review {
                body: child_text(&entry, &body_selector),
                product_id: product_id.clone(),
                rating,
                review_date: child_text(&entry, &date_selector),
                title: child_text(&entry, &title_selector),
            }
        })
        .collect();

    Ok(reviews)
}

/// Extracts the product identifiers listed on a search result page
///
/// Result containers are `div` elements carrying `data-index`; their
/// `data-asin` attribute names the product. Containers without a valid
/// `data-asin` fall back to the first product link inside them. Duplicates
/// are dropped, page order is kept.
pub fn parse_search_results(html: &str) -> Result<Vec<ProductId>, ParseError> {
    let document = Html::parse_document(html);
    let link_selector = selector(LINK_SELECTOR)?;

    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for result in document.select(&selector(SEARCH_RESULT_SELECTOR)?) {
        let from_attr = result
            .value()
            .attr("data-asin")
            .and_then(|asin| ProductId::parse(asin).ok());

        let id = from_attr.or_else(|| {
            result
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .find_map(extract_product_id)
        });

        match id {
            Some(id) if seen.insert(id.clone()) => ids.push(id),
            Some(_) => {}
            None => tracing::debug!("Search result without a product id skipped"),
        }
    }

    Ok(ids)
}
