//! Product identifier handling
//!
//! A product identifier is a 10 character code made of uppercase ASCII letters
//! and digits (e.g. `B01H8A7Q42`). This module provides:
//! - Strict validation of identifiers coming from input files and search results
//! - Lenient extraction of identifiers out of product links

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::ScraperError;

/// Path markers that precede a product identifier inside a product link
///
/// When a link carries both markers, the later entry wins.
const PATH_MARKERS: [&str; 2] = ["/dp/", "/gp/product/"];

fn strict_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{10}$").expect("product id pattern is valid"))
}

fn prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{10}").expect("product id pattern is valid"))
}

/// A validated product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Parses a product identifier, requiring the whole input to match
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use review_ripple::ProductId;
    ///
    /// assert!(ProductId::parse("B01H8A7Q42").is_ok());
    /// assert!(ProductId::parse("b01h8a7q42").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ScraperError> {
        let trimmed = raw.trim();
        if strict_pattern().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ScraperError::InvalidProductId(raw.to_string()))
        }
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductId {
    type Error = ScraperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProductId::parse(&value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Extracts a product identifier from a product link
///
/// The link may be relative (`/Some-Phone/dp/B01H8A7Q42/ref=sr_1_1`) or
/// absolute. The path segment right after a `/dp/` or `/gp/product/` marker is
/// the candidate; it must start with 10 uppercase letters or digits, and those
/// 10 characters are returned. Trailing characters in the segment (query
/// strings, for instance) are ignored.
///
/// Returns `None` when no marker is present or the candidate does not match.
///
/// # Example
///
/// ```
/// use review_ripple::extract_product_id;
///
/// let id = extract_product_id("/Some-Phone/dp/B01H8A7Q42/ref=sr_1_1").unwrap();
/// assert_eq!(id.as_str(), "B01H8A7Q42");
/// assert!(extract_product_id("/help/contact").is_none());
/// ```
pub fn extract_product_id(link: &str) -> Option<ProductId> {
    let candidate = PATH_MARKERS
        .iter()
        .filter_map(|marker| {
            link.find(marker)
                .map(|pos| &link[pos + marker.len()..])
                .and_then(|rest| rest.split('/').next())
        })
        .last()?;

    prefix_pattern()
        .find(candidate)
        .map(|m| ProductId(m.as_str().to_string()))
}
