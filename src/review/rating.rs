//! Star rating extraction
//!
//! The review page renders a rating as an icon whose styling classes encode
//! the value, for example:
//!
//! ```html
//! <i data-hook="review-star-rating" class="a-icon a-icon-star a-star-4 review-rating">
//!   <span class="a-icon-alt">4.0 out of 5 stars</span>
//! </i>
//! ```
//!
//! # Format contract
//!
//! | Source | Form | Result |
//! |--------|------|--------|
//! | class token | `a-star-N` | `N` |
//! | class token | `a-star-N-M` | `N.M` |
//! | class token | `a-star-<size>-N[-M]` | same as above |
//! | element text (fallback) | `X out of 5 stars` | `X`, with a `.0` suffix dropped |
//!
//! `N` is a single digit between 0 and 5. Anything else is a
//! [`ParseError::Rating`].

use crate::crawler::ParseError;
use regex::Regex;
use std::sync::OnceLock;

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^a-star-(?:[a-z]+-)?([0-5])(?:-([0-9]))?$").expect("rating pattern is valid")
    })
}

fn text_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-5])(?:[.,]([0-9]))?\s+out of\s+5").expect("rating pattern is valid")
    })
}

fn format_rating(whole: &str, fraction: Option<&str>) -> String {
    match fraction {
        Some(f) if f != "0" => format!("{}.{}", whole, f),
        _ => whole.to_string(),
    }
}

/// Parses a star rating from an element's class attribute and text
///
/// Class tokens are checked first; the text is only consulted when no token
/// matches.
///
/// # Example
///
/// ```
/// use review_ripple::review::parse_rating;
///
/// let rating = parse_rating("a-icon a-icon-star a-star-4 review-rating", "").unwrap();
/// assert_eq!(rating, "4");
/// ```
pub fn parse_rating(class_attr: &str, text: &str) -> Result<String, ParseError> {
    let from_class = class_attr.split_whitespace().find_map(|token| {
        class_pattern().captures(token).map(|caps| {
            let whole = caps.get(1).map_or("", |m| m.as_str());
            format_rating(whole, caps.get(2).map(|m| m.as_str()))
        })
    });

    if let Some(rating) = from_class {
        return Ok(rating);
    }

    text_pattern()
        .captures(text)
        .map(|caps| {
            let whole = caps.get(1).map_or("", |m| m.as_str());
            format_rating(whole, caps.get(2).map(|m| m.as_str()))
        })
        .ok_or_else(|| ParseError::Rating {
            class_attr: class_attr.to_string(),
            text: text.trim().to_string(),
        })
}
