//! Review records
//!
//! A [`Review`] is one user-submitted review extracted from a product's review
//! pages. Field order is alphabetical so serialized collections come out with
//! sorted keys.

mod rating;

pub use rating::parse_rating;

use crate::product::ProductId;
use serde::{Deserialize, Serialize};

/// One extracted review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review text
    pub body: String,

    /// Product the review belongs to
    pub product_id: ProductId,

    /// Star rating as displayed (e.g. `"4"` or `"3.5"`), empty when unreadable
    pub rating: String,

    /// Date line as displayed on the page, may be empty
    pub review_date: String,

    /// Review headline
    pub title: String,
}
