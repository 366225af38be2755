//! Storage traits and error types
//!
//! This module defines the trait interface for review storage backends and
//! associated error types.

use crate::product::ProductId;
use crate::review::Review;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("All reviews in a collection must share one product id, found {0:?}")]
    MixedProducts(Vec<ProductId>),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for review storage backends
///
/// A product's review collection is written at most once. Once a collection
/// exists for a product, it is never replaced.
pub trait ReviewStore {
    /// Whether a review collection already exists for this product
    fn exists(&self, product_id: &ProductId) -> bool;

    /// Stores the reviews of a single product
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The collection was written
    /// * `Ok(false)` - Nothing to write, or a collection already exists
    /// * `Err(StorageError::MixedProducts)` - The reviews belong to several products
    fn persist(&mut self, reviews: &[Review]) -> StorageResult<bool>;

    /// Reads a product's review collection back
    fn load(&self, product_id: &ProductId) -> StorageResult<Option<Vec<Review>>>;

    /// Lists every product with a stored collection, sorted
    fn list(&self) -> StorageResult<Vec<ProductId>>;
}

/// Returns the single product id shared by `reviews`
///
/// `Ok(None)` for an empty slice, `MixedProducts` when ids differ.
pub fn single_product_id(reviews: &[Review]) -> StorageResult<Option<&ProductId>> {
    let Some(first) = reviews.first() else {
        return Ok(None);
    };

    let mut others: Vec<ProductId> = reviews
        .iter()
        .map(|r| &r.product_id)
        .filter(|id| *id != &first.product_id)
        .cloned()
        .collect();

    if others.is_empty() {
        return Ok(Some(&first.product_id));
    }

    others.sort();
    others.dedup();
    others.insert(0, first.product_id.clone());
    Err(StorageError::MixedProducts(others))
}
