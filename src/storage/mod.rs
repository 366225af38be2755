//! Storage module for persisting review collections
//!
//! This module handles:
//! - Explicit initialization of the output directory
//! - Write-once persistence of one collection per product
//! - The "already fetched" check used to skip products
//! - Reading collections back for summaries

mod json;
mod traits;

pub use json::JsonFileStore;
pub use traits::{single_product_id, ReviewStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the JSON file store rooted at `path`
///
/// This is the one-time initialization step run at process start.
pub fn open_storage(path: &Path) -> StorageResult<JsonFileStore> {
    JsonFileStore::open(path)
}
