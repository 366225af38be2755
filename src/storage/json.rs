//! JSON file storage backend
//!
//! Each product gets `<dir>/<product_id>.json`, a pretty-printed JSON array of
//! its reviews with sorted keys and non-ASCII text kept as-is.

use crate::product::ProductId;
use crate::review::Review;
use crate::storage::traits::{single_product_id, ReviewStore, StorageResult};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Review storage backed by one JSON file per product
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, creating the output directory if needed
    ///
    /// An existing directory is reused; any other filesystem error is returned.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        match fs::create_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!("Review store opened at {}", dir.display());
        Ok(Self { dir })
    }

    /// Directory holding the review files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a product's review file
    pub fn path_for(&self, product_id: &ProductId) -> PathBuf {
        self.dir.join(format!("{}.json", product_id))
    }

    /// Writes into a temporary file next to `path`, then links it into place
    ///
    /// Returns `Ok(false)` when `path` already exists. A write that fails or
    /// never finishes leaves only the temporary file, which is removed on drop
    /// and is never mistaken for a review file.
    fn write_atomically<F>(&self, path: &Path, write: F) -> StorageResult<bool>
    where
        F: FnOnce(&mut NamedTempFile) -> StorageResult<()>,
    {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        write(&mut tmp)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("{} already exists, not overwriting", path.display());
                Ok(false)
            }
            Err(e) => Err(e.error.into()),
        }
    }
}

fn write_reviews<W: Write>(mut writer: W, reviews: &[Review]) -> StorageResult<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    reviews.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

impl ReviewStore for JsonFileStore {
    fn exists(&self, product_id: &ProductId) -> bool {
        self.path_for(product_id).is_file()
    }

    fn persist(&mut self, reviews: &[Review]) -> StorageResult<bool> {
        let Some(product_id) = single_product_id(reviews)? else {
            return Ok(false);
        };

        let path = self.path_for(product_id);
        if !self.write_atomically(&path, |file| write_reviews(BufWriter::new(file), reviews))? {
            return Ok(false);
        }

        tracing::info!(
            "Saved {} reviews for {} to {}",
            reviews.len(),
            product_id,
            path.display()
        );
        Ok(true)
    }

    fn load(&self, product_id: &ProductId) -> StorageResult<Option<Vec<Review>>> {
        let content = match fs::read_to_string(self.path_for(product_id)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn list(&self) -> StorageResult<Vec<ProductId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| ProductId::parse(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
