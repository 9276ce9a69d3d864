//! Filesystem asset store.
//!
//! Provides a stable, collision-free path layout for generated assets and
//! manifests, plus the existence and read-back checks the validation engine
//! relies on. Paths encode the asset category, identifier, and refinement
//! iteration so that retried generations never overwrite each other.

use std::path::{Path, PathBuf};

pub use crate::error::StoreError;

/// Subdirectory names under the store root.
const IMAGES_DIR: &str = "images";
const VIDEOS_DIR: &str = "videos";
const DECKS_DIR: &str = "decks";
const MANIFESTS_DIR: &str = "manifests";

/// Filesystem layout manager for generated assets.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Creates a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the full directory layout under the root.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LayoutFailed` if any directory cannot be created.
    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        for dir in [IMAGES_DIR, VIDEOS_DIR, DECKS_DIR, MANIFESTS_DIR] {
            let path = self.root.join(dir);
            std::fs::create_dir_all(&path).map_err(|source| StoreError::LayoutFailed {
                root: self.root.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Path for a slide image at a given refinement iteration.
    pub fn image_path(&self, slide_number: u32, iteration: u32) -> PathBuf {
        self.root
            .join(IMAGES_DIR)
            .join(format!("slide_{}_{}.png", slide_number, iteration))
    }

    /// Path for a video at a given refinement iteration.
    pub fn video_path(&self, video_id: &str, iteration: u32) -> PathBuf {
        self.root
            .join(VIDEOS_DIR)
            .join(format!("{}_{}.mp4", video_id, iteration))
    }

    /// Path for an assembled deck.
    pub fn deck_path(&self, deck_id: &str) -> PathBuf {
        self.root.join(DECKS_DIR).join(format!("{}.pdf", deck_id))
    }

    /// Path for a published manifest.
    pub fn manifest_path(&self, manifest_id: &str) -> PathBuf {
        self.root
            .join(MANIFESTS_DIR)
            .join(format!("{}.json", manifest_id))
    }

    /// Path for a published validation report.
    pub fn report_path(&self, manifest_id: &str) -> PathBuf {
        self.root
            .join(MANIFESTS_DIR)
            .join(format!("{}_validation.json", manifest_id))
    }

    /// Returns whether an asset exists at the given location.
    pub fn exists(&self, location: &Path) -> bool {
        location.is_file()
    }

    /// Returns the on-disk size of an asset in bytes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the asset is missing.
    pub fn size_bytes(&self, location: &Path) -> Result<u64, StoreError> {
        let meta =
            std::fs::metadata(location).map_err(|_| StoreError::NotFound(location.to_path_buf()))?;
        Ok(meta.len())
    }

    /// Reads an asset back for integrity checking.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the asset is missing, or
    /// `StoreError::Io` if it cannot be read.
    pub fn read_back(&self, location: &Path) -> Result<Vec<u8>, StoreError> {
        if !self.exists(location) {
            return Err(StoreError::NotFound(location.to_path_buf()));
        }
        Ok(std::fs::read(location)?)
    }

    /// Writes asset bytes to the given location, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the write fails.
    pub fn write(&self, location: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(location, bytes)?;
        Ok(())
    }
}
