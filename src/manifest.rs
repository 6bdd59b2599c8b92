//! Manifest assembly and serialization.
//!
//! The manifest records, per catalog id, the pose and pixel dimensions of
//! every scanned view. It derives only from parsed views, not from
//! derivative generation success, so the same scan always yields the
//! same document:
//!
//! ```yaml
//! - cat: 7
//!   images:
//!   - face: main
//!     width: 3000
//!     height: 2000
//!   - face: top
//!     width: 1200
//!     height: 900
//! ```
//!
//! Source paths are deliberately absent: the document describes the
//! catalog, not the machine it was built on.

use crate::scan::Artifact;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = "manifest.yml";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Dimensions of one view, keyed by its pose ("face").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub face: String,
    pub width: u32,
    pub height: u32,
}

/// All view dimensions for one catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub cat: u32,
    pub images: Vec<ImageEntry>,
}

/// Build manifest entries from scanned artifacts.
///
/// Entries come back in catalog-id ascending order regardless of the input
/// order, so parallel completion order can never leak into the document.
pub fn build(artifacts: &[Artifact]) -> Vec<ManifestEntry> {
    let mut entries: Vec<ManifestEntry> = artifacts
        .iter()
        .map(|artifact| ManifestEntry {
            cat: artifact.catalog_id,
            images: artifact
                .views
                .iter()
                .map(|view| ImageEntry {
                    face: view.pose.clone(),
                    width: view.width,
                    height: view.height,
                })
                .collect(),
        })
        .collect();
    entries.sort_by_key(|e| e.cat);
    entries
}

/// Serialize entries to YAML at `path`.
pub fn write(entries: &[ManifestEntry], path: &Path) -> Result<(), ManifestError> {
    let yaml = serde_yaml::to_string(entries)?;
    std::fs::write(path, yaml)?;
    Ok(())
}
