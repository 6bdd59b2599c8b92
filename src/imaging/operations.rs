//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{Quality, ResizeParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Create a bounded derivative of `source` at `output`.
///
/// The output's longer edge is at most `bound`; sources already within the
/// bound are re-encoded at their original dimensions (never upscaled).
/// Returns the dimensions actually written.
pub fn create_bounded_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    bound: u32,
    quality: Quality,
) -> Result<(u32, u32)> {
    let (width, height) = fit_within(original_dims, bound);
    backend.resize(&ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    })?;
    Ok((width, height))
}
