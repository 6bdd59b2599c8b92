//! # Vitrine
//!
//! Batch converter for catalog photographs. Your filenames are the data
//! source: a flat directory of `{catalogId}__{pose}.ext` images becomes a
//! standardized set of derivative assets plus a dimensions manifest.
//!
//! # Architecture: Staged Pipeline
//!
//! One run moves through a fixed sequence of stages, each operating on
//! every artifact before the next begins:
//!
//! ```text
//! 1. Scan      sources/  →  Artifacts        (filenames → grouped views)
//! 2. Main      Artifacts →  main/{id}.jpg    (display images, ≤ 2000px)
//! 3. Thumbs    Artifacts →  thumbs/{id}.jpg  (thumbnails, ≤ 500px)
//! 4. Tiles     Artifacts →  tiles/{id}/{pose}/  (deep-zoom pyramids)
//! 5. Manifest  Artifacts →  manifest.yml     (pose dimensions per catalog)
//! ```
//!
//! The stages are independent on purpose: manifest data derives only from
//! the scan, so a failed tile job or an artifact without a "main" pose
//! never changes what the manifest records.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | `{catalogId}__{pose}` filename convention parser |
//! | [`scan`] | walks the input directory, groups views into id-sorted artifacts |
//! | [`imaging`] | image backend trait, dimension math, pure-Rust resize/encode |
//! | [`tiling`] | tile-pyramid capability trait + `vips dzsave` implementation |
//! | [`manifest`] | per-catalog dimension entries, YAML serialization |
//! | [`pipeline`] | stage machine driving generation across all artifacts |
//! | [`config`] | optional `config.toml` loading and validation |
//! | [`output`] | CLI output formatting — pure formatting of reports and events |
//!
//! # Design Decisions
//!
//! ## Capability Boundaries as Traits
//!
//! The pipeline consumes two capabilities it does not implement: pixel work
//! ([`imaging::ImageBackend`]) and deep-zoom tiling
//! ([`tiling::TilePyramidBuilder`]). Both are traits with one production
//! implementation and mock implementations for tests, so orchestration
//! logic is exercised without encoding images or spawning processes.
//!
//! ## Absorbed Failures
//!
//! A batch covers hundreds of catalog items; one corrupt scan or missing
//! pose must not sink the rest. Only two conditions are fatal: an invalid
//! input directory and a failed manifest write. Everything else becomes a
//! warning in the run summary.
//!
//! ## Explicit Output Paths
//!
//! Every generator receives absolute output paths through its parameters.
//! Nothing changes the working directory, so stages parallelize without
//! hidden shared process state.

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod tiling;

#[cfg(test)]
pub(crate) mod test_helpers;
