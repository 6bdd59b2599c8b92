//! Derivative generation pipeline.
//!
//! Sequences the whole run as a linear state machine:
//!
//! ```text
//! Initializing → DirectoriesPrepared → Scanned → MainGenerated
//!     → ThumbsGenerated → TilesGenerated → ManifestWritten → Done
//! ```
//!
//! Each generation stage runs over every artifact before the next stage
//! starts. The only fatal conditions are an unreadable input directory and
//! a failed manifest write. Everything per-artifact or per-view (a source
//! that will not decode, a tile job that exits nonzero) is absorbed as a
//! warning so one bad catalog item can never abort the batch.
//!
//! ## Parallel Processing
//!
//! Within a stage, artifacts are processed in parallel using
//! [rayon](https://docs.rs/rayon). Artifacts are never aliased across
//! workers and stage results are collected positionally, so output order is
//! artifact order regardless of completion order. Tile jobs (one external
//! process per view) parallelize the same way, bounded by the rayon pool.
//!
//! ## Progress Events
//!
//! The pipeline reports progress through an optional [`mpsc`] channel of
//! [`PipelineEvent`]s; the CLI prints them from a dedicated thread. A
//! pipeline without a channel runs silently.
//!
//! [`mpsc`]: std::sync::mpsc

use crate::config::Config;
use crate::imaging::{ImageBackend, Quality, create_bounded_image};
use crate::manifest::{self, ManifestError};
use crate::scan::{self, Artifact, ScanError, ScanReport, View};
use crate::tiling::{TileParams, TilePyramidBuilder};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Output subdirectory for display images.
pub const MAIN_DIR: &str = "main";
/// Output subdirectory for thumbnails.
pub const THUMBS_DIR: &str = "thumbs";
/// Output subdirectory for tile pyramids.
pub const TILES_DIR: &str = "tiles";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Linear pipeline states. Each state names completed work; `Done` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    DirectoriesPrepared,
    Scanned,
    MainGenerated,
    ThumbsGenerated,
    TilesGenerated,
    ManifestWritten,
    Done,
}

impl Stage {
    /// The state that follows this one.
    pub fn next(self) -> Stage {
        match self {
            Stage::Initializing => Stage::DirectoriesPrepared,
            Stage::DirectoriesPrepared => Stage::Scanned,
            Stage::Scanned => Stage::MainGenerated,
            Stage::MainGenerated => Stage::ThumbsGenerated,
            Stage::ThumbsGenerated => Stage::TilesGenerated,
            Stage::TilesGenerated => Stage::ManifestWritten,
            Stage::ManifestWritten => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }

    /// Progress banner for the work leading into this state.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Stage::Initializing | Stage::Done => None,
            Stage::DirectoriesPrepared => Some("Preparing output directories"),
            Stage::Scanned => Some("Scanning sources"),
            Stage::MainGenerated => Some("Generating display images"),
            Stage::ThumbsGenerated => Some("Generating thumbnails"),
            Stage::TilesGenerated => Some("Generating tile pyramids"),
            Stage::ManifestWritten => Some("Writing manifest"),
        }
    }
}

/// The two single-pose derivative stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeKind {
    Main,
    Thumbnail,
}

impl DerivativeKind {
    /// Pose this derivative is generated from. Artifacts without it are
    /// silently skipped: a catalog item may legitimately lack the pose.
    pub fn required_pose(self) -> &'static str {
        match self {
            DerivativeKind::Main => "main",
            DerivativeKind::Thumbnail => "top",
        }
    }

    /// Output subdirectory for this derivative.
    pub fn subdir(self) -> &'static str {
        match self {
            DerivativeKind::Main => MAIN_DIR,
            DerivativeKind::Thumbnail => THUMBS_DIR,
        }
    }

    /// Display label used in events and warnings.
    pub fn describe(self) -> &'static str {
        match self {
            DerivativeKind::Main => "display image",
            DerivativeKind::Thumbnail => "thumbnail",
        }
    }
}

/// Progress notifications emitted while the pipeline runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted {
        label: &'static str,
    },
    ScanCompleted {
        report: ScanReport,
    },
    DerivativeWritten {
        kind: DerivativeKind,
        catalog_id: u32,
        width: u32,
        height: u32,
    },
    TilesWritten {
        catalog_id: u32,
        pose: String,
    },
    StepFailed {
        catalog_id: u32,
        detail: String,
    },
}

/// Counts and warnings from a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub scan: ScanReport,
    pub mains: usize,
    pub thumbs: usize,
    pub tile_sets: usize,
    /// Absorbed per-artifact failures, in artifact order per stage.
    pub warnings: Vec<String>,
    pub manifest_path: PathBuf,
}

impl RunSummary {
    pub fn artifact_count(&self) -> usize {
        self.scan.artifacts.len()
    }
}

/// Outcome of one parallel step, collected positionally per stage.
enum StepResult {
    Written,
    NoMatchingPose,
    Failed { catalog_id: u32, detail: String },
}

struct StageOutcome {
    written: usize,
    warnings: Vec<String>,
}

impl StageOutcome {
    fn from_results(results: Vec<StepResult>) -> Self {
        let mut written = 0;
        let mut warnings = Vec::new();
        for result in results {
            match result {
                StepResult::Written => written += 1,
                StepResult::NoMatchingPose => {}
                StepResult::Failed { catalog_id, detail } => {
                    warnings.push(format!("catalog {catalog_id}: {detail}"));
                }
            }
        }
        Self { written, warnings }
    }
}

fn send(events: &mut Option<Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Drives one batch run from `Initializing` to `Done`.
pub struct Pipeline<'a, B: ImageBackend, T: TilePyramidBuilder> {
    backend: &'a B,
    tiler: &'a T,
    config: &'a Config,
    input: &'a Path,
    output: &'a Path,
    events: Option<Sender<PipelineEvent>>,
    stage: Stage,
}

impl<'a, B: ImageBackend, T: TilePyramidBuilder> Pipeline<'a, B, T> {
    pub fn new(
        backend: &'a B,
        tiler: &'a T,
        config: &'a Config,
        input: &'a Path,
        output: &'a Path,
    ) -> Self {
        Self {
            backend,
            tiler,
            config,
            input,
            output,
            events: None,
            stage: Stage::Initializing,
        }
    }

    /// Attach a progress channel. Events are best-effort; a dropped
    /// receiver never stalls the run.
    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Announce the work leading into the next state.
    fn begin_next(&self) {
        if let Some(label) = self.stage.next().label() {
            self.emit(PipelineEvent::StageStarted { label });
        }
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
    }

    /// Run the full pipeline. See the [module docs](self) for the stage
    /// sequence and failure containment rules.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        self.begin_next();
        self.prepare_directories()?;
        self.advance();

        self.begin_next();
        let report = scan::scan(self.backend, self.input, &self.config.scan)?;
        self.emit(PipelineEvent::ScanCompleted {
            report: report.clone(),
        });
        self.advance();

        self.begin_next();
        let mains = self.generate_bounded(&report.artifacts, DerivativeKind::Main);
        self.advance();

        self.begin_next();
        let thumbs = self.generate_bounded(&report.artifacts, DerivativeKind::Thumbnail);
        self.advance();

        self.begin_next();
        let tiles = self.generate_tiles(&report.artifacts);
        self.advance();

        self.begin_next();
        let entries = manifest::build(&report.artifacts);
        let manifest_path = self.output.join(manifest::MANIFEST_FILENAME);
        manifest::write(&entries, &manifest_path)?;
        self.advance();

        self.advance();

        let mut warnings = Vec::new();
        let mains_written = mains.written;
        let thumbs_written = thumbs.written;
        let tile_sets_written = tiles.written;
        warnings.extend(mains.warnings);
        warnings.extend(thumbs.warnings);
        warnings.extend(tiles.warnings);

        Ok(RunSummary {
            scan: report,
            mains: mains_written,
            thumbs: thumbs_written,
            tile_sets: tile_sets_written,
            warnings,
            manifest_path,
        })
    }

    /// Create the output subdirectories if absent.
    ///
    /// Idempotent: re-running against a prior output directory must not
    /// fail or clear existing contents.
    fn prepare_directories(&self) -> Result<(), PipelineError> {
        for subdir in [MAIN_DIR, THUMBS_DIR, TILES_DIR] {
            std::fs::create_dir_all(self.output.join(subdir))?;
        }
        Ok(())
    }

    /// Generate one bounded JPEG per artifact that carries the required
    /// pose. Artifacts without it are silent no-ops.
    fn generate_bounded(&self, artifacts: &[Artifact], kind: DerivativeKind) -> StageOutcome {
        let dir = self.output.join(kind.subdir());
        let bound = match kind {
            DerivativeKind::Main => self.config.images.main_width,
            DerivativeKind::Thumbnail => self.config.images.thumb_width,
        };
        let quality = Quality::new(self.config.images.quality);

        let results: Vec<StepResult> = artifacts
            .par_iter()
            .map_with(self.events.clone(), |events, artifact| {
                let Some(view) = artifact.view_for_pose(kind.required_pose()) else {
                    return StepResult::NoMatchingPose;
                };
                let output = dir.join(format!("{}.jpg", artifact.catalog_id));
                match create_bounded_image(
                    self.backend,
                    &view.source_path,
                    &output,
                    (view.width, view.height),
                    bound,
                    quality,
                ) {
                    Ok((width, height)) => {
                        send(
                            events,
                            PipelineEvent::DerivativeWritten {
                                kind,
                                catalog_id: artifact.catalog_id,
                                width,
                                height,
                            },
                        );
                        StepResult::Written
                    }
                    Err(e) => {
                        let detail = format!("{}: {}", kind.describe(), e);
                        send(
                            events,
                            PipelineEvent::StepFailed {
                                catalog_id: artifact.catalog_id,
                                detail: detail.clone(),
                            },
                        );
                        StepResult::Failed {
                            catalog_id: artifact.catalog_id,
                            detail,
                        }
                    }
                }
            })
            .collect();

        StageOutcome::from_results(results)
    }

    /// Invoke the tiler once per view across all artifacts.
    fn generate_tiles(&self, artifacts: &[Artifact]) -> StageOutcome {
        let tiles_dir = self.output.join(TILES_DIR);
        let jobs: Vec<(u32, &View)> = artifacts
            .iter()
            .flat_map(|a| a.views.iter().map(move |v| (a.catalog_id, v)))
            .collect();

        let results: Vec<StepResult> = jobs
            .par_iter()
            .map_with(self.events.clone(), |events, (catalog_id, view)| {
                let params = TileParams {
                    source: view.source_path.clone(),
                    output_base: tiles_dir.join(catalog_id.to_string()).join(&view.pose),
                    tile_size: self.config.tiles.size,
                    format: self.config.tiles.format.clone(),
                    overwrite: true,
                };
                match self.tiler.build(&params) {
                    Ok(()) => {
                        send(
                            events,
                            PipelineEvent::TilesWritten {
                                catalog_id: *catalog_id,
                                pose: view.pose.clone(),
                            },
                        );
                        StepResult::Written
                    }
                    Err(e) => {
                        let detail = format!("tiles for pose {}: {}", view.pose, e);
                        send(
                            events,
                            PipelineEvent::StepFailed {
                                catalog_id: *catalog_id,
                                detail: detail.clone(),
                            },
                        );
                        StepResult::Failed {
                            catalog_id: *catalog_id,
                            detail,
                        }
                    }
                }
            })
            .collect();

        StageOutcome::from_results(results)
    }
}
