//! CLI output formatting for the pipeline.
//!
//! # Information-First Display
//!
//! Output is information-centric, not file-centric: the primary display for
//! every entity is its catalog identity (id, pose, dimensions) with
//! filesystem detail shown only where it helps the user trace a warning
//! back to a specific file.
//!
//! ```text
//! Artifacts
//!     7 (2 views)
//!         main 3000x2000
//!         top 1200x900
//!     12 (1 view)
//!         bottom 50x50
//!
//! Skipped
//!     holiday-snap.jpg: filename does not match {id}__{pose}
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::naming::is_recognized_pose;
use crate::pipeline::{DerivativeKind, PipelineEvent, RunSummary};
use crate::scan::ScanReport;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Scan report
// ============================================================================

/// Format the scan report: one block per artifact, then skip warnings.
pub fn format_scan_report(report: &ScanReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Artifacts".to_string());
    for artifact in &report.artifacts {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            artifact.catalog_id,
            plural(artifact.views.len(), "view")
        ));
        for view in &artifact.views {
            let marker = if is_recognized_pose(&view.pose) {
                ""
            } else {
                " (unrecognized pose)"
            };
            lines.push(format!(
                "{}{} {}x{}{}",
                indent(2),
                view.pose,
                view.width,
                view.height,
                marker
            ));
        }
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skip in &report.skipped {
            let name = skip
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| skip.path.display().to_string());
            lines.push(format!("{}{}: {}", indent(1), name, skip.reason));
        }
    }

    lines
}

/// Print the scan report to stdout.
pub fn print_scan_report(report: &ScanReport) {
    for line in format_scan_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Pipeline events
// ============================================================================

/// Format a single pipeline progress event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::StageStarted { label } => vec![format!("==> {label}")],
        PipelineEvent::ScanCompleted { report } => format_scan_report(report),
        PipelineEvent::DerivativeWritten {
            kind,
            catalog_id,
            width,
            height,
        } => {
            let label = match kind {
                DerivativeKind::Main => "main",
                DerivativeKind::Thumbnail => "thumb",
            };
            vec![format!(
                "{}{} {} {}x{}",
                indent(1),
                catalog_id,
                label,
                width,
                height
            )]
        }
        PipelineEvent::TilesWritten { catalog_id, pose } => {
            vec![format!("{}{} tiles {}", indent(1), catalog_id, pose)]
        }
        PipelineEvent::StepFailed { catalog_id, detail } => {
            vec![format!("{}{} failed: {}", indent(1), catalog_id, detail)]
        }
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Format the final run summary: counts, then absorbed warnings.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "Generated {}, {}, {} for {}",
        plural(summary.mains, "display image"),
        plural(summary.thumbs, "thumbnail"),
        plural(summary.tile_sets, "tile set"),
        plural(summary.artifact_count(), "artifact"),
    ));
    lines.push(format!("Manifest: {}", summary.manifest_path.display()));

    if !summary.warnings.is_empty() {
        lines.push(String::new());
        lines.push(plural(summary.warnings.len(), "warning"));
        for warning in &summary.warnings {
            lines.push(format!("{}{}", indent(1), warning));
        }
    }

    lines
}

/// Print the run summary to stdout.
pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{Artifact, SkipReason, SkippedFile, View};
    use std::path::PathBuf;

    fn sample_report() -> ScanReport {
        ScanReport {
            artifacts: vec![
                Artifact {
                    catalog_id: 7,
                    views: vec![
                        View {
                            pose: "main".to_string(),
                            source_path: PathBuf::from("/in/7__main.tif"),
                            width: 3000,
                            height: 2000,
                        },
                        View {
                            pose: "top".to_string(),
                            source_path: PathBuf::from("/in/7__top.tif"),
                            width: 1200,
                            height: 900,
                        },
                    ],
                },
                Artifact {
                    catalog_id: 12,
                    views: vec![View {
                        pose: "detail".to_string(),
                        source_path: PathBuf::from("/in/12__detail.tif"),
                        width: 50,
                        height: 50,
                    }],
                },
            ],
            skipped: vec![SkippedFile {
                path: PathBuf::from("/in/holiday-snap.jpg"),
                reason: SkipReason::UnparsableName,
            }],
        }
    }

    #[test]
    fn scan_report_lists_artifacts_and_views() {
        let lines = format_scan_report(&sample_report());

        assert_eq!(lines[0], "Artifacts");
        assert_eq!(lines[1], "    7 (2 views)");
        assert_eq!(lines[2], "        main 3000x2000");
        assert_eq!(lines[3], "        top 1200x900");
        assert_eq!(lines[4], "    12 (1 view)");
    }

    #[test]
    fn unrecognized_pose_is_annotated() {
        let lines = format_scan_report(&sample_report());
        assert_eq!(lines[5], "        detail 50x50 (unrecognized pose)");
    }

    #[test]
    fn skipped_files_shown_by_basename() {
        let lines = format_scan_report(&sample_report());
        let skip_line = lines.last().unwrap();
        assert_eq!(
            skip_line,
            "    holiday-snap.jpg: filename does not match {id}__{pose}"
        );
        assert!(!skip_line.contains("/in/"));
    }

    #[test]
    fn stage_event_formats_as_banner() {
        let lines = format_event(&PipelineEvent::StageStarted {
            label: "Generating thumbnails",
        });
        assert_eq!(lines, vec!["==> Generating thumbnails"]);
    }

    #[test]
    fn derivative_event_shows_dimensions() {
        let lines = format_event(&PipelineEvent::DerivativeWritten {
            kind: DerivativeKind::Main,
            catalog_id: 7,
            width: 2000,
            height: 1333,
        });
        assert_eq!(lines, vec!["    7 main 2000x1333"]);
    }

    #[test]
    fn tiles_event_shows_pose() {
        let lines = format_event(&PipelineEvent::TilesWritten {
            catalog_id: 12,
            pose: "bottom".to_string(),
        });
        assert_eq!(lines, vec!["    12 tiles bottom"]);
    }

    #[test]
    fn failure_event_shows_detail() {
        let lines = format_event(&PipelineEvent::StepFailed {
            catalog_id: 12,
            detail: "tiles for pose bottom: exit 1".to_string(),
        });
        assert_eq!(lines, vec!["    12 failed: tiles for pose bottom: exit 1"]);
    }

    #[test]
    fn summary_counts_and_warnings() {
        let summary = RunSummary {
            scan: sample_report(),
            mains: 1,
            thumbs: 1,
            tile_sets: 2,
            warnings: vec!["catalog 12: tiles for pose detail: exit 1".to_string()],
            manifest_path: PathBuf::from("/out/manifest.yml"),
        };
        let lines = format_summary(&summary);

        assert_eq!(
            lines[0],
            "Generated 1 display image, 1 thumbnail, 2 tile sets for 2 artifacts"
        );
        assert_eq!(lines[1], "Manifest: /out/manifest.yml");
        assert_eq!(lines[3], "1 warning");
        assert_eq!(lines[4], "    catalog 12: tiles for pose detail: exit 1");
    }

    #[test]
    fn summary_without_warnings_is_two_lines() {
        let summary = RunSummary {
            scan: sample_report(),
            mains: 1,
            thumbs: 1,
            tile_sets: 3,
            warnings: vec![],
            manifest_path: PathBuf::from("/out/manifest.yml"),
        };
        assert_eq!(format_summary(&summary).len(), 2);
    }
}
