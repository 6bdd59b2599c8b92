//! Source discovery and catalog grouping.
//!
//! First stage of the pipeline. Walks the input directory once, parses each
//! image filename with [`naming::parse_source_name`], reads pixel dimensions
//! through the image backend, and groups the resulting [`View`]s into one
//! [`Artifact`] per observed catalog id.
//!
//! ## Input Structure
//!
//! The input is a flat directory of high-resolution photographs:
//!
//! ```text
//! sources/
//! ├── 7__main.tif
//! ├── 7__top.tif
//! ├── 12__bottom.tif
//! ├── 112__profile__raw.tif
//! └── config.toml              # Tool config (optional, ignored by the scan)
//! ```
//!
//! ## Grouping Rules
//!
//! - Artifacts exist only for ids with at least one parsed view; no empty
//!   groups.
//! - Grouping is keyed by the parsed id, so catalog 1 can never collect a
//!   `15__x.tif` by prefix accident.
//! - Artifacts come back in catalog-id ascending order; views keep
//!   directory scan order within an artifact.
//!
//! ## Failure Containment
//!
//! Only an unreadable input directory is fatal. Image files whose names
//! miss the grammar, exceed the optional id bound, or cannot be identified
//! by the backend become [`SkippedFile`] warnings in the report and the
//! scan continues. Hidden files and non-image extensions are ignored
//! outright.

use crate::config::ScanConfig;
use crate::imaging::{ImageBackend, supported_input_extensions};
use crate::naming;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a readable directory: {0}")]
    NotADirectory(PathBuf),
}

/// One parsed source image.
///
/// Immutable after the scan; generators read it, never write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Pose token from the filename, lowercased (e.g. "main", "top").
    pub pose: String,
    /// Canonicalized absolute path to the original file.
    pub source_path: PathBuf,
    /// Pixel width read from the source file.
    pub width: u32,
    /// Pixel height read from the source file.
    pub height: u32,
}

/// All source views for one catalog id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub catalog_id: u32,
    /// Views in directory scan order. May contain repeated poses; consumers
    /// that need a single view take the first match.
    pub views: Vec<View>,
}

impl Artifact {
    /// First view carrying the given pose, if any.
    pub fn view_for_pose(&self, pose: &str) -> Option<&View> {
        self.views.iter().find(|v| v.pose == pose)
    }
}

/// Why a file was excluded from the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Filename does not match the `{id}__{pose}` grammar.
    UnparsableName,
    /// Catalog id exceeds the configured `max_catalog_id` bound.
    IdAboveBound(u32),
    /// The file could not be resolved or identified.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnparsableName => {
                write!(f, "filename does not match {{id}}__{{pose}}")
            }
            SkipReason::IdAboveBound(bound) => {
                write!(f, "catalog id exceeds the configured bound {bound}")
            }
            SkipReason::Unreadable(detail) => write!(f, "unreadable: {detail}"),
        }
    }
}

/// A source file excluded from the scan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Everything the scan discovered: id-sorted artifacts plus skip warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanReport {
    /// Total number of views across all artifacts.
    pub fn view_count(&self) -> usize {
        self.artifacts.iter().map(|a| a.views.len()).sum()
    }
}

/// Walk `root` and group parsed source images into artifacts.
pub fn scan(
    backend: &impl ImageBackend,
    root: &Path,
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut grouped: BTreeMap<u32, Vec<View>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || !is_image(&name) {
            continue;
        }

        // Matching is on the basename only, never a parent path segment.
        let Some(parsed) = naming::parse_source_name(&name) else {
            skipped.push(SkippedFile {
                path: entry.path().to_path_buf(),
                reason: SkipReason::UnparsableName,
            });
            continue;
        };

        if let Some(bound) = config.max_catalog_id
            && parsed.catalog_id > bound
        {
            skipped.push(SkippedFile {
                path: entry.path().to_path_buf(),
                reason: SkipReason::IdAboveBound(bound),
            });
            continue;
        }

        let source_path = match std::fs::canonicalize(entry.path()) {
            Ok(p) => p,
            Err(e) => {
                skipped.push(SkippedFile {
                    path: entry.path().to_path_buf(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                continue;
            }
        };

        let dims = match backend.identify(&source_path) {
            Ok(d) => d,
            Err(e) => {
                skipped.push(SkippedFile {
                    path: entry.path().to_path_buf(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                continue;
            }
        };

        grouped.entry(parsed.catalog_id).or_default().push(View {
            pose: parsed.pose,
            source_path,
            width: dims.width,
            height: dims.height,
        });
    }

    let artifacts = grouped
        .into_iter()
        .map(|(catalog_id, views)| Artifact { catalog_id, views })
        .collect();

    Ok(ScanReport { artifacts, skipped })
}

fn is_image(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{Dimensions, RustBackend};
    use crate::test_helpers::create_test_jpeg;
    use tempfile::TempDir;

    fn scan_defaults(root: &Path) -> ScanReport {
        scan(&RustBackend::new(), root, &ScanConfig::default()).unwrap()
    }

    #[test]
    fn groups_views_by_catalog_id() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 300, 200);
        create_test_jpeg(&tmp.path().join("7__top.jpg"), 120, 90);
        create_test_jpeg(&tmp.path().join("12__bottom.jpg"), 50, 50);

        let report = scan_defaults(tmp.path());

        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.artifacts[0].catalog_id, 7);
        assert_eq!(report.artifacts[0].views.len(), 2);
        assert_eq!(report.artifacts[1].catalog_id, 12);
        assert_eq!(report.artifacts[1].views.len(), 1);
        assert_eq!(report.view_count(), 3);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn artifacts_sorted_by_id_not_discovery_order() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("200__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("3__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("41__main.jpg"), 40, 30);

        let report = scan_defaults(tmp.path());
        let ids: Vec<u32> = report.artifacts.iter().map(|a| a.catalog_id).collect();
        assert_eq!(ids, vec![3, 41, 200]);
    }

    #[test]
    fn no_artifact_for_ids_without_files() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("5__main.jpg"), 40, 30);

        let report = scan_defaults(tmp.path());
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].catalog_id, 5);
    }

    #[test]
    fn id_prefixes_never_cross_match() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("1__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("10__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("11__main.jpg"), 40, 30);

        let report = scan_defaults(tmp.path());

        let one = report.artifacts.iter().find(|a| a.catalog_id == 1).unwrap();
        assert_eq!(one.views.len(), 1);
        assert!(
            one.views[0]
                .source_path
                .to_string_lossy()
                .ends_with("1__main.jpg")
        );
    }

    #[test]
    fn dimensions_read_from_source() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 321, 123);

        let report = scan_defaults(tmp.path());
        let view = &report.artifacts[0].views[0];
        assert_eq!((view.width, view.height), (321, 123));
    }

    #[test]
    fn source_paths_are_absolute() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);

        let report = scan_defaults(tmp.path());
        assert!(report.artifacts[0].views[0].source_path.is_absolute());
    }

    #[test]
    fn unparsable_image_name_is_skipped_with_warning() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("notes.jpg"), 40, 30);

        let report = scan_defaults(tmp.path());
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::UnparsableName);
    }

    #[test]
    fn non_image_files_ignored_silently() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);
        std::fs::write(tmp.path().join("config.toml"), "[images]\n").unwrap();
        std::fs::write(tmp.path().join("README.md"), "notes").unwrap();
        std::fs::write(tmp.path().join(".hidden.jpg"), "x").unwrap();

        let report = scan_defaults(tmp.path());
        assert_eq!(report.artifacts.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn undecodable_image_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);
        std::fs::write(tmp.path().join("8__main.jpg"), "not a jpeg").unwrap();

        let report = scan_defaults(tmp.path());
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].catalog_id, 7);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Unreadable(_)
        ));
    }

    #[test]
    fn ids_above_bound_are_skipped() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("900__main.jpg"), 40, 30);

        let config = ScanConfig {
            max_catalog_id: Some(631),
        };
        let report = scan(&RustBackend::new(), tmp.path(), &config).unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::IdAboveBound(631));
    }

    #[test]
    fn missing_input_directory_is_error() {
        let result = scan(
            &MockBackend::new(),
            Path::new("/nonexistent/sources"),
            &ScanConfig::default(),
        );
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn file_as_input_is_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("7__main.jpg");
        create_test_jpeg(&file, 40, 30);

        let result = scan(&MockBackend::new(), &file, &ScanConfig::default());
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn duplicate_pose_views_kept_independently() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);
        create_test_jpeg(&tmp.path().join("7__main__alt.jpg"), 80, 60);

        let report = scan_defaults(tmp.path());
        let artifact = &report.artifacts[0];
        assert_eq!(artifact.views.len(), 2);

        // First match in scan order wins for single-view consumers
        let first = artifact.view_for_pose("main").unwrap();
        assert_eq!((first.width, first.height), (40, 30));
    }

    #[test]
    fn view_for_pose_misses_cleanly() {
        let artifact = Artifact {
            catalog_id: 12,
            views: vec![View {
                pose: "bottom".to_string(),
                source_path: PathBuf::from("/x/12__bottom.tif"),
                width: 50,
                height: 50,
            }],
        };
        assert!(artifact.view_for_pose("main").is_none());
        assert!(artifact.view_for_pose("bottom").is_some());
    }

    #[test]
    fn mock_backend_failures_surface_as_skips() {
        let tmp = TempDir::new().unwrap();
        create_test_jpeg(&tmp.path().join("7__main.jpg"), 40, 30);

        // Empty mock: every identify fails
        let backend = MockBackend::with_dimensions(Vec::<Dimensions>::new());
        let report = scan(&backend, tmp.path(), &ScanConfig::default()).unwrap();

        assert!(report.artifacts.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }
}
