//! Deep-zoom tile pyramid generation.
//!
//! Tile pyramids are a capability the pipeline consumes, not logic it owns:
//! the [`TilePyramidBuilder`] trait takes a resolved source path plus output
//! parameters and either produces a pyramid or reports failure. The
//! production implementation, [`VipsTiler`], shells out to `vips dzsave`;
//! nothing else in the crate knows how the tiles are made.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to launch tiling tool '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Tiling tool exited with status {status}: {stderr}")]
    ToolFailed { status: i32, stderr: String },
}

/// Full specification for one tile pyramid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileParams {
    /// Resolved path of the source photograph.
    pub source: PathBuf,
    /// Output base path. The tool materializes its pyramid layout relative
    /// to this base (for deep-zoom: `{base}.dzi` plus `{base}_files/`).
    pub output_base: PathBuf,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Tile file format (extension), e.g. "jpg".
    pub format: String,
    /// Replace any pyramid already present at the output base.
    pub overwrite: bool,
}

/// Trait for tile pyramid builders.
///
/// `Sync` so one builder instance can be shared across rayon workers.
pub trait TilePyramidBuilder: Sync {
    fn build(&self, params: &TileParams) -> Result<(), TileError>;
}

/// Deep-zoom tiler shelling out to `vips dzsave`.
pub struct VipsTiler {
    program: String,
}

impl VipsTiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for VipsTiler {
    fn default() -> Self {
        Self::new("vips")
    }
}

/// The on-disk entries `dzsave` creates for an output base.
fn pyramid_outputs(base: &Path) -> (PathBuf, PathBuf) {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = base.parent().unwrap_or(Path::new(""));
    (
        dir.join(format!("{name}.dzi")),
        dir.join(format!("{name}_files")),
    )
}

/// Remove a prior pyramid at `base`, tolerating absence.
fn clear_pyramid(base: &Path) -> std::io::Result<()> {
    let (dzi, files) = pyramid_outputs(base);
    match std::fs::remove_file(&dzi) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    match std::fs::remove_dir_all(&files) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

impl TilePyramidBuilder for VipsTiler {
    fn build(&self, params: &TileParams) -> Result<(), TileError> {
        if let Some(parent) = params.output_base.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if params.overwrite {
            clear_pyramid(&params.output_base)?;
        }

        let output = Command::new(&self.program)
            .arg("dzsave")
            .arg(&params.source)
            .arg(&params.output_base)
            .args(["--tile-size", &params.tile_size.to_string()])
            .args(["--suffix", &format!(".{}", params.format)])
            .output()
            .map_err(|e| TileError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(TileError::ToolFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Mock tiler that records parameters without invoking anything.
    /// Uses Mutex so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockTiler {
        pub jobs: Mutex<Vec<TileParams>>,
        /// Jobs whose source filename contains this string fail.
        pub fail_on: Option<String>,
    }

    impl MockTiler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(needle: impl Into<String>) -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
                fail_on: Some(needle.into()),
            }
        }

        pub fn get_jobs(&self) -> Vec<TileParams> {
            self.jobs.lock().unwrap().clone()
        }
    }

    impl TilePyramidBuilder for MockTiler {
        fn build(&self, params: &TileParams) -> Result<(), TileError> {
            self.jobs.lock().unwrap().push(params.clone());
            if let Some(needle) = &self.fail_on
                && params.source.to_string_lossy().contains(needle.as_str())
            {
                return Err(TileError::ToolFailed {
                    status: 1,
                    stderr: "mock failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_jobs() {
        let tiler = MockTiler::new();
        let params = TileParams {
            source: "/in/7__main.tif".into(),
            output_base: "/out/tiles/7/main".into(),
            tile_size: 256,
            format: "jpg".to_string(),
            overwrite: true,
        };
        tiler.build(&params).unwrap();
        assert_eq!(tiler.get_jobs(), vec![params]);
    }

    #[test]
    fn pyramid_outputs_derive_from_base() {
        let (dzi, files) = pyramid_outputs(Path::new("/out/tiles/7/main"));
        assert_eq!(dzi, Path::new("/out/tiles/7/main.dzi"));
        assert_eq!(files, Path::new("/out/tiles/7/main_files"));
    }

    #[test]
    fn clear_pyramid_removes_prior_outputs() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("main");
        std::fs::write(tmp.path().join("main.dzi"), "<dzi/>").unwrap();
        std::fs::create_dir_all(tmp.path().join("main_files/0")).unwrap();

        clear_pyramid(&base).unwrap();

        assert!(!tmp.path().join("main.dzi").exists());
        assert!(!tmp.path().join("main_files").exists());
    }

    #[test]
    fn clear_pyramid_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        clear_pyramid(&tmp.path().join("never-written")).unwrap();
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let tiler = VipsTiler::new("vitrine-no-such-tool");
        let result = tiler.build(&TileParams {
            source: tmp.path().join("7__main.tif"),
            output_base: tmp.path().join("tiles/7/main"),
            tile_size: 256,
            format: "jpg".to_string(),
            overwrite: true,
        });
        assert!(matches!(result, Err(TileError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_tool_failure() {
        let tmp = TempDir::new().unwrap();
        let tiler = VipsTiler::new("false");
        let result = tiler.build(&TileParams {
            source: tmp.path().join("7__main.tif"),
            output_base: tmp.path().join("tiles/7/main"),
            tile_size: 256,
            format: "jpg".to_string(),
            overwrite: true,
        });
        assert!(matches!(result, Err(TileError::ToolFailed { .. })));
    }
}
