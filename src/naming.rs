//! Centralized filename parsing for the catalog naming convention.
//!
//! Every source photograph follows the same pattern: a numeric catalog id,
//! a double-underscore delimiter, and a pose token, with an optional
//! modifier segment the pipeline ignores:
//!
//! ```text
//! 7__main.tif            → catalog 7, pose "main"
//! 7__Top.jpeg            → catalog 7, pose "top"   (case-insensitive)
//! 112__profile__raw.tif  → catalog 112, pose "profile"
//! ```
//!
//! Parsing returns an explicit [`ParsedName`] or `None`; callers never
//! inspect shared match state to learn what the last parse produced.

/// Pose tokens the catalog convention documents.
///
/// The set is informational only: views with tokens outside this list are
/// still scanned, tiled, and listed in the manifest.
pub const RECOGNIZED_POSES: &[&str] = &["main", "top", "bottom", "profile"];

/// Whether a pose token is one of the documented catalog poses.
pub fn is_recognized_pose(pose: &str) -> bool {
    RECOGNIZED_POSES.contains(&pose)
}

/// Result of parsing a source filename like `7__main.tif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Numeric catalog id before the first `__`.
    pub catalog_id: u32,
    /// Pose token after the first `__`, lowercased.
    pub pose: String,
}

/// Parse a source filename following the `{catalogId}__{pose}` convention.
///
/// The pose is the run of alphabetic characters immediately after the first
/// `__`; anything from the next non-alphabetic character on (a second `__`
/// segment, the extension) is ignored. Returns `None` when the leading
/// token is not a number or no alphabetic pose follows the delimiter:
///
/// - `"7__main.tif"` → catalog 7, pose "main"
/// - `"007__TOP__v2.jpg"` → catalog 7, pose "top"
/// - `"7.tif"` → `None` (no delimiter)
/// - `"7__2.tif"` → `None` (no alphabetic pose)
/// - `"front__main.tif"` → `None` (no numeric id)
pub fn parse_source_name(name: &str) -> Option<ParsedName> {
    let (prefix, rest) = name.split_once("__")?;
    let catalog_id = prefix.parse::<u32>().ok()?;

    let pose: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if pose.is_empty() {
        return None;
    }

    Some(ParsedName { catalog_id, pose })
}
