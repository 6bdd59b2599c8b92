//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions so the longer edge fits within `bound`,
/// preserving aspect ratio.
///
/// Sources already within the bound keep their original dimensions;
/// derivatives are never upscaled.
///
/// # Examples
/// ```
/// # use vitrine::imaging::fit_within;
/// // 3000x2000 bounded to 2000 → 2000x1333
/// assert_eq!(fit_within((3000, 2000), 2000), (2000, 1333));
///
/// // 1200x900 bounded to 500 → 500x375
/// assert_eq!(fit_within((1200, 900), 500), (500, 375));
///
/// // Already smaller: unchanged
/// assert_eq!(fit_within((300, 200), 2000), (300, 200));
/// ```
pub fn fit_within(original: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = original;
    if w.max(h) <= bound {
        return (w, h);
    }

    if w >= h {
        // Landscape or square: width is the longer edge
        let ratio = bound as f64 / w as f64;
        (bound, scaled(h, ratio))
    } else {
        // Portrait: height is the longer edge
        let ratio = bound as f64 / h as f64;
        (scaled(w, ratio), bound)
    }
}

/// Scale one edge by `ratio`, never rounding a nonzero edge down to zero.
fn scaled(edge: u32, ratio: f64) -> u32 {
    ((edge as f64 * ratio).round() as u32).max(1)
}
