//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Output dimensions for a width-targeted variant.
///
/// Width is `min(native_width, target)`: variants are never upscaled. Height
/// keeps the native aspect ratio, rounded, and never drops below 1px.
///
/// ```
/// # use folio::imaging::variant_dimensions;
/// // 2000x1500 → 1200 wide keeps 4:3
/// assert_eq!(variant_dimensions((2000, 1500), 1200), (1200, 900));
///
/// // 300px source is never upscaled
/// assert_eq!(variant_dimensions((300, 200), 800), (300, 200));
/// ```
pub fn variant_dimensions(native: (u32, u32), target: u32) -> (u32, u32) {
    let (native_w, native_h) = native;
    if target >= native_w {
        return (native_w, native_h);
    }
    let h = (native_h as f64 * target as f64 / native_w as f64).round() as u32;
    (target, h.max(1))
}
