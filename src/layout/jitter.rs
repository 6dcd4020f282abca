//! Deterministic per-image jitter.
//!
//! Rows of identical height and perfectly regular ratios read as a
//! spreadsheet. A little variation keyed on the file name breaks that up
//! while staying reproducible: the same file always gets the same nudge, on
//! every render and every machine.
//!
//! The hash is 32-bit FNV-1a over the identifier's UTF-8 bytes, normalized
//! to `[0, 1]` by dividing by `u32::MAX`.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Aspect ratios are kept within this band after perturbation.
pub const MIN_ASPECT_RATIO: f64 = 0.3;
pub const MAX_ASPECT_RATIO: f64 = 3.5;

/// 32-bit FNV-1a.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u32).wrapping_mul(FNV_PRIME)
    })
}

/// The part of a path or URL that identifies an image for hashing: the
/// last segment, without query string or fragment.
///
/// `/thumbs/a/dawn.jpg?v=3#x` → `dawn.jpg`
pub fn item_identifier(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Stable value in `[0, 1]` for `path`.
pub fn unit_hash(path: &str) -> f64 {
    fnv1a32(item_identifier(path).as_bytes()) as f64 / u32::MAX as f64
}

/// Stable value in `[-band, band]` for `path`.
pub fn signed_jitter(path: &str, band: f64) -> f64 {
    (unit_hash(path) * 2.0 - 1.0) * band
}

/// Nudge a resolved aspect ratio by up to `±band` and clamp it to
/// [`MIN_ASPECT_RATIO`]..=[`MAX_ASPECT_RATIO`].
pub fn perturb_aspect_ratio(path: &str, ratio: f64, band: f64) -> f64 {
    (ratio * (1.0 + signed_jitter(path, band))).clamp(MIN_ASPECT_RATIO, MAX_ASPECT_RATIO)
}
