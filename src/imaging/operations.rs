//! High-level image operations.
//!
//! These functions decide which files an image gets (names, widths, quality)
//! and hand the plan to the backend.

use super::backend::{BackendError, ImageBackend, RenderedImage};
use super::params::{QualityTier, VariantJob, VariantSpec, quality_for_width};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Extension of every generated thumbnail.
pub const THUMBNAIL_EXTENSION: &str = "avif";

/// Configuration for thumbnail variant generation.
#[derive(Debug, Clone)]
pub struct VariantConfig {
    pub widths: Vec<u32>,
    pub quality: Vec<QualityTier>,
}

/// File name of one variant: `<stem>-<targetWidth>.avif`.
pub fn variant_filename(stem: &str, target_width: u32) -> String {
    format!("{stem}-{target_width}.{THUMBNAIL_EXTENSION}")
}

/// Plan the variants of one image without executing anything.
///
/// Widths are deduplicated and sorted ascending so output order is stable.
pub fn plan_variants(
    source: &Path,
    output_dir: &Path,
    stem: &str,
    config: &VariantConfig,
) -> VariantJob {
    let mut widths = config.widths.clone();
    widths.sort_unstable();
    widths.dedup();

    VariantJob {
        source: source.to_path_buf(),
        variants: widths
            .into_iter()
            .map(|w| VariantSpec {
                target_width: w,
                output: output_dir.join(variant_filename(stem, w)),
                quality: quality_for_width(&config.quality, w),
            })
            .collect(),
    }
}

/// Render every planned variant of `source` into `output_dir`.
pub fn create_variants(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    stem: &str,
    config: &VariantConfig,
) -> Result<RenderedImage> {
    let job = plan_variants(source, output_dir, stem, config);
    backend.render_variants(&job)
}
