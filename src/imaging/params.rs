//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides which
//! variants an image gets, and the [`backend`](super::backend), which does the
//! pixel work. The split lets tests swap in a recording mock.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Encoding quality for targets up to `max_width` pixels wide.
///
/// Small thumbnails are viewed at a size where artefacts stand out, so they
/// get a slightly higher quality than the larger variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityTier {
    pub max_width: u32,
    pub quality: u32,
}

impl QualityTier {
    /// `≤400 → 40`, `≤800 → 38`, `≤1200 → 35`.
    pub fn defaults() -> Vec<QualityTier> {
        vec![
            QualityTier {
                max_width: 400,
                quality: 40,
            },
            QualityTier {
                max_width: 800,
                quality: 38,
            },
            QualityTier {
                max_width: 1200,
                quality: 35,
            },
        ]
    }
}

/// Pick the quality for a target width: the first tier (by ascending
/// `max_width`) that covers it, or the widest tier beyond the last bound.
pub fn quality_for_width(tiers: &[QualityTier], target_width: u32) -> Quality {
    let mut sorted: Vec<&QualityTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.max_width);
    sorted
        .iter()
        .find(|t| target_width <= t.max_width)
        .or(sorted.last())
        .map(|t| Quality::new(t.quality))
        .unwrap_or(Quality::new(35))
}

/// One output file of a [`VariantJob`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    /// Requested width; the produced width is `min(native, target_width)`.
    pub target_width: u32,
    pub output: PathBuf,
    pub quality: Quality,
}

/// Everything produced from a single decode of `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantJob {
    pub source: PathBuf,
    pub variants: Vec<VariantSpec>,
}
