//! Shared types passed between the scan, thumbs, session and generate modules.

use serde::{Deserialize, Serialize};

/// A discovered source image.
///
/// Identity is `source_path`: two items with the same path are the same
/// image. Items are created once per scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageItem {
    /// Path relative to the project root, `/`-separated (e.g. `src/assets/travel/001-kyoto.jpg`).
    pub source_path: String,
    /// Display text for `alt` attributes, derived from the filename.
    pub alt_text: String,
    /// Category name (first directory below the source root).
    pub category: String,
}

impl ImageItem {
    /// Final path component, e.g. `001-kyoto.jpg`.
    pub fn filename(&self) -> &str {
        self.source_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_path)
    }

    /// Filename without extension, e.g. `001-kyoto`.
    pub fn basename(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(0) | None => filename,
            Some(dot) => &filename[..dot],
        }
    }

    /// URL of the original asset as served from the project root.
    pub fn original_url(&self) -> String {
        format!("/{}", self.source_path)
    }

    /// URL of the original once deployed under `public_prefix`, e.g. `/assets/001-kyoto.jpg`.
    pub fn public_url(&self, public_prefix: &str) -> String {
        format!("{}/{}", public_prefix.trim_end_matches('/'), self.filename())
    }
}
