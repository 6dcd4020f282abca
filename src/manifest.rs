//! Thumbnail manifest: the contract between the build pipeline and every
//! consumer of the gallery.
//!
//! On disk it is a flat JSON object of strings. Each source image appears
//! under two keys (the production asset URL and the development source URL),
//! and each key has a `__srcset` companion:
//!
//! ```json
//! {
//!   "/assets/dawn.jpg": "/thumbnails/dawn-800.avif",
//!   "/assets/dawn.jpg__srcset": "/thumbnails/dawn-400.avif 400w, /thumbnails/dawn-800.avif 800w",
//!   "/src/assets/landscapes/dawn.jpg": "/thumbnails/dawn-800.avif",
//!   "/src/assets/landscapes/dawn.jpg__srcset": "/thumbnails/dawn-400.avif 400w, /thumbnails/dawn-800.avif 800w"
//! }
//! ```
//!
//! Consumers must keep working when the manifest is missing or stale, so
//! [`ThumbnailManifest::load`] never fails and [`ThumbnailManifest::resolve`]
//! falls back to the original URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of the companion key that holds a srcset descriptor.
pub const SRCSET_SUFFIX: &str = "__srcset";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A generated thumbnail as it appears in a srcset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVariant {
    pub url: String,
    /// Actual pixel width of the file.
    pub width: u32,
}

/// What an `<img>` should load for an original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub src: String,
    pub srcset: Option<String>,
}

/// Original URL → thumbnail URL (plus `__srcset` companions).
///
/// Backed by a sorted map so the written file is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThumbnailManifest {
    entries: BTreeMap<String, String>,
}

impl ThumbnailManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Register one image under every key in `keys`.
    ///
    /// Each key maps to `default_url`; its `__srcset` companion gets the
    /// descriptor built from `variants`.
    pub fn insert_image(&mut self, keys: &[String], default_url: &str, variants: &[ManifestVariant]) {
        let srcset = srcset_descriptor(variants);
        for key in keys {
            self.entries.insert(key.clone(), default_url.to_string());
            self.entries
                .insert(format!("{key}{SRCSET_SUFFIX}"), srcset.clone());
        }
    }

    /// Thumbnail for `original_url`, or the original itself without a srcset.
    pub fn resolve(&self, original_url: &str) -> ImageSource {
        match self.entries.get(original_url) {
            Some(src) => ImageSource {
                src: src.clone(),
                srcset: self
                    .entries
                    .get(&format!("{original_url}{SRCSET_SUFFIX}"))
                    .filter(|s| !s.is_empty())
                    .cloned(),
            },
            None => ImageSource {
                src: original_url.to_string(),
                srcset: None,
            },
        }
    }

    /// Every thumbnail URL referenced by the manifest, deduplicated.
    pub fn thumbnail_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for (key, value) in &self.entries {
            if key.ends_with(SRCSET_SUFFIX) {
                urls.extend(
                    value
                        .split(", ")
                        .filter_map(|candidate| candidate.split_whitespace().next()),
                );
            } else {
                urls.push(value);
            }
        }
        urls.sort_unstable();
        urls.dedup();
        urls
    }

    /// Strict load: missing or malformed files are errors.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Lenient load for consumers: any failure logs a warning and yields an
    /// empty manifest, so every image falls back to its original.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(manifest) => manifest,
            Err(ManifestError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "thumbnail manifest {} not found, serving originals",
                    path.display()
                );
                Self::new()
            }
            Err(e) => {
                log::warn!(
                    "ignoring unreadable thumbnail manifest {}: {e}",
                    path.display()
                );
                Self::new()
            }
        }
    }

    /// Write pretty-printed JSON, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// `"<url> <width>w, ..."`, ascending by width, one candidate per width.
pub fn srcset_descriptor(variants: &[ManifestVariant]) -> String {
    let mut sorted: Vec<&ManifestVariant> = variants.iter().collect();
    sorted.sort_by_key(|v| v.width);
    sorted.dedup_by_key(|v| v.width);
    sorted
        .iter()
        .map(|v| format!("{} {}w", v.url, v.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Manifest URLs whose file does not exist under `output_dir`.
///
/// URLs are mapped to files by replacing `url_prefix` with `output_dir`; a
/// URL outside the prefix is reported as missing.
pub fn verify_manifest(
    manifest: &ThumbnailManifest,
    url_prefix: &str,
    output_dir: &Path,
) -> Vec<String> {
    manifest
        .thumbnail_urls()
        .into_iter()
        .filter(|url| !url_to_path(url, url_prefix, output_dir).is_some_and(|p| p.is_file()))
        .map(str::to_string)
        .collect()
}

fn url_to_path(url: &str, url_prefix: &str, output_dir: &Path) -> Option<PathBuf> {
    let prefix = url_prefix.trim_end_matches('/');
    let rest = url.strip_prefix(prefix)?.strip_prefix('/')?;
    Some(output_dir.join(rest))
}
