//! Thumbnail build pipeline.
//!
//! Turns every discovered source image into a set of width-bounded AVIF
//! thumbnails and records them in the thumbnail manifest.
//!
//! ## Output
//!
//! ```text
//! public/
//! ├── thumbnail-manifest.json       # original URL → thumbnail URL (+ srcset)
//! └── thumbnails/                   # one flat directory
//!     ├── 001-dawn-400.avif
//!     ├── 001-dawn-800.avif
//!     └── 001-dawn-1200.avif
//! ```
//!
//! Widths are upper bounds: a source narrower than a target is encoded at its
//! native width under the target's name, never upscaled.
//!
//! ## Failure model
//!
//! Fail-fast. The first image that cannot be decoded or encoded aborts the
//! run and no manifest is written. Thumbnails already on disk are left in
//! place and overwritten by the next successful run.
//!
//! ## Parallel processing
//!
//! Images are independent, so they are processed with rayon's `par_iter` on
//! the global pool (sized from `[processing] max_processes`). Progress is
//! reported through an optional [`ThumbEvent`] channel so the CLI can print
//! from a single thread while workers run.

use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, RustBackend, VariantConfig, create_variants,
};
use crate::manifest::{ManifestError, ManifestVariant, ThumbnailManifest, verify_manifest};
use crate::scan::{ScanError, scan};
use crate::types::ImageItem;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Failed to process {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: BackendError,
    },
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Manifest references {} missing thumbnail(s): {}", .0.len(), .0.join(", "))]
    MissingThumbnails(Vec<String>),
}

/// Progress reported while the pipeline runs.
#[derive(Debug, Clone)]
pub enum ThumbEvent {
    Started {
        images: usize,
        widths: Vec<u32>,
    },
    ImageProcessed {
        source_path: String,
        native: Dimensions,
        variants: Vec<VariantInfo>,
    },
    ManifestWritten {
        path: PathBuf,
        entries: usize,
    },
}

/// One written thumbnail, as reported in [`ThumbEvent::ImageProcessed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub target_width: u32,
    pub width: u32,
    pub file_name: String,
}

/// A generated thumbnail file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedThumb {
    pub target_width: u32,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub path: PathBuf,
}

/// Everything produced for one source image.
#[derive(Debug, Clone)]
pub struct ThumbnailRecord {
    pub item: ImageItem,
    pub native: Dimensions,
    pub thumbs: Vec<GeneratedThumb>,
}

/// Source images that would write to the same thumbnail names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub stem: String,
    pub sources: Vec<String>,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct ThumbsResult {
    pub records: Vec<ThumbnailRecord>,
    pub manifest: ThumbnailManifest,
    pub manifest_path: PathBuf,
    pub collisions: Vec<Collision>,
}

impl ThumbsResult {
    pub fn thumbnail_count(&self) -> usize {
        self.records.iter().map(|r| r.thumbs.len()).sum()
    }
}

/// Run the pipeline with the pure-Rust image backend.
pub fn build_thumbnails(
    project_root: &Path,
    config: &SiteConfig,
    events: Option<Sender<ThumbEvent>>,
) -> Result<ThumbsResult, ThumbsError> {
    build_thumbnails_with_backend(&RustBackend::new(), project_root, config, events)
}

/// Run the pipeline with a specific backend (allows testing with mock).
pub fn build_thumbnails_with_backend(
    backend: &impl ImageBackend,
    project_root: &Path,
    config: &SiteConfig,
    events: Option<Sender<ThumbEvent>>,
) -> Result<ThumbsResult, ThumbsError> {
    let thumbs_config = &config.thumbnails;
    let items = scan(project_root, &config.sources)?;

    let output_dir = project_root.join(&thumbs_config.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let collisions = find_collisions(&items, thumbs_config.namespace_by_category);
    for c in &collisions {
        log::warn!(
            "thumbnail name collision on \"{}\": {} (last one written wins; set thumbnails.namespace_by_category = true)",
            c.stem,
            c.sources.join(", ")
        );
    }

    let variant_config = VariantConfig {
        widths: thumbs_config.widths.clone(),
        quality: thumbs_config.quality.clone(),
    };

    if let Some(tx) = &events {
        tx.send(ThumbEvent::Started {
            images: items.len(),
            widths: thumbs_config.widths.clone(),
        })
        .ok();
    }

    let records = items
        .par_iter()
        .map(|item| -> Result<ThumbnailRecord, ThumbsError> {
            let record = process_image(
                backend,
                project_root,
                &output_dir,
                item,
                &variant_config,
                config,
            )?;
            if let Some(tx) = &events {
                tx.send(ThumbEvent::ImageProcessed {
                    source_path: item.source_path.clone(),
                    native: record.native,
                    variants: record
                        .thumbs
                        .iter()
                        .map(|t| VariantInfo {
                            target_width: t.target_width,
                            width: t.width,
                            file_name: file_name(&t.path),
                        })
                        .collect(),
                })
                .ok();
            }
            Ok(record)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut manifest = ThumbnailManifest::new();
    for record in &records {
        let Some(default) = default_thumb(&record.thumbs, thumbs_config.default_width) else {
            continue;
        };
        let variants: Vec<ManifestVariant> = record
            .thumbs
            .iter()
            .map(|t| ManifestVariant {
                url: t.url.clone(),
                width: t.width,
            })
            .collect();
        manifest.insert_image(
            &manifest_keys(&record.item, &thumbs_config.public_prefix),
            &default.url,
            &variants,
        );
    }

    let missing = verify_manifest(&manifest, &thumbs_config.url_prefix, &output_dir);
    if !missing.is_empty() {
        return Err(ThumbsError::MissingThumbnails(missing));
    }

    let manifest_path = project_root.join(&thumbs_config.manifest);
    manifest.save(&manifest_path)?;
    log::debug!(
        "wrote {} manifest entries to {}",
        manifest.len(),
        manifest_path.display()
    );

    if let Some(tx) = &events {
        tx.send(ThumbEvent::ManifestWritten {
            path: manifest_path.clone(),
            entries: manifest.len(),
        })
        .ok();
    }

    Ok(ThumbsResult {
        records,
        manifest,
        manifest_path,
        collisions,
    })
}

fn process_image(
    backend: &impl ImageBackend,
    project_root: &Path,
    output_dir: &Path,
    item: &ImageItem,
    variant_config: &VariantConfig,
    config: &SiteConfig,
) -> Result<ThumbnailRecord, ThumbsError> {
    let source = project_root.join(&item.source_path);
    let stem = thumbnail_stem(item, config.thumbnails.namespace_by_category);
    let rendered = create_variants(backend, &source, output_dir, &stem, variant_config).map_err(
        |source| ThumbsError::Image {
            path: item.source_path.clone(),
            source,
        },
    )?;

    let prefix = config.thumbnails.url_prefix.trim_end_matches('/');
    let thumbs = rendered
        .variants
        .into_iter()
        .map(|v| GeneratedThumb {
            target_width: v.target_width,
            width: v.width,
            height: v.height,
            url: format!("{prefix}/{}", file_name(&v.output)),
            path: v.output,
        })
        .collect();

    Ok(ThumbnailRecord {
        item: item.clone(),
        native: rendered.native,
        thumbs,
    })
}

/// Name stem of an item's thumbnails.
///
/// `landscapes/001-dawn.jpg` → `001-dawn`, or `landscapes-001-dawn` when
/// namespacing by category.
pub fn thumbnail_stem(item: &ImageItem, namespace_by_category: bool) -> String {
    if namespace_by_category {
        format!("{}-{}", item.category, item.basename())
    } else {
        item.basename().to_string()
    }
}

/// Manifest keys for an item: the production URL and the development URL.
pub fn manifest_keys(item: &ImageItem, public_prefix: &str) -> Vec<String> {
    vec![
        item.public_url(public_prefix),
        item.original_url(),
    ]
}

/// The thumbnail generated for `default_width`, else the widest target.
pub fn default_thumb(thumbs: &[GeneratedThumb], default_width: u32) -> Option<&GeneratedThumb> {
    thumbs
        .iter()
        .find(|t| t.target_width == default_width)
        .or_else(|| thumbs.iter().max_by_key(|t| t.target_width))
}

/// Groups of items whose thumbnails would share a name.
pub fn find_collisions(items: &[ImageItem], namespace_by_category: bool) -> Vec<Collision> {
    let mut by_stem: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        by_stem
            .entry(thumbnail_stem(item, namespace_by_category))
            .or_default()
            .push(item.source_path.clone());
    }
    by_stem
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(stem, sources)| Collision { stem, sources })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
