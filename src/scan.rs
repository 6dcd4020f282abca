//! Source image discovery.
//!
//! Walks every configured source root and turns each image file into an
//! [`ImageItem`]. The layout expected by convention:
//!
//! ```text
//! src/assets/                      # Source root
//! ├── hero.jpg                     # Category = "assets" (the root's name)
//! ├── landscapes/                  # Category = "landscapes"
//! │   ├── 001-dawn.jpg             # alt "dawn"
//! │   ├── 002-Misty-Morning.jpg    # alt "Misty Morning"
//! │   └── 2021/010-ridge.png       # nested dirs stay in "landscapes"
//! └── street/
//!     └── corner.webp
//! ```
//!
//! ## Filtering
//!
//! Only the extension is checked (`jpg`, `jpeg`, `png`, `webp`, any case).
//! Contents are not sniffed: a broken file named `x.jpg` is discovered here
//! and fails later, at decode time. Hidden files and directories are skipped.
//!
//! ## Ordering
//!
//! Filesystem iteration order is unspecified, and the layout engine needs a
//! stable input, so items are sorted by [`natural_cmp`] on their source path.

use crate::naming::{alt_text, natural_cmp};
use crate::types::ImageItem;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
}

/// Extensions accepted as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Whether `path` has an image extension. Content-blind.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Discover every image below `sources`, each resolved against `project_root`.
///
/// Returns items sorted naturally by source path, without duplicates (two
/// overlapping roots yield each file once).
pub fn scan(project_root: &Path, sources: &[String]) -> Result<Vec<ImageItem>, ScanError> {
    let mut items = Vec::new();

    for source in sources {
        let root = project_root.join(source);
        if !root.is_dir() {
            return Err(ScanError::MissingSource(root));
        }
        let root_category = category_name(&root);
        let prefix = normalize_prefix(source);

        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_image(entry.path()) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&root)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            let parts = path_parts(rel);
            let category = if parts.len() > 1 {
                parts[0].clone()
            } else {
                root_category.clone()
            };
            let stem = rel
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            let source_path = if prefix.is_empty() {
                parts.join("/")
            } else {
                format!("{}/{}", prefix, parts.join("/"))
            };

            items.push(ImageItem {
                source_path,
                alt_text: alt_text(&stem),
                category,
            });
        }
    }

    items.sort_by(|a, b| natural_cmp(&a.source_path, &b.source_path));
    items.dedup_by(|a, b| a.source_path == b.source_path);
    log::debug!("discovered {} images in {} source(s)", items.len(), sources.len());
    Ok(items)
}

/// Distinct categories in first-seen order.
pub fn categories(items: &[ImageItem]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item.category.as_str()) {
            seen.push(&item.category);
        }
    }
    seen
}

fn category_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `./src/assets/` → `src/assets`
fn normalize_prefix(source: &str) -> String {
    path_parts(Path::new(source)).join("/")
}

fn path_parts(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}
