//! Static gallery page generation.
//!
//! Renders a single `index.html` from the source images, the thumbnail
//! manifest and the justified layout:
//!
//! ```text
//! dist/
//! └── index.html
//!     ├── hero banner               # first image, full width
//!     ├── category index            # #landscapes, #street, ...
//!     └── one justified grid per category
//! ```
//!
//! ## Layout
//!
//! Rows are computed once at `layout.reference_width`. Widths are written as
//! percentages of that width and every tile carries its box's
//! `aspect-ratio`, so the grid scales with the viewport without a relayout.
//!
//! ## Images
//!
//! The page is a deployable artifact: originals are addressed by their
//! production URL (`thumbnails.public_prefix`, `/assets/<file>` by default),
//! the same key `thumbs` registers in the manifest. Each `<img>` takes
//! `src`/`srcset` from the manifest and falls back to the original when the
//! manifest does not know the image (or is missing). Every tile links to its
//! original with a `data-lightbox` attribute for an external viewer script.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config::{LayoutConfig, PageConfig, SiteConfig};
use crate::layout::{JustifiedItem, LayoutParams, Row, justify};
use crate::manifest::ThumbnailManifest;
use crate::scan::{ScanError, scan};
use crate::session::{AspectSource, BackendAspectSource, SessionError, resolve_items};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Aspect ratio resolution failed: {0}")]
    Session(#[from] SessionError),
}

const CSS: &str = include_str!("../static/gallery.css");

/// Upper bound on reading image headers for the page layout.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(120);

/// One category's images and its rows at the reference width.
#[derive(Debug, Clone)]
pub struct GallerySection {
    pub category: String,
    pub items: Vec<JustifiedItem>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub category: String,
    pub images: usize,
    pub rows: usize,
}

/// What [`generate`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub output: PathBuf,
    pub sections: Vec<SectionSummary>,
    /// Images served from a thumbnail.
    pub thumbnails: usize,
    /// Images served from the original file.
    pub originals: usize,
}

/// Render `index.html`, reading aspect ratios from the image files.
pub fn generate(project_root: &Path, config: &SiteConfig) -> Result<GenerateSummary, GenerateError> {
    let source = Arc::new(BackendAspectSource::new(project_root));
    generate_with_source(project_root, config, source)
}

/// Render `index.html` with a specific aspect-ratio source.
pub fn generate_with_source(
    project_root: &Path,
    config: &SiteConfig,
    source: Arc<dyn AspectSource>,
) -> Result<GenerateSummary, GenerateError> {
    let items = scan(project_root, &config.sources)?;
    let placed = resolve_items(&config.layout, source, items, RESOLVE_TIMEOUT)?;
    let manifest = ThumbnailManifest::load(&project_root.join(&config.thumbnails.manifest));
    let sections = build_sections(&placed, &config.layout);

    let output_dir = project_root.join(&config.site.output_dir);
    fs::create_dir_all(&output_dir)?;
    let output = output_dir.join("index.html");
    let public_prefix = config.thumbnails.public_prefix.as_str();
    let page = render_page(&config.site, &config.layout, &sections, &manifest, public_prefix);
    fs::write(&output, page.into_string())?;

    let thumbnails = placed
        .iter()
        .filter(|j| manifest.get(&j.item.public_url(public_prefix)).is_some())
        .count();
    Ok(GenerateSummary {
        output,
        sections: sections
            .iter()
            .map(|s| SectionSummary {
                category: s.category.clone(),
                images: s.items.len(),
                rows: s.rows.len(),
            })
            .collect(),
        thumbnails,
        originals: placed.len() - thumbnails,
    })
}

/// Group items by category (first-seen order) and justify each group at the
/// reference width.
pub fn build_sections(placed: &[JustifiedItem], layout: &LayoutConfig) -> Vec<GallerySection> {
    let mut sections: Vec<GallerySection> = Vec::new();
    for j in placed {
        match sections.iter_mut().find(|s| s.category == j.item.category) {
            Some(section) => section.items.push(j.clone()),
            None => sections.push(GallerySection {
                category: j.item.category.clone(),
                items: vec![j.clone()],
                rows: Vec::new(),
            }),
        }
    }
    let params = LayoutParams::from_config(layout, layout.reference_width);
    for section in &mut sections {
        section.rows = justify(&section.items, &params);
    }
    sections
}

/// `Street Photos` → `street-photos`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn percent(value: f64, of: f64) -> String {
    format!("{:.4}%", value / of * 100.0)
}

// ============================================================================
// HTML Components
// ============================================================================

pub fn render_page(
    page: &PageConfig,
    layout: &LayoutConfig,
    sections: &[GallerySection],
    manifest: &ThumbnailManifest,
    public_prefix: &str,
) -> Markup {
    let hero = sections.first().and_then(|s| s.items.first());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                style { (CSS) }
            }
            body {
                header.hero {
                    @if let Some(hero) = hero {
                        @let source = manifest.resolve(&hero.item.public_url(public_prefix));
                        img src=(source.src) srcset=[source.srcset.as_deref()] sizes="100vw" alt=(hero.item.alt_text);
                    }
                    div.hero-text {
                        h1 { (page.title) }
                        @if let Some(tagline) = &page.tagline {
                            p { (tagline) }
                        }
                    }
                }
                @if sections.len() > 1 {
                    nav.category-index {
                        @for section in sections {
                            a href={ "#" (slugify(&section.category)) } { (section.category) }
                        }
                    }
                }
                main {
                    @for section in sections {
                        (render_section(section, layout, manifest, public_prefix))
                    }
                }
            }
        }
    }
}

fn render_section(
    section: &GallerySection,
    layout: &LayoutConfig,
    manifest: &ThumbnailManifest,
    public_prefix: &str,
) -> Markup {
    let width = layout.reference_width;
    let row_style = format!(
        "column-gap:{};margin-bottom:{}px",
        percent(layout.gap, width),
        layout.gap
    );
    html! {
        section.category id=(slugify(&section.category)) {
            h2 { (section.category) }
            @for row in &section.rows {
                div.row style=(row_style) {
                    @for placed in &row.items {
                        (render_tile(&section.items[placed.index], placed.width, row.height, width, manifest, public_prefix))
                    }
                }
            }
        }
    }
}

fn render_tile(
    j: &JustifiedItem,
    item_width: f64,
    row_height: f64,
    container_width: f64,
    manifest: &ThumbnailManifest,
    public_prefix: &str,
) -> Markup {
    let original = j.item.public_url(public_prefix);
    let source = manifest.resolve(&original);
    let style = format!(
        "width:{};aspect-ratio:{:.4}",
        percent(item_width, container_width),
        item_width / row_height
    );
    let sizes = format!("{:.0}vw", item_width / container_width * 100.0);
    html! {
        a.tile href=(original) data-lightbox=(j.item.category) style=(style) {
            img src=(source.src) srcset=[source.srcset.as_deref()] sizes=(sizes) alt=(j.item.alt_text) loading="lazy" decoding="async";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::manifest::ManifestVariant;
    use crate::test_helpers::{item, write_file};
    use tempfile::TempDir;

    fn placed(category: &str, name: &str, ratio: f64) -> JustifiedItem {
        JustifiedItem {
            item: item(category, name),
            aspect_ratio: ratio,
        }
    }

    fn manifest_for(path: &str) -> ThumbnailManifest {
        let mut m = ThumbnailManifest::new();
        m.insert_image(
            &[path.to_string()],
            "/thumbnails/dawn-800.avif",
            &[
                ManifestVariant {
                    url: "/thumbnails/dawn-400.avif".into(),
                    width: 400,
                },
                ManifestVariant {
                    url: "/thumbnails/dawn-800.avif".into(),
                    width: 800,
                },
            ],
        );
        m
    }

    fn render(sections: &[GallerySection], manifest: &ThumbnailManifest) -> String {
        render_page(
            &PageConfig::default(),
            &LayoutConfig::default(),
            sections,
            manifest,
            "/assets",
        )
        .into_string()
    }

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("Street Photos"), "street-photos");
        assert_eq!(slugify("  B&W / 2021 "), "b-w-2021");
        assert_eq!(slugify("landscapes"), "landscapes");
    }

    #[test]
    fn sections_group_by_category_in_order() {
        let items = vec![
            placed("street", "a.jpg", 1.0),
            placed("landscapes", "b.jpg", 1.5),
            placed("street", "c.jpg", 0.8),
        ];
        let sections = build_sections(&items, &LayoutConfig::default());
        let names: Vec<&str> = sections.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["street", "landscapes"]);
        assert_eq!(sections[0].items.len(), 2);
        assert_eq!(sections[0].rows.iter().map(|r| r.items.len()).sum::<usize>(), 2);
    }

    #[test]
    fn page_uses_manifest_and_falls_back() {
        let items = vec![placed("landscapes", "dawn.jpg", 1.5), placed("landscapes", "dusk.jpg", 1.0)];
        let sections = build_sections(&items, &LayoutConfig::default());
        let html = render(&sections, &manifest_for("/assets/dawn.jpg"));

        assert!(html.contains(r#"src="/thumbnails/dawn-800.avif""#));
        assert!(html.contains("/thumbnails/dawn-400.avif 400w, /thumbnails/dawn-800.avif 800w"));
        assert!(html.contains(r#"src="/assets/dusk.jpg""#));
    }

    #[test]
    fn tiles_link_originals_for_lightbox() {
        let sections = build_sections(&[placed("street", "x.jpg", 1.0)], &LayoutConfig::default());
        let html = render(&sections, &ThumbnailManifest::new());
        assert!(html.contains(r#"href="/assets/x.jpg""#));
        assert!(html.contains(r#"data-lightbox="street""#));
        assert!(!html.contains("srcset"));
    }

    #[test]
    fn page_addresses_originals_by_public_prefix() {
        let sections = build_sections(&[placed("street", "x.jpg", 1.0)], &LayoutConfig::default());
        let dev_only = manifest_for("/src/assets/street/x.jpg");
        let html = render_page(
            &PageConfig::default(),
            &LayoutConfig::default(),
            &sections,
            &dev_only,
            "/media/originals/",
        )
        .into_string();
        assert!(html.contains(r#"href="/media/originals/x.jpg""#));
        assert!(html.contains(r#"src="/media/originals/x.jpg""#));
        assert!(!html.contains("/src/assets"));
    }

    #[test]
    fn category_index_links_anchors() {
        let items = vec![placed("Street Photos", "a.jpg", 1.0), placed("landscapes", "b.jpg", 1.0)];
        let html = render(&build_sections(&items, &LayoutConfig::default()), &ThumbnailManifest::new());
        assert!(html.contains(r##"href="#street-photos""##));
        assert!(html.contains(r#"id="street-photos""#));
        assert!(html.contains(r#"id="landscapes""#));
    }

    #[test]
    fn widths_are_percentages_of_reference() {
        // Three squares at 1200 with 8px gaps: (1200 - 16) / 3 = 394.6667
        let items = vec![
            placed("x", "a.jpg", 1.0),
            placed("x", "b.jpg", 1.0),
            placed("x", "c.jpg", 1.0),
        ];
        let html = render(&build_sections(&items, &LayoutConfig::default()), &ThumbnailManifest::new());
        assert_eq!(html.matches("width:32.8889%").count(), 3);
        assert!(html.contains("column-gap:0.6667%"));
    }

    #[test]
    fn title_is_escaped() {
        let page = PageConfig {
            title: "<script>alert(1)</script>".into(),
            ..PageConfig::default()
        };
        let html = render_page(&page, &LayoutConfig::default(), &[], &ThumbnailManifest::new(), "/assets")
            .into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn generate_writes_index() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("src/assets/landscapes/dawn.jpg"));
        write_file(&tmp.path().join("src/assets/street/dusk.jpg"));
        manifest_for("/assets/dawn.jpg")
            .save(&tmp.path().join("public/thumbnail-manifest.json"))
            .unwrap();

        let backend = MockBackend::new()
            .with_image("dawn.jpg", 1200, 800)
            .with_image("dusk.jpg", 800, 1200);
        let source = Arc::new(BackendAspectSource::with_backend(tmp.path(), backend));

        let summary = generate_with_source(tmp.path(), &SiteConfig::default(), source).unwrap();

        assert_eq!(summary.output, tmp.path().join("dist/index.html"));
        assert_eq!(summary.thumbnails, 1);
        assert_eq!(summary.originals, 1);
        assert_eq!(summary.sections.len(), 2);
        let html = fs::read_to_string(&summary.output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Portfolio"));
    }

    #[test]
    fn generate_without_manifest_serves_originals() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("src/assets/dawn.jpg"));
        let backend = MockBackend::new().with_image("dawn.jpg", 1000, 1000);
        let source = Arc::new(BackendAspectSource::with_backend(tmp.path(), backend));

        let summary = generate_with_source(tmp.path(), &SiteConfig::default(), source).unwrap();
        assert_eq!(summary.thumbnails, 0);
        assert_eq!(summary.originals, 1);
    }
}
