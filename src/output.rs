//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (category, image, row) is its semantic identity, with
//! filesystem paths shown as secondary context via indented `Source:` lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! 001 landscapes (2 photos)
//!     001 dawn
//!         Source: src/assets/landscapes/001-dawn.jpg
//!     002 Misty Morning
//!         Source: src/assets/landscapes/002-Misty-Morning.jpg
//! ```
//!
//! ## Thumbs
//!
//! ```text
//! Generating thumbnails for 12 images (400, 800, 1200)
//!     001-dawn.jpg 2000x1333
//!         Source: src/assets/landscapes/001-dawn.jpg
//!         400: 400w 001-dawn-400.avif
//!         800: 800w 001-dawn-800.avif
//! Manifest: public/thumbnail-manifest.json (48 entries)
//! ```
//!
//! ## Layout
//!
//! ```text
//! Layout at 1200px (base row height 260px)
//! 001 262.4px (3 photos)
//!     001-dawn.jpg 401.3px
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::generate::GenerateSummary;
use crate::layout::{JustifiedItem, Row};
use crate::scan::categories;
use crate::thumbs::{ThumbEvent, ThumbsResult};
use crate::types::ImageItem;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional count.
///
/// ```text
/// 001 landscapes (5 photos)
/// 001 landscapes
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({} {})", format_index(index), title, n, photos(n)),
        None => format!("{} {}", format_index(index), title),
    }
}

fn photos(n: usize) -> &'static str {
    if n == 1 { "photo" } else { "photos" }
}

/// Format an image line: alt text when present, else the filename in parens.
///
/// ```text
/// 001 The Sunset        // alt text
/// 001 (010.jpg)         // no alt text: filename IS the identity
/// ```
fn image_line(index: usize, alt: &str, filename: &str) -> String {
    if alt.is_empty() {
        format!("{} ({})", format_index(index), filename)
    } else {
        format!("{} {}", format_index(index), alt)
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ============================================================================
// Scan output
// ============================================================================

/// Discovered images grouped by category.
pub fn format_scan_output(items: &[ImageItem]) -> Vec<String> {
    let mut lines = Vec::new();
    if items.is_empty() {
        lines.push("No images found".to_string());
        return lines;
    }

    for (ci, category) in categories(items).into_iter().enumerate() {
        let in_category: Vec<&ImageItem> =
            items.iter().filter(|i| i.category == category).collect();
        lines.push(entity_header(ci + 1, category, Some(in_category.len())));
        for (i, item) in in_category.iter().enumerate() {
            lines.push(format!(
                "{}{}",
                indent(1),
                image_line(i + 1, &item.alt_text, item.filename())
            ));
            lines.push(format!("{}Source: {}", indent(2), item.source_path));
        }
    }
    lines
}

pub fn print_scan_output(items: &[ImageItem]) {
    for line in format_scan_output(items) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbs output
// ============================================================================

/// Format a single progress event from the thumbnail pipeline.
pub fn format_thumb_event(event: &ThumbEvent) -> Vec<String> {
    match event {
        ThumbEvent::Started { images, widths } => {
            let widths: Vec<String> = widths.iter().map(u32::to_string).collect();
            vec![format!(
                "Generating thumbnails for {} {} ({})",
                images,
                if *images == 1 { "image" } else { "images" },
                widths.join(", ")
            )]
        }
        ThumbEvent::ImageProcessed {
            source_path,
            native,
            variants,
        } => {
            let mut lines = vec![
                format!(
                    "{}{} {}x{}",
                    indent(1),
                    file_name(source_path),
                    native.width,
                    native.height
                ),
                format!("{}Source: {}", indent(2), source_path),
            ];
            for v in variants {
                lines.push(format!(
                    "{}{}: {}w {}",
                    indent(2),
                    v.target_width,
                    v.width,
                    v.file_name
                ));
            }
            lines
        }
        ThumbEvent::ManifestWritten { path, entries } => {
            vec![format!("Manifest: {} ({} entries)", path.display(), entries)]
        }
    }
}

/// Closing summary of a successful thumbnail run.
pub fn format_thumbs_summary(result: &ThumbsResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Generated {} thumbnails for {} images",
        result.thumbnail_count(),
        result.records.len()
    )];
    for c in &result.collisions {
        lines.push(format!(
            "{}Name collision \"{}\": {}",
            indent(1),
            c.stem,
            c.sources.join(", ")
        ));
    }
    lines
}

pub fn print_thumbs_summary(result: &ThumbsResult) {
    for line in format_thumbs_summary(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Layout output
// ============================================================================

/// Rows of a justified layout with per-item widths.
pub fn format_layout_output(
    placed: &[JustifiedItem],
    rows: &[Row],
    container_width: f64,
    base_row_height: f64,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Layout at {}px (base row height {}px)",
        container_width, base_row_height
    )];
    for (ri, row) in rows.iter().enumerate() {
        lines.push(entity_header(
            ri + 1,
            &format!("{:.1}px", row.height),
            Some(row.items.len()),
        ));
        for slot in &row.items {
            let Some(j) = placed.get(slot.index) else {
                continue;
            };
            lines.push(format!(
                "{}{} {:.1}px",
                indent(1),
                j.item.filename(),
                slot.width
            ));
        }
    }
    lines
}

pub fn print_layout_output(
    placed: &[JustifiedItem],
    rows: &[Row],
    container_width: f64,
    base_row_height: f64,
) {
    for line in format_layout_output(placed, rows, container_width, base_row_height) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Sections written to the gallery page, followed by a summary line.
pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec![format!("Gallery \u{2192} {}", summary.output.display())];
    for (i, section) in summary.sections.iter().enumerate() {
        lines.push(format!(
            "{}{} \u{2192} {} rows",
            indent(1),
            entity_header(i + 1, &section.category, Some(section.images)),
            section.rows
        ));
    }
    lines.push(format!(
        "Generated {} images: {} thumbnails, {} originals",
        summary.thumbnails + summary.originals,
        summary.thumbnails,
        summary.originals
    ));
    lines
}

pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
