//! # Folio
//!
//! Thumbnails and justified layout for photo portfolio sites.
//!
//! Source images live in plain directories; the first directory below a
//! source root is the image's category. Folio does two jobs around them:
//!
//! ```text
//! 1. Thumbs    src/assets/  →  public/thumbnails/*.avif + public/thumbnail-manifest.json
//! 2. Layout    items + ratios + container width  →  justified rows
//! ```
//!
//! The manifest is the only contract between the two. Anything that renders
//! the gallery (the bundled [`generate`] page, or a site's own templates)
//! looks originals up in it and falls back to the original file when a
//! thumbnail is missing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the source roots, produces [`types::ImageItem`]s in natural order |
//! | [`thumbs`] | Parallel thumbnail pipeline: decode once, encode every width, write the manifest |
//! | [`imaging`] | Pure-Rust image operations behind the [`imaging::ImageBackend`] trait |
//! | [`manifest`] | Manifest model: keys, srcset descriptors, lenient load, resolve with fallback |
//! | [`layout`] | Justified row packing, deterministic jitter, visible-row lookup |
//! | [`session`] | Async aspect-ratio resolution, generations, debounced resize |
//! | [`generate`] | Static `index.html` gallery rendered with Maud |
//! | [`config`] | `folio.toml` loading, validation and merging over stock defaults |
//! | [`naming`] | Filename conventions: alt text, natural ordering |
//! | [`types`] | Shared types |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## AVIF-Only Output
//!
//! All thumbnails are AVIF. A single modern format keeps the manifest to one
//! URL per width and avoids multi-format `<picture>` fallbacks.
//!
//! ## Widths Are Upper Bounds
//!
//! A thumbnail is never wider than its source. A 300px source still gets a
//! file under every target name (all 300px wide), so the manifest shape does
//! not depend on the source size; the srcset lists each real width once.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, rav1e
//! AVIF encoding). No system libraries, no external processes.
//!
//! ## Deterministic Layout
//!
//! [`layout::justify`] is a pure function. The small per-row height and
//! per-image ratio variations come from a hash of the file name, not a random
//! source, so a gallery renders identically on every run and every machine.

pub mod config;
pub mod generate;
pub mod imaging;
pub mod layout;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod scan;
pub mod session;
pub mod thumbs;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
