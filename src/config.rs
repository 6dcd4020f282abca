//! Project configuration.
//!
//! Handles loading, validating, and merging `folio.toml`. The file is
//! optional: without it every command runs on the stock conventions
//! (`src/assets` → `public/thumbnails`). When present, its values are merged
//! over the stock defaults table-by-table, so a file only needs the keys it
//! changes.
//!
//! ```toml
//! # Only switch the thumbnail widths
//! [thumbnails]
//! widths = [320, 640, 1280]
//! default_width = 640
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::QualityTier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `folio.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Source image roots, relative to the project root.
    pub sources: Vec<String>,
    /// Thumbnail generation and manifest settings.
    pub thumbnails: ThumbnailsConfig,
    /// Justified layout parameters.
    pub layout: LayoutConfig,
    /// Generated gallery page settings.
    pub site: PageConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sources: vec!["src/assets".to_string()],
            thumbnails: ThumbnailsConfig::default(),
            layout: LayoutConfig::default(),
            site: PageConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Validation("sources must not be empty".into()));
        }
        let t = &self.thumbnails;
        if t.widths.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.widths must not be empty".into(),
            ));
        }
        if t.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "thumbnails.widths values must be non-zero".into(),
            ));
        }
        if t.quality.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.quality must list at least one tier".into(),
            ));
        }
        if t.quality.iter().any(|q| q.quality == 0 || q.quality > 100) {
            return Err(ConfigError::Validation(
                "thumbnails.quality values must be 1-100".into(),
            ));
        }
        let l = &self.layout;
        if !(l.gap >= 0.0) {
            return Err(ConfigError::Validation("layout.gap must be >= 0".into()));
        }
        if !(l.overflow_factor >= 1.0) {
            return Err(ConfigError::Validation(
                "layout.overflow_factor must be >= 1.0".into(),
            ));
        }
        if !(l.min_row_height > 0.0) || !(l.default_row_height > 0.0) {
            return Err(ConfigError::Validation(
                "layout row heights must be positive".into(),
            ));
        }
        if !(l.reference_width > 0.0) {
            return Err(ConfigError::Validation(
                "layout.reference_width must be positive".into(),
            ));
        }
        if l.max_in_flight == 0 {
            return Err(ConfigError::Validation(
                "layout.max_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Flat directory receiving every generated thumbnail.
    pub output_dir: String,
    /// Where the manifest JSON is written.
    pub manifest: String,
    /// URL prefix under which `output_dir` is served.
    pub url_prefix: String,
    /// Production URL prefix of original assets (`/assets/<filename>`).
    pub public_prefix: String,
    /// Target widths in pixels. Never upscaled past the source width.
    pub widths: Vec<u32>,
    /// Target width used as the manifest's default thumbnail.
    pub default_width: u32,
    /// Prefix thumbnail names with the category to avoid basename collisions.
    pub namespace_by_category: bool,
    /// Encoding quality by target width, ascending by `max_width`.
    pub quality: Vec<QualityTier>,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            output_dir: "public/thumbnails".to_string(),
            manifest: "public/thumbnail-manifest.json".to_string(),
            url_prefix: "/thumbnails".to_string(),
            public_prefix: "/assets".to_string(),
            widths: vec![400, 800, 1200],
            default_width: 800,
            namespace_by_category: false,
            quality: QualityTier::defaults(),
        }
    }
}

/// A `min_width → row_height` breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Breakpoint {
    pub min_width: f64,
    pub row_height: f64,
}

/// Justified layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Gap between items and between rows, in px.
    pub gap: f64,
    /// Row-height breakpoints, checked widest first.
    pub breakpoints: Vec<Breakpoint>,
    /// Base row height below every breakpoint.
    pub default_row_height: f64,
    /// A row closes once its estimate would exceed `container * overflow_factor`.
    pub overflow_factor: f64,
    /// Floor for any final row height.
    pub min_row_height: f64,
    /// Cap on row height as a multiple of its exact-fill height.
    pub max_fill_ratio: f64,
    /// Per-row height jitter band (fraction of base height).
    pub height_jitter: f64,
    /// Per-item aspect ratio jitter band (fraction of the ratio).
    pub aspect_jitter: f64,
    /// Maximum concurrent aspect-ratio resolutions.
    pub max_in_flight: usize,
    /// Quiet period before a container resize triggers a relayout.
    pub resize_debounce_ms: u64,
    /// Extra px above and below the viewport kept materialized.
    pub viewport_buffer: f64,
    /// Container width used when laying out the static page.
    pub reference_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap: 8.0,
            breakpoints: vec![
                Breakpoint {
                    min_width: 1024.0,
                    row_height: 260.0,
                },
                Breakpoint {
                    min_width: 640.0,
                    row_height: 220.0,
                },
            ],
            default_row_height: 200.0,
            overflow_factor: 1.15,
            min_row_height: 80.0,
            max_fill_ratio: 1.2,
            height_jitter: 0.06,
            aspect_jitter: 0.10,
            max_in_flight: 8,
            resize_debounce_ms: 150,
            viewport_buffer: 800.0,
            reference_width: 1200.0,
        }
    }
}

/// Generated gallery page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Page title and hero heading.
    pub title: String,
    /// Optional line under the hero heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Output directory for `index.html`.
    pub output_dir: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            tagline: None,
            output_dir: "dist".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel encoding workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` when it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config from `path`, falling back to stock defaults when
/// the file is absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        log::debug!("loaded config from {}", path.display());
    }
    resolve_config(overlay)
}

/// A documented `folio.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# folio configuration. Every key is optional; defaults shown.

# Source image roots, relative to the project root.
sources = ["src/assets"]

[thumbnails]
output_dir = "public/thumbnails"          # Flat directory for all thumbnails
manifest = "public/thumbnail-manifest.json"
url_prefix = "/thumbnails"                # URL the output_dir is served under
public_prefix = "/assets"                 # Production URL prefix of originals
widths = [400, 800, 1200]                 # Target widths (never upscaled)
default_width = 800                       # Manifest default thumbnail
namespace_by_category = false             # <category>-<name>-<w>.avif when true

# Quality by target width; the last tier also covers wider targets.
[[thumbnails.quality]]
max_width = 400
quality = 40

[[thumbnails.quality]]
max_width = 800
quality = 38

[[thumbnails.quality]]
max_width = 1200
quality = 35

[layout]
gap = 8.0
default_row_height = 200.0                # Below every breakpoint
overflow_factor = 1.15                    # Row closes past width * factor
min_row_height = 80.0
max_fill_ratio = 1.2                      # Height cap vs exact-fill height
height_jitter = 0.06                      # +/- fraction per row
aspect_jitter = 0.10                      # +/- fraction per image
max_in_flight = 8                         # Concurrent aspect resolutions
resize_debounce_ms = 150
viewport_buffer = 800.0
reference_width = 1200.0                  # Width used for the static page

[[layout.breakpoints]]
min_width = 1024.0
row_height = 260.0

[[layout.breakpoints]]
min_width = 640.0
row_height = 220.0

[site]
title = "Portfolio"
# tagline = "Light, mostly."
output_dir = "dist"

[processing]
# max_processes = 4                       # Omit for one worker per core
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_uses_conventions() {
        let config = SiteConfig::default();
        assert_eq!(config.sources, vec!["src/assets"]);
        assert_eq!(config.thumbnails.output_dir, "public/thumbnails");
        assert_eq!(config.thumbnails.widths, vec![400, 800, 1200]);
        assert_eq!(config.thumbnails.default_width, 800);
        assert!(!config.thumbnails.namespace_by_category);
    }

    #[test]
    fn default_layout_values() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.overflow_factor, 1.15);
        assert_eq!(layout.min_row_height, 80.0);
        assert_eq!(layout.max_in_flight, 8);
        assert_eq!(layout.breakpoints[0].row_height, 260.0);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[thumbnails]
widths = [320, 640]
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.thumbnails.widths, vec![320, 640]);
        assert_eq!(config.thumbnails.url_prefix, "/thumbnails");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("folio.toml")).unwrap();
        assert_eq!(config.thumbnails.widths, vec![400, 800, 1200]);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("folio.toml");
        fs::write(
            &path,
            r#"
sources = ["photos", "more-photos"]

[site]
title = "Light Studies"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.sources, vec!["photos", "more-photos"]);
        assert_eq!(config.site.title, "Light Studies");
        assert_eq!(config.layout.gap, 8.0);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("folio.toml");
        fs::write(&path, "this is not [valid toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("surprise = 1");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
[layout]
gapp = 4.0
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[thumbnails]
widths = [400, 800]
default_width = 800
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[thumbnails]
default_width = 400
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let t = merged.get("thumbnails").unwrap();
        assert_eq!(t.get("default_width").unwrap().as_integer(), Some(400));
        assert_eq!(t.get("widths").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("sources = [\"a\", \"b\"]").unwrap();
        let overlay: toml::Value = toml::from_str("sources = [\"c\"]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("sources").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_widths() {
        let mut config = SiteConfig::default();
        config.thumbnails.widths.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_quality_out_of_range() {
        let mut config = SiteConfig::default();
        config.thumbnails.quality[0].quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_overflow_below_one() {
        let mut config = SiteConfig::default();
        config.layout.overflow_factor = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str(
            r#"
[layout]
max_in_flight = 0
"#,
        )
        .unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(parsed.sources, defaults.sources);
        assert_eq!(parsed.thumbnails.widths, defaults.thumbnails.widths);
        assert_eq!(parsed.thumbnails.quality, defaults.thumbnails.quality);
        assert_eq!(parsed.layout.breakpoints, defaults.layout.breakpoints);
        assert_eq!(parsed.site.title, defaults.site.title);
    }
}
