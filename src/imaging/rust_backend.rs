//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, Dimensions, ImageBackend, RenderedImage, RenderedVariant};
use super::calculations::variant_dimensions;
use super::params::VariantJob;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode and save as AVIF using rav1e (speed 6 for reasonable throughput).
///
/// The encoder only takes 8-bit RGB(A); other layouts are converted first.
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let normalized = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let mut encoded = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut encoded, 6, quality as u8);
    normalized.write_with_encoder(encoder).map_err(|e| {
        BackendError::ProcessingFailed(format!("AVIF encode failed for {}: {}", path.display(), e))
    })?;
    write_replacing(path, &encoded)
}

/// Write `bytes` to a temp file next to `path`, then rename it over `path`.
///
/// Two workers writing the same name leave one complete file behind.
pub(crate) fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn render_variants(&self, job: &VariantJob) -> Result<RenderedImage, BackendError> {
        let img = load_image(&job.source)?;
        let native = Dimensions {
            width: img.width(),
            height: img.height(),
        };

        let mut variants = Vec::with_capacity(job.variants.len());
        for spec in &job.variants {
            if !is_avif(&spec.output) {
                return Err(BackendError::ProcessingFailed(format!(
                    "Unsupported output format: {}",
                    spec.output.display()
                )));
            }
            let (width, height) =
                variant_dimensions((native.width, native.height), spec.target_width);
            if width == native.width {
                save_avif(&img, &spec.output, spec.quality.value())?;
            } else {
                let resized = img.resize_exact(width, height, FilterType::Lanczos3);
                save_avif(&resized, &spec.output, spec.quality.value())?;
            }
            variants.push(RenderedVariant {
                target_width: spec.target_width,
                width,
                height,
                output: spec.output.clone(),
            });
        }

        Ok(RenderedImage { native, variants })
    }
}
