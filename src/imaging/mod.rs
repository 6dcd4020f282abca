//! Image processing in pure Rust, no system libraries.
//!
//! Thumbnails are produced by decoding a source once and encoding every
//! configured width from that decode:
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only) |
//! | **Downscale** | `resize_exact` with Lanczos3, never upscaling |
//! | **Encode** | rav1e AVIF at a width-dependent quality |
//!
//! Dimension math lives in pure functions, the pixel work behind
//! [`ImageBackend`] so the pipeline can run against a mock.

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, RenderedImage, RenderedVariant};
pub use calculations::variant_dimensions;
pub use operations::{
    THUMBNAIL_EXTENSION, VariantConfig, create_variants, variant_filename,
};
pub use params::{Quality, QualityTier, VariantJob, VariantSpec, quality_for_width};
pub use rust_backend::RustBackend;
