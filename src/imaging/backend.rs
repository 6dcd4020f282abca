//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! identify (header-only dimension read) and render_variants (decode once,
//! encode every requested width). The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::VariantJob;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Width over height. `None` for degenerate zero-height images.
    pub fn aspect_ratio(self) -> Option<f64> {
        (self.height > 0 && self.width > 0).then(|| self.width as f64 / self.height as f64)
    }
}

/// One file written by [`ImageBackend::render_variants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVariant {
    pub target_width: u32,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// Outcome of rendering all variants of one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub native: Dimensions,
    pub variants: Vec<RenderedVariant>,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `job.source` once and write one file per variant.
    fn render_variants(&self, job: &VariantJob) -> Result<RenderedImage, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::calculations::variant_dimensions;
    use crate::imaging::params::{Quality, VariantSpec};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching pixels.
    ///
    /// Dimensions are looked up by file name so results don't depend on the
    /// order rayon workers reach the backend. Uses Mutex (not RefCell) so it
    /// is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Mutex<HashMap<String, Dimensions>>,
        pub failures: Mutex<Vec<String>>,
        pub unwritten: Mutex<Vec<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Render {
            source: String,
            outputs: Vec<(String, u32, u32)>,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register dimensions for a file name (last path component).
        pub fn with_image(self, filename: &str, width: u32, height: u32) -> Self {
            self.dimensions
                .lock()
                .unwrap()
                .insert(filename.to_string(), Dimensions { width, height });
            self
        }

        /// Make every operation on `filename` fail.
        pub fn failing(self, filename: &str) -> Self {
            self.failures.lock().unwrap().push(filename.to_string());
            self
        }

        /// Report variants of `filename` as rendered without creating the files.
        pub fn without_outputs(self, filename: &str) -> Self {
            self.unwritten.lock().unwrap().push(filename.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn lookup(&self, path: &Path) -> Result<Dimensions, BackendError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if self.failures.lock().unwrap().contains(&name) {
                return Err(BackendError::ProcessingFailed(format!(
                    "Failed to decode {}",
                    path.display()
                )));
            }
            self.dimensions
                .lock()
                .unwrap()
                .get(&name)
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed(format!("No mock dimensions for {name}")))
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));
            self.lookup(path)
        }

        fn render_variants(&self, job: &VariantJob) -> Result<RenderedImage, BackendError> {
            let native = self.lookup(&job.source)?;
            let variants: Vec<RenderedVariant> = job
                .variants
                .iter()
                .map(|spec| {
                    let (width, height) =
                        variant_dimensions((native.width, native.height), spec.target_width);
                    RenderedVariant {
                        target_width: spec.target_width,
                        width,
                        height,
                        output: spec.output.clone(),
                    }
                })
                .collect();
            let source_name = job
                .source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            // Touch the outputs so manifest verification sees real files
            if !self.unwritten.lock().unwrap().contains(&source_name) {
                for v in &variants {
                    std::fs::write(&v.output, b"")?;
                }
            }
            self.operations.lock().unwrap().push(RecordedOp::Render {
                source: job.source.to_string_lossy().to_string(),
                outputs: job
                    .variants
                    .iter()
                    .map(|s| {
                        (
                            s.output.to_string_lossy().to_string(),
                            s.target_width,
                            s.quality.value(),
                        )
                    })
                    .collect(),
            });
            Ok(RenderedImage { native, variants })
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new().with_image("image.jpg", 800, 600);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result, Dimensions { width: 800, height: 600 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_render_clamps_widths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new().with_image("small.jpg", 300, 200);
        let job = VariantJob {
            source: "/src/small.jpg".into(),
            variants: vec![VariantSpec {
                target_width: 800,
                output: tmp.path().join("small-800.avif"),
                quality: Quality::new(38),
            }],
        };

        let rendered = backend.render_variants(&job).unwrap();
        assert_eq!(rendered.variants[0].width, 300);
        assert!(tmp.path().join("small-800.avif").exists());
    }

    #[test]
    fn mock_failure_is_an_error() {
        let backend = MockBackend::new().failing("broken.jpg");
        assert!(backend.identify(Path::new("a/broken.jpg")).is_err());
    }

    #[test]
    fn aspect_ratio_of_dimensions() {
        assert_eq!(
            Dimensions {
                width: 300,
                height: 200
            }
            .aspect_ratio(),
            Some(1.5)
        );
        assert_eq!(
            Dimensions {
                width: 300,
                height: 0
            }
            .aspect_ratio(),
            None
        );
    }
}
