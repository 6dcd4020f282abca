//! Shared test utilities.
//!
//! Builders for on-disk fixtures (empty placeholder files, synthetic JPEGs)
//! and small constructors for items used across module tests.

use crate::layout::JustifiedItem;
use crate::types::ImageItem;
use image::{ImageEncoder, RgbImage};
use std::path::Path;

/// Create an empty file, including parent directories.
pub fn write_file(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// An item in `category` at `src/assets/<category>/<filename>`.
pub fn item(category: &str, filename: &str) -> ImageItem {
    ImageItem {
        source_path: format!("src/assets/{category}/{filename}"),
        alt_text: filename.to_string(),
        category: category.to_string(),
    }
}

/// Justified items named `img1.jpg`, `img2.jpg`, … with the given ratios.
pub fn justified(ratios: &[f64]) -> Vec<JustifiedItem> {
    ratios
        .iter()
        .enumerate()
        .map(|(i, &aspect_ratio)| JustifiedItem {
            item: item("test", &format!("img{}.jpg", i + 1)),
            aspect_ratio,
        })
        .collect()
}

/// Sum of rendered widths in a row, rounded to 1/1000 px.
pub fn row_width_sum(row: &crate::layout::Row) -> f64 {
    (row.items.iter().map(|i| i.width).sum::<f64>() * 1000.0).round() / 1000.0
}
