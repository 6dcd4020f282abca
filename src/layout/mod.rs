//! Justified gallery layout.
//!
//! Packs images of known aspect ratio into rows that span a container, the
//! way a photo book lays out a spread: every row is full width, rows differ
//! slightly in height, no photo is distorted beyond its box.
//!
//! # Algorithm
//!
//! Greedy row fill with a soft overflow and a post-hoc height correction:
//!
//! 1. Pick a base row height from the container width
//!    ([`base_row_height_for`]).
//! 2. Walk the items in the order given, estimating the row's width at the
//!    base height (`Σ ratio · base` plus the gaps).
//! 3. Close the row when the next item would push the estimate past
//!    `container · overflow_factor`. A row always holds at least one item.
//! 4. Size the closed row. The exact-fill height is the height at which the
//!    row spans the container. The target height is the base height nudged by
//!    a per-row jitter keyed on the row's first image; the final height is
//!    the target capped at `max_fill_ratio` times the exact-fill height, then
//!    raised to `min_row_height` if needed.
//! 5. Each item's width is its share of the row's free width
//!    (`ratio / Σ ratio`), so rows always span the container exactly. When the
//!    final height differs from the exact-fill height the box crops the photo
//!    slightly instead of leaving a ragged edge.
//!
//! [`justify`] is a pure function of its inputs: no state survives between
//! calls, and identical inputs give bit-identical rows.

pub mod geometry;
pub mod jitter;

pub use geometry::RowGeometry;
pub use jitter::{item_identifier, perturb_aspect_ratio, signed_jitter};

use crate::config::{Breakpoint, LayoutConfig};
use crate::types::ImageItem;
use serde::Serialize;

/// An image with its resolved aspect ratio (width / height).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JustifiedItem {
    pub item: ImageItem,
    pub aspect_ratio: f64,
}

/// One placed item: index into the input slice and its render width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowItem {
    pub index: usize,
    pub width: f64,
}

/// A laid-out row. Purely derived; rebuilt on every layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub items: Vec<RowItem>,
    /// Final render height shared by every item.
    pub height: f64,
    /// Height at which the items' natural widths span the container.
    pub fill_height: f64,
}

/// Inputs to [`justify`] besides the items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub container_width: f64,
    pub gap: f64,
    pub base_row_height: f64,
    pub overflow_factor: f64,
    pub min_row_height: f64,
    pub max_fill_ratio: f64,
    pub height_jitter: f64,
}

impl LayoutParams {
    /// Params with stock tuning and an explicit base height.
    pub fn new(container_width: f64, gap: f64, base_row_height: f64) -> Self {
        let d = LayoutConfig::default();
        Self {
            container_width,
            gap,
            base_row_height,
            overflow_factor: d.overflow_factor,
            min_row_height: d.min_row_height,
            max_fill_ratio: d.max_fill_ratio,
            height_jitter: d.height_jitter,
        }
    }

    /// Params for `container_width`, base height taken from the breakpoints.
    pub fn from_config(config: &LayoutConfig, container_width: f64) -> Self {
        Self {
            container_width,
            gap: config.gap,
            base_row_height: base_row_height_for(
                container_width,
                &config.breakpoints,
                config.default_row_height,
            ),
            overflow_factor: config.overflow_factor,
            min_row_height: config.min_row_height,
            max_fill_ratio: config.max_fill_ratio,
            height_jitter: config.height_jitter,
        }
    }
}

/// Base row height for a container: the tallest breakpoint whose
/// `min_width` the container reaches, else `default_height`.
///
/// With the stock breakpoints: `≥1024 → 260`, `≥640 → 220`, else `200`.
pub fn base_row_height_for(width: f64, breakpoints: &[Breakpoint], default_height: f64) -> f64 {
    breakpoints
        .iter()
        .filter(|b| width >= b.min_width)
        .max_by(|a, b| a.min_width.total_cmp(&b.min_width))
        .map(|b| b.row_height)
        .unwrap_or(default_height)
}

/// Partition `items` into justified rows.
///
/// Returns no rows for an empty list or a non-positive container width.
/// Non-finite or non-positive ratios are treated as `1.0`.
pub fn justify(items: &[JustifiedItem], params: &LayoutParams) -> Vec<Row> {
    if items.is_empty() || !params.container_width.is_finite() || params.container_width <= 0.0 {
        return Vec::new();
    }

    let threshold = params.container_width * params.overflow_factor;
    let mut rows = Vec::new();
    let mut start = 0;
    let mut estimate = 0.0;

    for (i, item) in items.iter().enumerate() {
        let w = sanitize(item.aspect_ratio) * params.base_row_height;
        let in_row = i - start;
        let next = if in_row == 0 {
            w
        } else {
            estimate + params.gap + w
        };
        if in_row > 0 && next > threshold {
            rows.push(close_row(items, start, i, params));
            start = i;
            estimate = w;
        } else {
            estimate = next;
        }
    }
    rows.push(close_row(items, start, items.len(), params));
    rows
}

fn sanitize(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

fn close_row(items: &[JustifiedItem], start: usize, end: usize, params: &LayoutParams) -> Row {
    let slice = &items[start..end];
    let ratio_sum: f64 = slice.iter().map(|i| sanitize(i.aspect_ratio)).sum();
    let gaps = params.gap * (slice.len() - 1) as f64;
    let free = params.container_width - gaps;

    let jitter = signed_jitter(&slice[0].item.source_path, params.height_jitter);
    let target = params.base_row_height * (1.0 + jitter);

    // Too many gaps for the container: fall back to natural widths.
    if free <= 0.0 {
        let height = target.max(params.min_row_height);
        return Row {
            items: slice
                .iter()
                .enumerate()
                .map(|(k, i)| RowItem {
                    index: start + k,
                    width: sanitize(i.aspect_ratio) * height,
                })
                .collect(),
            height,
            fill_height: 0.0,
        };
    }

    let fill_height = free / ratio_sum;
    let height = target
        .min(fill_height * params.max_fill_ratio)
        .max(params.min_row_height);

    Row {
        items: slice
            .iter()
            .enumerate()
            .map(|(k, i)| RowItem {
                index: start + k,
                width: free * sanitize(i.aspect_ratio) / ratio_sum,
            })
            .collect(),
        height,
        fill_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{justified, row_width_sum};

    fn stock_breakpoints() -> Vec<Breakpoint> {
        LayoutConfig::default().breakpoints
    }

    #[test]
    fn base_height_breakpoints() {
        let bps = stock_breakpoints();
        assert_eq!(base_row_height_for(1440.0, &bps, 200.0), 260.0);
        assert_eq!(base_row_height_for(1024.0, &bps, 200.0), 260.0);
        assert_eq!(base_row_height_for(800.0, &bps, 200.0), 220.0);
        assert_eq!(base_row_height_for(640.0, &bps, 200.0), 220.0);
        assert_eq!(base_row_height_for(375.0, &bps, 200.0), 200.0);
    }

    #[test]
    fn three_squares_fill_one_row() {
        let items = justified(&[1.0, 1.0, 1.0]);
        let rows = justify(&items, &LayoutParams::new(900.0, 10.0, 200.0));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].items.len(), 3);
        assert_eq!(row_width_sum(&rows[0]), 880.0);
    }

    #[test]
    fn rows_break_past_overflow_threshold() {
        // 1.5 * 200 = 300 each; 3 items = 920 <= 1035, the 4th would be 1230
        let items = justified(&[1.5, 1.5, 1.5, 1.5, 1.5]);
        let rows = justify(&items, &LayoutParams::new(900.0, 10.0, 200.0));

        let sizes: Vec<usize> = rows.iter().map(|r| r.items.len()).collect();
        assert_eq!(sizes, vec![3, 2]);
    }

    #[test]
    fn oversized_item_gets_its_own_row() {
        let items = justified(&[3.5, 3.5, 1.0]);
        let rows = justify(&items, &LayoutParams::new(500.0, 10.0, 200.0));
        assert_eq!(rows[0].items.len(), 1);
        assert_eq!(rows[1].items.len(), 1);
    }

    #[test]
    fn every_item_placed_exactly_once_in_order() {
        let ratios: Vec<f64> = (0..57).map(|i| 0.4 + (i % 9) as f64 * 0.35).collect();
        let items = justified(&ratios);
        for width in [320.0, 640.0, 1024.0, 1920.0] {
            let params = LayoutParams::new(width, 8.0, 220.0);
            let indices: Vec<usize> = justify(&items, &params)
                .iter()
                .flat_map(|r| r.items.iter().map(|i| i.index))
                .collect();
            assert_eq!(indices, (0..items.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn rows_span_the_container() {
        let ratios: Vec<f64> = (0..40).map(|i| 0.5 + (i % 5) as f64 * 0.4).collect();
        let items = justified(&ratios);
        let rows = justify(&items, &LayoutParams::new(1200.0, 8.0, 260.0));
        for row in &rows {
            let gaps = 8.0 * (row.items.len() - 1) as f64;
            assert!((row_width_sum(row) - (1200.0 - gaps)).abs() < 0.01);
        }
    }

    #[test]
    fn heights_respect_floor_and_fill_cap() {
        let ratios: Vec<f64> = (0..60).map(|i| 0.3 + (i % 12) as f64 * 0.27).collect();
        let items = justified(&ratios);
        for width in [200.0, 480.0, 900.0, 1600.0] {
            for row in justify(&items, &LayoutParams::new(width, 6.0, 200.0)) {
                assert!(row.height >= 80.0);
                if row.fill_height * 1.2 >= 80.0 {
                    assert!(row.height <= row.fill_height * 1.2 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn single_wide_item_row_is_capped() {
        // Alone in a 300px container a 3.0 panorama fills at 100px; the
        // jittered ~200px target is capped at 120.
        let items = justified(&[3.0]);
        let rows = justify(&items, &LayoutParams::new(300.0, 10.0, 200.0));
        assert_eq!(rows[0].fill_height, 100.0);
        assert!((rows[0].height - 120.0).abs() < 1e-9);
    }

    #[test]
    fn floor_wins_over_cap() {
        let items = justified(&[3.5]);
        let rows = justify(&items, &LayoutParams::new(100.0, 0.0, 200.0));
        assert_eq!(rows[0].height, 80.0);
    }

    #[test]
    fn row_height_jitter_stays_in_band() {
        let items = justified(&[1.0; 30]);
        for row in justify(&items, &LayoutParams::new(2000.0, 0.0, 200.0)) {
            // Rows are wide enough that the fill cap never binds
            assert!((188.0..=212.0).contains(&row.height), "{}", row.height);
        }
    }

    #[test]
    fn layout_is_idempotent() {
        let ratios: Vec<f64> = (0..25).map(|i| 0.6 + (i % 4) as f64 * 0.5).collect();
        let items = justified(&ratios);
        let params = LayoutParams::new(1024.0, 8.0, 260.0);
        assert_eq!(justify(&items, &params), justify(&items, &params));
    }

    #[test]
    fn empty_input_or_zero_width_gives_no_rows() {
        assert!(justify(&[], &LayoutParams::new(900.0, 10.0, 200.0)).is_empty());
        let items = justified(&[1.0]);
        assert!(justify(&items, &LayoutParams::new(0.0, 10.0, 200.0)).is_empty());
    }

    #[test]
    fn invalid_ratio_treated_as_square() {
        let items = justified(&[f64::NAN, 0.0, -2.0]);
        let rows = justify(&items, &LayoutParams::new(900.0, 10.0, 200.0));
        let widths: Vec<f64> = rows[0].items.iter().map(|i| i.width).collect();
        assert!(widths.iter().all(|w| (w - widths[0]).abs() < 1e-9));
    }

    #[test]
    fn params_from_config_picks_breakpoint() {
        let params = LayoutParams::from_config(&LayoutConfig::default(), 800.0);
        assert_eq!(params.base_row_height, 220.0);
        assert_eq!(params.gap, 8.0);
    }
}
