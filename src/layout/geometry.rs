//! Vertical row geometry and visible-range lookup.
//!
//! Long galleries only materialize rows near the viewport. Row tops are
//! monotonic, so the visible window is two binary searches.

use super::Row;
use std::ops::Range;

/// Cumulative vertical extents of a list of rows separated by `gap`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGeometry {
    tops: Vec<f64>,
    bottoms: Vec<f64>,
}

impl RowGeometry {
    pub fn new(rows: &[Row], gap: f64) -> Self {
        let mut tops = Vec::with_capacity(rows.len());
        let mut bottoms = Vec::with_capacity(rows.len());
        let mut y = 0.0;
        for row in rows {
            tops.push(y);
            bottoms.push(y + row.height);
            y += row.height + gap;
        }
        Self { tops, bottoms }
    }

    pub fn len(&self) -> usize {
        self.tops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tops.is_empty()
    }

    pub fn top(&self, row: usize) -> Option<f64> {
        self.tops.get(row).copied()
    }

    /// Height from the first row's top to the last row's bottom.
    pub fn total_height(&self) -> f64 {
        self.bottoms.last().copied().unwrap_or(0.0)
    }

    /// Rows intersecting `[scroll_top - buffer, scroll_top + viewport + buffer]`.
    pub fn visible_rows(&self, scroll_top: f64, viewport_height: f64, buffer: f64) -> Range<usize> {
        let lo = scroll_top - buffer;
        let hi = scroll_top + viewport_height + buffer;
        let start = self.bottoms.partition_point(|&b| b < lo);
        let end = self.tops.partition_point(|&t| t <= hi);
        start..end.max(start)
    }
}
