use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// One horizontal run of claimed pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub row: i32,
    pub start: i32,
    pub end: i32,
}

impl Span {
    pub fn width(&self) -> i32 {
        self.end - self.start + 1
    }
}

/// The pixels a fill run claimed, stored as disjoint spans per row.
///
/// While a run is in progress the region also serves as its visited record:
/// a pixel already inside the region is never claimed twice, whether or not
/// the surface was modified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRegion {
    // row -> (start -> end), spans sorted, disjoint and non-adjacent
    rows: BTreeMap<i32, BTreeMap<i32, i32>>,
}

impl FillRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rows
            .get(&y)
            .and_then(|spans| spans.range(..=x).next_back())
            .is_some_and(|(_, &end)| end >= x)
    }

    pub fn pixel_count(&self) -> u64 {
        self.spans().map(|s| s.width() as u64).sum()
    }

    /// All spans, top to bottom and left to right.
    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.rows.iter().flat_map(|(&row, spans)| {
            spans
                .iter()
                .map(move |(&start, &end)| Span { row, start, end })
        })
    }

    /// Minimal rect covering the region; empty when nothing was claimed.
    pub fn bounding_rect(&self) -> Rect {
        let (Some(&top), Some(&bottom)) = (self.rows.keys().next(), self.rows.keys().next_back())
        else {
            return Rect::default();
        };
        let mut left = i32::MAX;
        let mut right = i32::MIN;
        for spans in self.rows.values() {
            if let Some((&start, _)) = spans.iter().next() {
                left = left.min(start);
            }
            if let Some((_, &end)) = spans.iter().next_back() {
                right = right.max(end);
            }
        }
        Rect::from_corners(left, top, right, bottom)
    }

    /// Rasterise the region into a selection mask whose pixel `(0, 0)` maps
    /// to the top-left corner of `rect`.  255 = inside, 0 = outside.
    pub fn to_mask(&self, rect: Rect) -> GrayImage {
        if rect.is_empty() {
            return GrayImage::new(0, 0);
        }
        let mut mask = GrayImage::new(rect.width as u32, rect.height as u32);
        for span in self.spans() {
            if !rect.contains_row(span.row) {
                continue;
            }
            let start = span.start.max(rect.left());
            let end = span.end.min(rect.right());
            let y = (span.row - rect.top()) as u32;
            for x in start..=end {
                mask.put_pixel((x - rect.left()) as u32, y, Luma([255]));
            }
        }
        mask
    }

    /// Record `start..=end` on `row`.  The span must not overlap anything
    /// already recorded; adjacent spans are coalesced.
    pub(crate) fn add_span(&mut self, row: i32, start: i32, end: i32) {
        let spans = self.rows.entry(row).or_default();
        debug_assert!(
            spans
                .range(..=end)
                .next_back()
                .is_none_or(|(_, &e)| e < start),
            "span {start}..={end} on row {row} was already claimed"
        );

        let mut start = start;
        let mut end = end;
        if let Some((&prev_start, &prev_end)) = spans.range(..start).next_back()
            && prev_end + 1 == start
        {
            spans.remove(&prev_start);
            start = prev_start;
        }
        if let Some(next_end) = spans.remove(&(end + 1)) {
            end = next_end;
        }
        spans.insert(start, end);
    }
}
