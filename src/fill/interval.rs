use std::fmt;

use serde::{Deserialize, Serialize};

/// A contiguous run of columns `start..=end` tagged with a row.
///
/// On the forward frontier `row` is the row the run is applied to next; on
/// the backward frontier it is the row whose filled pixels still need to be
/// expanded in the opposite direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: i32,
    pub end: i32,
    pub row: i32,
}

impl Interval {
    pub fn new(start: i32, end: i32, row: i32) -> Self {
        debug_assert!(start <= end, "interval {start}..={end} is inverted");
        Self { start, end, row }
    }

    pub fn width(&self) -> i32 {
        self.end - self.start + 1
    }

    /// Shares at least one column with `other` (rows are not compared).
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Overlapping or directly adjacent, i.e. the union is contiguous.
    pub fn touches(&self, other: &Interval) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }

    /// Covering interval of two touching runs, keeping `self.row`.
    pub fn merged(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            row: self.row,
        }
    }

    pub(crate) fn with_row(self, row: i32) -> Interval {
        Interval { row, ..self }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={} @ {}", self.start, self.end, self.row)
    }
}
