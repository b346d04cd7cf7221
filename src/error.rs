use thiserror::Error;

use crate::fill::Interval;
use crate::geometry::{Point, Rect};

/// Errors produced by a fill run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// Seed outside the bounding rect, or the rect is empty.  Only reported
    /// when the engine is strict; otherwise the run yields an empty region.
    #[error("seed ({}, {}) is outside the fill bounds {:?}", seed.x, seed.y, bounds)]
    InvalidRegion { seed: Point, bounds: Rect },

    /// A backward interval placed in the frontier from outside the engine
    /// claims a span the forward pass is about to write.  The run is aborted;
    /// pixels written before detection stay written.
    #[error("backward interval {backward} collides with forward span {forward}")]
    ConsistencyViolation { backward: Interval, forward: Interval },
}

impl FillError {
    /// `true` for errors that abort a run, as opposed to "nothing to fill".
    pub fn is_fatal(&self) -> bool {
        matches!(self, FillError::ConsistencyViolation { .. })
    }
}
