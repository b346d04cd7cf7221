//! Scanline flood fill: interval frontiers, region bookkeeping and the
//! engine driving them.

mod interval;
mod interval_map;
mod options;
mod region;
mod scanline;

pub use interval::Interval;
pub use interval_map::IntervalMap;
pub use options::FillOptions;
pub use region::{FillRegion, Span};
pub use scanline::{FillMode, ScanlineFill};
