//! Scanline flood fill for raster surfaces.
//!
//! ```
//! use image::{GrayImage, Luma};
//! use scanfill::{Point, Rect, ScanlineFill};
//!
//! let mut img = GrayImage::new(8, 8);
//! let mut fill = ScanlineFill::new(&mut img, Point::new(3, 3), Rect::new(0, 0, 8, 8));
//! fill.set_threshold(10);
//! let region = fill.fill_color(Luma([200])).unwrap();
//! assert_eq!(region.pixel_count(), 64);
//! ```

pub mod difference;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod surface;

pub use difference::{ColorDifference, DifferenceKind};
pub use error::FillError;
pub use fill::{FillMode, FillOptions, FillRegion, Interval, IntervalMap, ScanlineFill, Span};
pub use geometry::{Point, Rect};
pub use surface::Surface;
