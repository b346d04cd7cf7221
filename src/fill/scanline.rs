use log::{debug, trace, warn};

use crate::difference::{ColorDifference, DifferenceKind};
use crate::error::FillError;
use crate::fill::{FillOptions, FillRegion, Interval, IntervalMap};
use crate::geometry::{Point, Rect};
use crate::surface::Surface;

/// What a run does with the pixels it claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode<P> {
    /// Paint every claimed pixel with the color.
    Color(P),
    /// Leave the surface untouched and only report the region.
    Extent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Scanline flood fill over a [`Surface`].
///
/// The fill never recurses per pixel.  It keeps two frontiers of row
/// intervals instead: the *forward* map holds runs waiting to be expanded in
/// the current scan direction, the *backward* map holds runs found by
/// widening a line past its source interval, which still have to be expanded
/// in the opposite direction.  When the forward map runs dry the direction
/// flips and the backward map becomes the new forward map.  The run ends when
/// a flip produces no work.
///
/// Every pixel is compared against the color under the seed point when the
/// run started, so the threshold keeps its meaning while the fill paints.
pub struct ScanlineFill<'a, S: Surface, D = DifferenceKind> {
    surface: &'a mut S,
    seed: Point,
    bounds: Rect,
    threshold: u8,
    strict: bool,
    difference: D,
    row_increment: i32,
    forward: IntervalMap,
    backward: IntervalMap,
    region: FillRegion,
}

impl<'a, S: Surface> ScanlineFill<'a, S> {
    /// `bounds` is clipped to the surface; nothing outside the result is
    /// ever read or written.
    pub fn new(surface: &'a mut S, seed: Point, bounds: Rect) -> Self {
        let bounds = bounds.intersected(&surface.bounds());
        Self {
            surface,
            seed,
            bounds,
            threshold: 0,
            strict: false,
            difference: DifferenceKind::default(),
            row_increment: 1,
            forward: IntervalMap::new(),
            backward: IntervalMap::new(),
            region: FillRegion::new(),
        }
    }

    pub fn with_options(
        surface: &'a mut S,
        seed: Point,
        bounds: Rect,
        options: FillOptions,
    ) -> Self {
        let mut fill = Self::new(surface, seed, bounds);
        fill.threshold = options.threshold;
        fill.strict = options.strict;
        fill.difference = options.difference;
        fill
    }
}

impl<'a, S, D> ScanlineFill<'a, S, D>
where
    S: Surface,
    D: ColorDifference<S::Pixel>,
{
    /// Swap the color metric, keeping every other setting.
    pub fn with_difference<D2>(self, difference: D2) -> ScanlineFill<'a, S, D2>
    where
        D2: ColorDifference<S::Pixel>,
    {
        ScanlineFill {
            surface: self.surface,
            seed: self.seed,
            bounds: self.bounds,
            threshold: self.threshold,
            strict: self.strict,
            difference,
            row_increment: self.row_increment,
            forward: self.forward,
            backward: self.backward,
            region: self.region,
        }
    }

    /// 0 = exact match only.
    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// When strict, a seed outside the bounds is an error instead of an
    /// empty result.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Effective bounds after clipping to the surface.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Fill the region with `color`.
    pub fn fill_color(&mut self, color: S::Pixel) -> Result<FillRegion, FillError> {
        self.run(FillMode::Color(color))
    }

    /// Compute the region without touching the surface.
    pub fn fill_extent(&mut self) -> Result<FillRegion, FillError> {
        self.run(FillMode::Extent)
    }

    /// Fill from the seed.  A run that fails with
    /// [`FillError::ConsistencyViolation`] leaves both frontiers empty, so the
    /// engine can be run again; pixels painted before the failure stay
    /// painted.
    pub fn run(&mut self, mode: FillMode<S::Pixel>) -> Result<FillRegion, FillError> {
        self.region = FillRegion::new();
        self.forward.clear();
        self.row_increment = 1;

        if !self.bounds.contains(self.seed) {
            if self.strict {
                return Err(self.invalid_region());
            }
            debug!(
                "fill seed ({}, {}) outside bounds {:?}, nothing to do",
                self.seed.x, self.seed.y, self.bounds
            );
            return Ok(FillRegion::new());
        }

        let seed_color = self.surface.pixel_at(self.seed);
        let start = Interval::new(self.seed.x, self.seed.x, self.seed.y);
        self.forward.insert_discovered(start);

        let mut first_pass = true;
        let mut lines = 0usize;
        let mut passes = 0usize;

        while !self.forward.is_empty() {
            while let Some(interval) = self.pop_forward() {
                if let Err(err) = self.process_interval(interval, &seed_color, mode) {
                    self.forward.clear();
                    self.backward.clear();
                    return Err(err);
                }
                lines += 1;
            }
            passes += 1;
            self.swap_direction();

            // The seed column itself only gets expanded in the first
            // direction; its other neighbour row is queued here.
            if first_pass {
                first_pass = false;
                let row = start.row + self.row_increment;
                if self.bounds.contains_row(row) {
                    self.forward.insert_discovered(start.with_row(row));
                }
            }
        }

        debug_assert!(self.backward.is_empty(), "backward frontier not drained");

        let region = std::mem::take(&mut self.region);
        debug!(
            "fill from ({}, {}): {} px over {} rows, {} lines in {} passes",
            self.seed.x,
            self.seed.y,
            region.pixel_count(),
            region.row_count(),
            lines,
            passes
        );
        Ok(region)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Pending forward intervals.  Empty after every completed run.
    pub fn forward_intervals(&self) -> &IntervalMap {
        &self.forward
    }

    /// Pending backward intervals.  Empty after every completed run.
    pub fn backward_intervals(&self) -> &IntervalMap {
        &self.backward
    }

    /// Direct access to the backward frontier, for pre-seeding claims before
    /// driving [`process_line`](Self::process_line) by hand.  Claims inserted
    /// here must not be swallowed whole by a forward span; if one is, the
    /// run fails with [`FillError::ConsistencyViolation`].  Unlike
    /// [`run`](Self::run), a failed `process_line` keeps the claim in place.
    pub fn backward_intervals_mut(&mut self) -> &mut IntervalMap {
        &mut self.backward
    }

    /// Run a single line-processing step on `interval` in the current scan
    /// direction, leaving both frontiers populated for inspection.
    pub fn process_line(
        &mut self,
        interval: Interval,
        mode: FillMode<S::Pixel>,
    ) -> Result<(), FillError> {
        if !self.bounds.contains(self.seed) {
            return Err(self.invalid_region());
        }
        let seed_color = self.surface.pixel_at(self.seed);
        self.process_interval(interval, &seed_color, mode)
    }

    // ========================================================================
    // Scan
    // ========================================================================

    fn invalid_region(&self) -> FillError {
        FillError::InvalidRegion {
            seed: self.seed,
            bounds: self.bounds,
        }
    }

    /// Next forward interval, taken from the row furthest along the scan
    /// direction.
    fn pop_forward(&mut self) -> Option<Interval> {
        let row = if self.row_increment > 0 {
            self.forward.last_row()?
        } else {
            self.forward.first_row()?
        };
        self.forward.pop_interval(row)
    }

    fn swap_direction(&mut self) {
        debug_assert!(self.forward.is_empty(), "direction swap with pending forward work");
        self.row_increment = -self.row_increment;

        for interval in self.backward.fetch_all_intervals() {
            let row = interval.row + self.row_increment;
            if self.bounds.contains_row(row) {
                self.forward.insert_discovered(interval.with_row(row));
            }
        }
    }

    fn process_interval(
        &mut self,
        interval: Interval,
        seed_color: &S::Pixel,
        mode: FillMode<S::Pixel>,
    ) -> Result<(), FillError> {
        let interval = match self.backward.crop_interval(interval) {
            Ok(Some(interval)) => interval,
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!("aborting fill: {err}");
                return Err(err);
            }
        };

        let row = interval.row;
        let first_x = interval.start.max(self.bounds.left());
        let last_x = interval.end.min(self.bounds.right());
        if first_x > last_x || !self.bounds.contains_row(row) {
            return Ok(());
        }
        trace!("line {row}: {first_x}..={last_x}");

        let next_row = row + self.row_increment;
        let mut run: Option<Interval> = None;

        for x in first_x..=last_x {
            if self.claims(x, row, seed_color) {
                self.paint(x, row, mode);
                let current = run.get_or_insert(Interval::new(x, x, next_row));
                current.end = x;

                if x == first_x {
                    self.extend(current, Side::Left, seed_color, mode);
                }
                if x == last_x {
                    self.extend(current, Side::Right, seed_color, mode);
                }
            } else if let Some(done) = run.take() {
                self.close_run(done);
            }
        }

        if let Some(done) = run {
            self.close_run(done);
        }
        Ok(())
    }

    /// Widen `run` past the edge of its source interval.  The extra pixels
    /// have no filled neighbour on the source row, so they are also queued
    /// on the backward frontier.
    fn extend(
        &mut self,
        run: &mut Interval,
        side: Side,
        seed_color: &S::Pixel,
        mode: FillMode<S::Pixel>,
    ) {
        let row = run.row - self.row_increment;
        let (mut x, limit, step) = match side {
            Side::Left => (run.start, self.bounds.left(), -1),
            Side::Right => (run.end, self.bounds.right(), 1),
        };

        let mut grown: Option<Interval> = None;
        while x != limit {
            x += step;
            if !self.claims(x, row, seed_color) {
                break;
            }
            self.paint(x, row, mode);
            match side {
                Side::Left => run.start = x,
                Side::Right => run.end = x,
            }
            let g = grown.get_or_insert(Interval::new(x, x, row));
            g.start = g.start.min(x);
            g.end = g.end.max(x);
        }

        if let Some(grown) = grown {
            self.backward.insert_discovered(grown);
        }
    }

    fn close_run(&mut self, run: Interval) {
        let row = run.row - self.row_increment;
        self.region.add_span(row, run.start, run.end);
        if self.bounds.contains_row(run.row) {
            self.forward.insert_discovered(run);
        }
    }

    fn claims(&self, x: i32, y: i32, seed_color: &S::Pixel) -> bool {
        !self.region.contains(x, y)
            && self.difference.difference(&self.surface.pixel(x, y), seed_color) <= self.threshold
    }

    fn paint(&mut self, x: i32, y: i32, mode: FillMode<S::Pixel>) {
        if let FillMode::Color(color) = mode {
            self.surface.set_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Build a gray image from rows of characters: '.' = 0, '#' = 255.
    fn grid(rows: &[&str]) -> GrayImage {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        GrayImage::from_fn(w, h, |x, y| {
            match rows[y as usize].as_bytes()[x as usize] {
                b'#' => Luma([255]),
                _ => Luma([0]),
            }
        })
    }

    fn render(img: &GrayImage) -> Vec<String> {
        (0..img.height())
            .map(|y| {
                (0..img.width())
                    .map(|x| match img.get_pixel(x, y).0[0] {
                        0 => '.',
                        255 => '#',
                        _ => 'o',
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn fills_enclosed_area_only() {
        let mut img = grid(&[
            "......", //
            ".####.", //
            ".#..#.", //
            ".#..#.", //
            ".####.", //
            "......",
        ]);
        let bounds = Surface::bounds(&img);
        let mut fill = ScanlineFill::new(&mut img, Point::new(2, 2), bounds);
        let region = fill.fill_color(Luma([100])).unwrap();
        assert_eq!(region.pixel_count(), 4);
        assert_eq!(region.bounding_rect(), Rect::new(2, 2, 2, 2));
        assert_eq!(
            render(&img),
            vec!["......", ".####.", ".#oo#.", ".#oo#.", ".####.", "......"]
        );
    }

    #[test]
    fn fills_around_obstacles_in_both_directions() {
        // Seed in the middle of a U-shape: the fill has to go down, turn,
        // and come back up on the other side.
        let mut img = grid(&[
            ".#.#.", //
            ".#.#.", //
            ".#.#.", //
            ".....",
        ]);
        let bounds = Surface::bounds(&img);
        let mut fill = ScanlineFill::new(&mut img, Point::new(2, 0), bounds);
        let region = fill.fill_color(Luma([100])).unwrap();
        assert_eq!(region.pixel_count(), 14);
        assert!(fill.forward_intervals().is_empty());
        assert!(fill.backward_intervals().is_empty());
        assert_eq!(render(&img), vec!["o#o#o", "o#o#o", "o#o#o", "ooooo"]);
    }

    #[test]
    fn extent_mode_leaves_surface_untouched() {
        let mut img = grid(&["..#..", "..#..", "....."]);
        let before = img.clone();
        let bounds = Surface::bounds(&img);
        let mut fill = ScanlineFill::new(&mut img, Point::new(0, 0), bounds);
        let region = fill.fill_extent().unwrap();
        assert_eq!(region.pixel_count(), 13);
        assert!(!region.contains(2, 0));
        assert!(region.contains(4, 0));
        assert_eq!(img, before);
    }

    #[test]
    fn fill_color_matching_seed_still_terminates() {
        let mut img = grid(&["....", "....", "...."]);
        let bounds = Surface::bounds(&img);
        let mut fill = ScanlineFill::new(&mut img, Point::new(1, 1), bounds);
        fill.set_threshold(255);
        let region = fill.fill_color(Luma([0])).unwrap();
        assert_eq!(region.pixel_count(), 12);
    }

    #[test]
    fn bounds_clip_the_fill() {
        let mut img = grid(&["......", "......", "......", "......"]);
        let mut fill = ScanlineFill::new(&mut img, Point::new(2, 2), Rect::new(1, 1, 3, 2));
        let region = fill.fill_color(Luma([100])).unwrap();
        assert_eq!(region.bounding_rect(), Rect::new(1, 1, 3, 2));
        assert_eq!(region.pixel_count(), 6);
        assert_eq!(img.get_pixel(0, 1).0[0], 0);
        assert_eq!(img.get_pixel(4, 2).0[0], 0);
        assert_eq!(img.get_pixel(2, 3).0[0], 0);
    }

    #[test]
    fn bounds_are_clipped_to_the_surface() {
        let mut img = grid(&["...", "..."]);
        let fill = ScanlineFill::new(&mut img, Point::new(0, 0), Rect::new(-5, -5, 100, 100));
        assert_eq!(fill.bounds(), Rect::new(0, 0, 3, 2));
    }

    #[test]
    fn seed_outside_bounds_is_a_noop_unless_strict() {
        let mut img = grid(&["...", "..."]);
        let mut fill = ScanlineFill::new(&mut img, Point::new(7, 0), Rect::new(0, 0, 3, 2));
        assert!(fill.fill_color(Luma([9])).unwrap().is_empty());

        fill.set_strict(true);
        let err = fill.fill_color(Luma([9])).unwrap_err();
        assert!(matches!(err, FillError::InvalidRegion { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn empty_bounds_fill_nothing() {
        let mut img = grid(&["...", "..."]);
        let mut fill = ScanlineFill::new(&mut img, Point::new(0, 0), Rect::new(0, 0, 0, 2));
        assert!(fill.fill_extent().unwrap().is_empty());
    }

    #[test]
    fn threshold_widens_the_region() {
        let mut img = GrayImage::from_fn(5, 1, |x, _| Luma([x as u8 * 10]));
        let bounds = Surface::bounds(&img);
        let mut fill = ScanlineFill::new(&mut img, Point::new(0, 0), bounds);
        assert_eq!(fill.fill_extent().unwrap().pixel_count(), 1);
        fill.set_threshold(25);
        assert_eq!(fill.fill_extent().unwrap().pixel_count(), 3);
    }

    #[test]
    fn custom_difference_policy() {
        let mut img = GrayImage::from_fn(4, 1, |x, _| Luma([x as u8]));
        let bounds = Surface::bounds(&img);
        let any_dark = |p: &Luma<u8>, _: &Luma<u8>| -> u8 { if p.0[0] < 3 { 0 } else { 255 } };
        let mut fill =
            ScanlineFill::new(&mut img, Point::new(0, 0), bounds).with_difference(any_dark);
        assert_eq!(fill.fill_extent().unwrap().pixel_count(), 3);
    }
}
