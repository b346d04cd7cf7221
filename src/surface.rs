use image::{ImageBuffer, Pixel};

use crate::geometry::{Point, Rect};

/// A 2D pixel store the fill engine reads from and paints into.
///
/// The engine only ever touches coordinates inside `bounds()`, so
/// implementations are free to panic on anything outside it.
pub trait Surface {
    type Pixel: Copy;

    /// Area holding defined pixels.
    fn bounds(&self) -> Rect;

    fn pixel(&self, x: i32, y: i32) -> Self::Pixel;

    fn set_pixel(&mut self, x: i32, y: i32, pixel: Self::Pixel);

    fn pixel_at(&self, point: Point) -> Self::Pixel {
        self.pixel(point.x, point.y)
    }
}

impl<P> Surface for ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    type Pixel = P;

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    fn pixel(&self, x: i32, y: i32) -> P {
        *self.get_pixel(x as u32, y as u32)
    }

    fn set_pixel(&mut self, x: i32, y: i32, pixel: P) {
        self.put_pixel(x as u32, y as u32, pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn image_buffer_surface() {
        let mut img = RgbaImage::new(4, 3);
        assert_eq!(Surface::bounds(&img), Rect::new(0, 0, 4, 3));
        img.set_pixel(3, 2, Rgba([1, 2, 3, 4]));
        assert_eq!(img.pixel_at(Point::new(3, 2)), Rgba([1, 2, 3, 4]));
        assert_eq!(Surface::pixel(&img, 0, 0), Rgba([0, 0, 0, 0]));
    }
}
