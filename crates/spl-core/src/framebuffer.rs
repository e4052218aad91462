//! Heap-backed full-frame render target.
//!
//! All drawing lands in this RAM buffer instead of going to the SPI panel
//! pixel by pixel. A [`flush`] pushes the complete frame in one
//! `fill_contiguous` transfer; there is no partial or differential update,
//! so the panel always shows exactly the last flushed frame.
//!
//! [`flush`]: FrameBuffer::flush

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Panel width in pixels.
pub const DISPLAY_WIDTH_PX: u16 = 320;

/// Panel height in pixels.
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Total number of pixels in the framebuffer (320 x 240 = 76,800).
const PIXEL_COUNT: usize = DISPLAY_WIDTH_PX as usize * DISPLAY_HEIGHT_PX as usize;

/// Full-frame pixel buffer implementing `DrawTarget<Color = Rgb565>`.
///
/// Heap-allocates a 320x240x2 = 153,600-byte pixel buffer; on the device
/// the allocation lands in PSRAM via the global allocator.
pub struct FrameBuffer {
    pixels: Vec<Rgb565>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Allocate a new framebuffer filled with black pixels.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; PIXEL_COUNT],
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        self.pixels[y * DISPLAY_WIDTH_PX as usize + x] = color;
    }

    /// Push the whole frame to a hardware display in a single
    /// `fill_contiguous` transfer.
    pub fn flush<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = Rectangle::new(
            Point::zero(),
            Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32),
        );
        display.fill_contiguous(&area, self.pixels.iter().copied())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = DISPLAY_WIDTH_PX as usize;
        let h = DISPLAY_HEIGHT_PX as usize;

        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let w = DISPLAY_WIDTH_PX as usize;
        let h = DISPLAY_HEIGHT_PX as usize;

        // Clamp the area to display bounds
        let area_x = area.top_left.x.max(0) as usize;
        let area_y = area.top_left.y.max(0) as usize;
        let area_w = area.size.width as usize;
        let area_h = area.size.height as usize;

        let mut colors = colors.into_iter();
        for row in 0..area_h {
            let y = area_y + row;
            for col in 0..area_w {
                let x = area_x + col;
                if let Some(color) = colors.next()
                    && x < w
                    && y < h
                {
                    self.set_pixel(x, y, color);
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}
